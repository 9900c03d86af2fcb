//! Dispatch layer: runs a batch of method calls against an [`Account`].
//!
//! Method names resolve to the closed [`Method`] enum and every variant is
//! routed by one exhaustive `match`, so adding a method without a handler does
//! not compile. Names a client sends that match no variant are answered with
//! an `unknownMethod` error entry.
//!
//! Calls run strictly in order, one at a time. A failing call produces an
//! `error` entry and never affects the calls around it.

use crate::account::Account;
use crate::changes::{self, ChangesRequest};
use crate::error::{MethodError, RequestError, Result};
use crate::mutation::{self, SetRequest};
use crate::query::{self, ById, FetchStrategy, GetRequest, GroupBy};
use crate::record::Fields;
use crate::storage::{Backend, Storage};
use crate::{Error, RecordId};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Every method the engine serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    CoreEcho,
    EmailGet,
    EmailChanges,
    EmailSet,
    MailboxGet,
    MailboxChanges,
    MailboxSet,
    ThreadGet,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::CoreEcho,
        Method::EmailGet,
        Method::EmailChanges,
        Method::EmailSet,
        Method::MailboxGet,
        Method::MailboxChanges,
        Method::MailboxSet,
        Method::ThreadGet,
    ];

    /// Wire name, `Type/verb`.
    pub fn name(self) -> &'static str {
        match self {
            Method::CoreEcho => "Core/echo",
            Method::EmailGet => "Email/get",
            Method::EmailChanges => "Email/changes",
            Method::EmailSet => "Email/set",
            Method::MailboxGet => "Mailbox/get",
            Method::MailboxChanges => "Mailbox/changes",
            Method::MailboxSet => "Mailbox/set",
            Method::ThreadGet => "Thread/get",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        let unknown = || Error::UnknownMethod(name.to_string());
        let (type_name, verb) = name.split_once('/').ok_or_else(unknown)?;
        let method = match (type_name, verb) {
            ("Core", "echo") => Method::CoreEcho,
            ("Email", "get") => Method::EmailGet,
            ("Email", "changes") => Method::EmailChanges,
            ("Email", "set") => Method::EmailSet,
            ("Mailbox", "get") => Method::MailboxGet,
            ("Mailbox", "changes") => Method::MailboxChanges,
            ("Mailbox", "set") => Method::MailboxSet,
            ("Thread", "get") => Method::ThreadGet,
            _ => return Err(unknown()),
        };
        Ok(method)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One method call or response: `[name, arguments, callId]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation(pub String, pub Map<String, Value>, pub String);

impl Invocation {
    pub fn new(name: impl Into<String>, arguments: Value, call_id: impl Into<String>) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self(name.into(), arguments, call_id.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn arguments(&self) -> &Map<String, Value> {
        &self.1
    }

    pub fn call_id(&self) -> &str {
        &self.2
    }
}

/// A batch of method calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(default)]
    pub using: Vec<String>,
    pub method_calls: Vec<Invocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_ids: Option<BTreeMap<String, RecordId>>,
}

impl Request {
    pub fn new(method_calls: Vec<Invocation>) -> Self {
        Self {
            using: Vec::new(),
            method_calls,
            created_ids: None,
        }
    }
}

/// Responses to a batch, one per call, in call order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub method_responses: Vec<Invocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_ids: Option<BTreeMap<String, RecordId>>,
}

fn parse_args<A: DeserializeOwned>(args: Map<String, Value>) -> Result<A> {
    serde_json::from_value(Value::Object(args))
        .map_err(|err| Error::InvalidArguments(err.to_string()))
}

fn to_object<R: Serialize>(response: &R) -> Result<Map<String, Value>> {
    match serde_json::to_value(response)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Internal(format!("response is not an object: {other}"))),
    }
}

impl<B: Backend> Account<B> {
    /// Parse a raw request body and run it.
    ///
    /// A body that is not JSON, or not a well-formed request, is rejected as
    /// a whole and no method runs.
    pub fn process_json(&self, body: &[u8]) -> std::result::Result<Response, RequestError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|err| RequestError::not_json(err.to_string()))?;
        let request: Request =
            serde_json::from_value(value).map_err(|err| RequestError::not_request(err.to_string()))?;
        Ok(self.process(request))
    }

    /// Run every call of the batch, in order.
    pub fn process(&self, request: Request) -> Response {
        let mut created_ids = request.created_ids;
        let mut method_responses = Vec::with_capacity(request.method_calls.len());

        for Invocation(name, arguments, call_id) in request.method_calls {
            let result = name
                .parse::<Method>()
                .and_then(|method| self.call(method, arguments, &mut created_ids));
            match result {
                Ok(payload) => {
                    tracing::debug!(method = %name, call_id = %call_id, "call succeeded");
                    method_responses.push(Invocation(name, payload, call_id));
                }
                Err(err) => {
                    tracing::warn!(method = %name, call_id = %call_id, error = %err, "call failed");
                    let payload = to_object(&MethodError::from(&err)).unwrap_or_default();
                    method_responses.push(Invocation("error".to_string(), payload, call_id));
                }
            }
        }

        Response {
            method_responses,
            created_ids,
        }
    }

    fn call(
        &self,
        method: Method,
        arguments: Map<String, Value>,
        created_ids: &mut Option<BTreeMap<String, RecordId>>,
    ) -> Result<Map<String, Value>> {
        let backend = self.backend();
        match method {
            Method::CoreEcho => Ok(arguments),
            Method::EmailGet => self.handle_get(backend.emails(), &ById, arguments),
            Method::EmailChanges => self.handle_changes(backend.emails(), arguments),
            Method::EmailSet => self.handle_set(backend.emails(), arguments, created_ids),
            Method::MailboxGet => self.handle_get(backend.mailboxes(), &ById, arguments),
            Method::MailboxChanges => self.handle_changes(backend.mailboxes(), arguments),
            Method::MailboxSet => self.handle_set(backend.mailboxes(), arguments, created_ids),
            Method::ThreadGet => self.handle_get(backend.emails(), &GroupBy::threads(), arguments),
        }
    }

    fn check_account(&self, requested: Option<&str>) -> Result<()> {
        match requested {
            Some(id) if id != self.id() => Err(Error::AccountNotFound(id.to_string())),
            _ => Ok(()),
        }
    }

    fn handle_get<T: Fields, S: Storage<T>>(
        &self,
        store: &S,
        strategy: &dyn FetchStrategy<T>,
        arguments: Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        let request: GetRequest = parse_args(arguments)?;
        self.check_account(request.account_id.as_deref())?;
        let response = query::get(store, self.id(), &request, strategy, self.limits())?;
        to_object(&response)
    }

    fn handle_changes<T: Fields, S: Storage<T>>(
        &self,
        store: &S,
        arguments: Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        let request: ChangesRequest = parse_args(arguments)?;
        self.check_account(request.account_id.as_deref())?;
        let response = changes::changes(store, self.id(), &request, self.limits())?;
        to_object(&response)
    }

    fn handle_set<T: Fields, S: Storage<T>>(
        &self,
        store: &S,
        arguments: Map<String, Value>,
        created_ids: &mut Option<BTreeMap<String, RecordId>>,
    ) -> Result<Map<String, Value>> {
        let request: SetRequest = parse_args(arguments)?;
        self.check_account(request.account_id.as_deref())?;
        let response = mutation::set_records(store, self.id(), request, self.limits())?;
        if let (Some(ids), Some(created)) = (created_ids.as_mut(), &response.created) {
            ids.extend(
                created
                    .iter()
                    .map(|(creation_id, record)| (creation_id.clone(), record.id.clone())),
            );
        }
        to_object(&response)
    }
}
