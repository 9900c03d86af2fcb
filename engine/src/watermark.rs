//! Per-type modseq watermarks and the state tokens derived from them.

use crate::{Error, ModSeq};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bounds of the change history kept for one record type.
///
/// `highest_mod_seq` is the last modseq assigned to the type. Change
/// calculation is possible from any state in `lowest_mod_seq..=highest_mod_seq`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watermark {
    pub type_name: String,
    pub highest_mod_seq: ModSeq,
    pub lowest_mod_seq: ModSeq,
}

impl Watermark {
    /// Watermark of a freshly provisioned type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            highest_mod_seq: 0,
            lowest_mod_seq: 0,
        }
    }

    /// The state token clients see for this type right now.
    pub fn state(&self) -> State {
        State(self.highest_mod_seq)
    }
}

/// Opaque state token: the decimal form of a modseq.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct State(pub ModSeq);

impl FromStr for State {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidArguments(format!("malformed state: {s:?}")));
        }
        s.parse()
            .map(State)
            .map_err(|_| Error::InvalidArguments(format!("malformed state: {s:?}")))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<State> for String {
    fn from(state: State) -> Self {
        state.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_state() {
        assert_eq!("0".parse::<State>().unwrap(), State(0));
        assert_eq!("42".parse::<State>().unwrap(), State(42));
        assert_eq!(State(42).to_string(), "42");
    }

    #[test]
    fn reject_malformed_state() {
        for input in ["", "-1", "+1", "abc", "1.5", " 1", "99999999999999999999999"] {
            let err = input.parse::<State>().unwrap_err();
            assert!(
                matches!(err, Error::InvalidArguments(_)),
                "accepted {input:?}"
            );
        }
    }

    #[test]
    fn fresh_watermark() {
        let watermark = Watermark::new("Email");
        assert_eq!(watermark.state(), State(0));
        assert_eq!(watermark.lowest_mod_seq, 0);
    }
}
