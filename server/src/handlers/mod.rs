//! Request handlers.

mod api;

pub use api::*;
