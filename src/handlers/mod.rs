//! Built-in handlers.
//!
//! - `echo` ([`EchoHandler`]) returns the request body as its payload
//! - `fail` ([`PanicHandler`]) panics on every request
//! - `reject` ([`RejectHandler`]) answers every request with a 409

mod echo;
mod fault;

pub use echo::EchoHandler;
pub use fault::{PanicHandler, RejectHandler, CONFLICT};
