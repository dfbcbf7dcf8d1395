// Built-in handler registrations

use crate::dispatcher::Registry;
use crate::handlers::{EchoHandler, PanicHandler, RejectHandler};

/// Register every built-in handler under its public name.
pub fn register_all(registry: &mut Registry) {
    registry.add("echo", EchoHandler::default);
    registry.add("fail", || PanicHandler);
    registry.add("reject", || RejectHandler);
}
