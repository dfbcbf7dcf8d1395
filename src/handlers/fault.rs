use crate::context::RequestContext;
use crate::envelope::ResultEnvelope;
use crate::handler::{DispatchContext, Handler};
use serde_json::Value;

/// Envelope code used by [`RejectHandler`] (HTTP 409)
pub const CONFLICT: i32 = 409;

/// Panics on every request. Exercises the dispatcher's panic boundary.
#[derive(Debug, Default)]
pub struct PanicHandler;

impl Handler for PanicHandler {
    type Output = Value;

    #[allow(clippy::panic)]
    fn run(&mut self, _ctx: &DispatchContext, req: &RequestContext) -> ResultEnvelope<Value> {
        panic!("handler failed on {} {}", req.method, req.path);
    }
}

/// Reports a business error through its envelope.
#[derive(Debug, Default)]
pub struct RejectHandler;

impl Handler for RejectHandler {
    type Output = Value;

    fn run(&mut self, _ctx: &DispatchContext, req: &RequestContext) -> ResultEnvelope<Value> {
        ResultEnvelope::failure(CONFLICT, format!("request to {} rejected", req.path))
    }
}
