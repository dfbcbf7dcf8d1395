use crate::context::RequestContext;
use crate::envelope::ResultEnvelope;
use crate::handler::{DispatchContext, Handler};
use tracing::debug;

/// Copies the request body into the envelope payload.
///
/// Keeps its copy buffer across requests; `clean` empties it so nothing
/// from one request is visible to the next.
#[derive(Debug, Default)]
pub struct EchoHandler {
    buf: Vec<u8>,
}

impl Handler for EchoHandler {
    type Output = String;

    fn ready(&mut self, _ctx: &DispatchContext) {
        self.buf.clear();
    }

    fn run(&mut self, ctx: &DispatchContext, req: &RequestContext) -> ResultEnvelope<String> {
        self.buf.extend_from_slice(&req.body);
        debug!(
            request_id = %ctx.request_id(),
            bytes = self.buf.len(),
            "Echoing request body"
        );
        ResultEnvelope::success(String::from_utf8_lossy(&self.buf).into_owned())
    }

    fn clean(&mut self, _ctx: &DispatchContext) {
        self.buf.clear();
    }
}
