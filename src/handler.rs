//! # Handler Contract
//!
//! A handler is a stateful unit of business logic driven through three
//! steps on every dispatch:
//!
//! 1. [`Handler::ready`] - per-request setup (allocate buffers, reset clocks)
//! 2. [`Handler::run`] - process the request and produce an envelope
//! 3. [`Handler::clean`] - release request-scoped state before the instance
//!    goes back to its pool
//!
//! Instances are reused across requests but never shared: between checkout
//! and return exactly one dispatch owns an instance. Whatever `clean` leaves
//! behind is what the next borrower sees.
//!
//! ```rust
//! use logic_dispatch::{DispatchContext, Handler, RequestContext, ResultEnvelope};
//!
//! #[derive(Default)]
//! struct Upper {
//!     buf: String,
//! }
//!
//! impl Handler for Upper {
//!     type Output = String;
//!
//!     fn run(&mut self, _ctx: &DispatchContext, req: &RequestContext) -> ResultEnvelope<String> {
//!         self.buf.push_str(&req.body_text().to_uppercase());
//!         ResultEnvelope::success(self.buf.clone())
//!     }
//!
//!     fn clean(&mut self, _ctx: &DispatchContext) {
//!         self.buf.clear();
//!     }
//! }
//! ```

use crate::context::RequestContext;
use crate::envelope::{Envelope, ResultEnvelope};
use crate::error::DispatchError;
use crate::ids::RequestId;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::Span;

/// Per-dispatch context shared by the three lifecycle steps.
///
/// Carries the dispatch span so handlers can emit events that land inside it.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    request_id: RequestId,
    handler_name: Arc<str>,
    span: Span,
}

impl DispatchContext {
    #[must_use]
    pub fn new(request_id: RequestId, handler_name: &str, span: Span) -> Self {
        Self {
            request_id,
            handler_name: Arc::from(handler_name),
            span,
        }
    }

    #[inline]
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[inline]
    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    /// The dispatch span; closed by the dispatcher once the call returns
    #[inline]
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// Trait implemented by pluggable handlers.
pub trait Handler: Send + 'static {
    /// Payload type placed in the envelope on success
    type Output: Serialize;

    /// Per-request setup, called before `run`
    fn ready(&mut self, _ctx: &DispatchContext) {}

    /// Process one request
    fn run(&mut self, ctx: &DispatchContext, req: &RequestContext)
        -> ResultEnvelope<Self::Output>;

    /// Reset request-scoped state. Runs after every `run`, including one
    /// that panicked, and must leave the instance ready for reuse.
    fn clean(&mut self, _ctx: &DispatchContext) {}
}

/// Object-safe view of a [`Handler`] with its output erased to JSON.
pub(crate) trait ErasedHandler: Send {
    fn erased_ready(&mut self, ctx: &DispatchContext);
    fn erased_run(
        &mut self,
        ctx: &DispatchContext,
        req: &RequestContext,
    ) -> Result<Envelope, DispatchError>;
    fn erased_clean(&mut self, ctx: &DispatchContext);
}

impl<H: Handler> ErasedHandler for H {
    fn erased_ready(&mut self, ctx: &DispatchContext) {
        self.ready(ctx);
    }

    fn erased_run(
        &mut self,
        ctx: &DispatchContext,
        req: &RequestContext,
    ) -> Result<Envelope, DispatchError> {
        self.run(ctx, req)
            .into_value()
            .map_err(|e| DispatchError::OutputSerialization {
                message: e.to_string(),
            })
    }

    fn erased_clean(&mut self, ctx: &DispatchContext) {
        self.clean(ctx);
    }
}

pub(crate) type BoxedHandler = Box<dyn ErasedHandler>;

/// Zero-argument constructor for fresh handler instances.
///
/// One factory is registered per handler name and is only invoked when the
/// name's pool has no idle instance.
#[derive(Clone)]
pub struct HandlerFactory {
    build: Arc<dyn Fn() -> BoxedHandler + Send + Sync>,
}

impl HandlerFactory {
    pub fn new<H, F>(factory: F) -> Self
    where
        H: Handler,
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(move || Box::new(factory()) as BoxedHandler),
        }
    }

    /// Factory for handlers with a `Default` constructor
    #[must_use]
    pub fn of_default<H: Handler + Default>() -> Self {
        Self::new(H::default)
    }

    pub(crate) fn build(&self) -> BoxedHandler {
        (self.build)()
    }
}

impl fmt::Debug for HandlerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFactory").finish_non_exhaustive()
    }
}
