//! Dispatcher core module - registry and the per-request lifecycle.

use crate::context::RequestContext;
use crate::envelope::Envelope;
use crate::error::DispatchError;
use crate::handler::{BoxedHandler, DispatchContext, ErasedHandler, Handler, HandlerFactory};
use crate::ids::RequestId;
use crate::pool::{HandlerPool, PoolSnapshot};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, field, info, info_span, warn};

/// Header read for an inbound correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Factory and instance pool registered under one handler name
struct Entry {
    factory: HandlerFactory,
    pool: HandlerPool<BoxedHandler>,
}

/// Registry of handler factories and their instance pools.
///
/// Built once at startup with [`Registry::add`], then shared (typically as
/// `Arc<Registry>`) by every request-serving task. Dispatch takes `&self`
/// and never locks; pools are the only shared mutable state.
#[derive(Default)]
pub struct Registry {
    entries: HashMap<String, Entry>,
}

/// What a dispatch produced before finalization
#[derive(Default)]
struct Outcome {
    envelope: Option<Envelope>,
    error: Option<DispatchError>,
    panic: Option<String>,
}

impl Outcome {
    /// Keep the first panic; later ones are logged only
    fn record_panic(&mut self, ctx: &DispatchContext, payload: &(dyn Any + Send)) {
        let message = panic_message(payload);
        error!(
            request_id = %ctx.request_id(),
            handler_name = %ctx.handler_name(),
            panic_message = %message,
            "Handler panicked - CRITICAL"
        );
        if self.panic.is_none() {
            self.panic = Some(message);
        }
    }

    /// Apply error precedence: dispatch error > panic > success.
    ///
    /// A handler envelope that already carries an error counts as an
    /// explicit error and survives a later panic.
    fn finalize(self) -> Envelope {
        let mut envelope = self.envelope.unwrap_or_default();
        if let Some(err) = self.error {
            envelope.set_error(err.code(), err);
        } else if let Some(message) = self.panic {
            if envelope.is_success() {
                let err = DispatchError::InternalExecution { message };
                envelope.set_error(err.code(), err);
            }
        }
        envelope
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a handler factory under `name`.
    ///
    /// **IMPORTANT**: a prior registration under the same name is replaced,
    /// along with its pool. Idle instances of the old handler are dropped.
    pub fn add<H, F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        H: Handler,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.add_factory(name, HandlerFactory::new(factory))
    }

    /// Register an already-erased factory under `name`
    pub fn add_factory(&mut self, name: &str, factory: HandlerFactory) -> &mut Self {
        let entry = Entry {
            factory,
            pool: HandlerPool::new(),
        };
        if let Some(old) = self.entries.insert(name.to_string(), entry) {
            warn!(
                handler_name = %name,
                dropped_idle = old.pool.idle(),
                "Replaced existing handler registration"
            );
        } else {
            info!(
                handler_name = %name,
                total_handlers = self.entries.len(),
                "Handler registered successfully"
            );
        }
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered handler names, sorted
    #[must_use]
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counters for one handler's pool
    #[must_use]
    pub fn pool_metrics(&self, name: &str) -> Option<PoolSnapshot> {
        self.entries.get(name).map(|entry| entry.pool.snapshot())
    }

    /// Counters for every registered handler
    #[must_use]
    pub fn metrics(&self) -> HashMap<String, PoolSnapshot> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.pool.snapshot()))
            .collect()
    }

    /// Construct `count` instances of `name` and park them idle.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnregisteredHandler`] for an unknown name.
    pub fn prewarm(&self, name: &str, count: usize) -> Result<usize, DispatchError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| DispatchError::UnregisteredHandler {
                name: name.to_string(),
            })?;
        for _ in 0..count {
            let handler = entry.factory.build();
            entry.pool.metrics().record_construct();
            entry.pool.prefill(handler);
        }
        debug!(handler_name = %name, count, idle = entry.pool.idle(), "Pool prewarmed");
        Ok(count)
    }

    /// Dispatch one request to the handler registered under `name`.
    ///
    /// Never panics and never returns a raw failure: unknown names yield a
    /// 406 envelope, panics inside the handler yield a 500 envelope, and
    /// handler-reported errors pass through unchanged.
    pub fn call(&self, req: &RequestContext, name: &str) -> Envelope {
        let request_id = RequestId::from_header_or_new(req.get_header(REQUEST_ID_HEADER));
        let span = info_span!(
            "dispatch",
            path = %req.path,
            method = %req.method,
            handler = %name,
            request_id = %request_id,
            code = field::Empty,
        );
        let _entered = span.enter();
        let ctx = DispatchContext::new(request_id, name, span.clone());

        info!(handler_name = %name, "Dispatch start");
        let start = Instant::now();

        let mut outcome = Outcome::default();
        if let Err(payload) =
            panic::catch_unwind(AssertUnwindSafe(|| self.execute(&ctx, req, name, &mut outcome)))
        {
            if let Some(entry) = self.entries.get(name) {
                entry.pool.metrics().record_panic();
            }
            outcome.record_panic(&ctx, payload.as_ref());
        }

        let envelope = outcome.finalize();
        span.record("code", envelope.code());
        info!(
            handler_name = %name,
            latency_ms = start.elapsed().as_millis() as u64,
            result = %envelope.json(),
            "Dispatch end"
        );
        envelope
    }

    /// Lookup, checkout and the ready/run/clean lifecycle.
    fn execute(
        &self,
        ctx: &DispatchContext,
        req: &RequestContext,
        name: &str,
        outcome: &mut Outcome,
    ) {
        let Some(entry) = self.entries.get(name) else {
            let available: Vec<&str> = self.handler_names();
            error!(
                handler_name = %name,
                available_handlers = ?available,
                "Handler not found"
            );
            outcome.error = Some(DispatchError::UnregisteredHandler {
                name: name.to_string(),
            });
            return;
        };
        entry.pool.metrics().record_dispatch();

        let mut handler = match entry.pool.take() {
            Some(handler) => handler,
            None => {
                let handler = entry.factory.build();
                entry.pool.metrics().record_construct();
                debug!(handler_name = %name, "Constructed handler instance");
                handler
            }
        };

        let ran = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.erased_ready(ctx);
            handler.erased_run(ctx, req)
        }));
        match ran {
            Ok(Ok(envelope)) => outcome.envelope = Some(envelope),
            Ok(Err(err)) => outcome.error = Some(err),
            Err(payload) => {
                entry.pool.metrics().record_panic();
                outcome.record_panic(ctx, payload.as_ref());
            }
        }

        // Clean runs even when run panicked. The instance goes back either way.
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler.erased_clean(ctx))) {
            entry.pool.metrics().record_panic();
            outcome.record_panic(ctx, payload.as_ref());
        }
        entry.pool.put(handler);
    }
}

/// Render a panic payload the way `panic!` formatted it
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked with a non-string payload".to_string()
    }
}
