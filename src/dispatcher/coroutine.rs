use super::core::{panic_message, Registry};
use crate::context::RequestContext;
use crate::envelope::Envelope;
use crate::error::DispatchError;
use crate::runtime_config::RuntimeConfig;
use may::coroutine;
use std::io;
use std::sync::Arc;
use tracing::error;

/// Pending dispatch running on its own coroutine
pub struct CallHandle {
    handler_name: String,
    handle: coroutine::JoinHandle<Envelope>,
}

impl CallHandle {
    /// Wait for the dispatch to finish.
    ///
    /// Always yields an envelope; a coroutine that died without producing
    /// one maps to a 500.
    #[must_use]
    pub fn join(self) -> Envelope {
        match self.handle.join() {
            Ok(envelope) => envelope,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    handler_name = %self.handler_name,
                    panic_message = %message,
                    "Dispatch coroutine died"
                );
                DispatchError::InternalExecution { message }.into()
            }
        }
    }
}

impl Registry {
    /// Run [`Registry::call`] on a fresh coroutine (task-per-request).
    ///
    /// # Errors
    ///
    /// Returns the spawn error when the runtime cannot allocate the coroutine.
    pub fn spawn_call(
        self: &Arc<Self>,
        req: RequestContext,
        name: &str,
        config: &RuntimeConfig,
    ) -> io::Result<CallHandle> {
        let registry = Arc::clone(self);
        let handler_name = name.to_string();
        let task_name = handler_name.clone();

        // SAFETY: may::coroutine::Builder::spawn() is marked unsafe by the may runtime.
        // The closure owns everything it touches (Arc<Registry>, the request and the
        // name), so no reference can outlive the coroutine.
        #[allow(unsafe_code)]
        let handle = unsafe {
            coroutine::Builder::new()
                .stack_size(config.stack_size)
                .spawn(move || registry.call(&req, &task_name))
        };

        match handle {
            Ok(handle) => Ok(CallHandle {
                handler_name,
                handle,
            }),
            Err(e) => {
                error!(
                    handler_name = %handler_name,
                    error = %e,
                    stack_size = config.stack_size,
                    "Failed to spawn dispatch coroutine"
                );
                Err(e)
            }
        }
    }
}
