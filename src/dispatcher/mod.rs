//! # Dispatcher Module
//!
//! Maps logical handler names to handler factories and per-name instance
//! pools, and drives every request through the handler lifecycle.
//!
//! ## Request Flow
//!
//! 1. Open a `dispatch` span keyed by the request path
//! 2. Take an idle instance from the name's pool, or build one with the
//!    registered factory (unknown names stop here with a 406)
//! 3. `ready` → `run` → `clean`
//! 4. Return the cleaned instance to the pool
//! 5. Log the final envelope and close the span
//!
//! ```text
//! Idle → Lookup → {Found | Constructed | Unregistered}
//!      → Ready → Run → Clean/PoolReturn → Finalize → Success | Failed(code)
//! ```
//!
//! `Unregistered` jumps straight to `Finalize`.
//!
//! ## Error Handling
//!
//! Nothing escapes [`Registry::call`]:
//! - Unregistered names return a 406 envelope without touching any pool
//! - Handler panics are caught and return a 500 envelope carrying the panic
//!   message; `clean` still runs and the instance is still pooled
//! - Errors the handler writes into its own envelope pass through verbatim
//!   and win over a panic that happens afterwards
//!
//! ## Concurrency
//!
//! `call` takes `&self` and holds no locks, so an `Arc<Registry>` can be
//! shared by any number of threads or coroutines. Registration needs
//! `&mut self` and therefore happens before the registry is shared.
//! [`Registry::spawn_call`] runs one dispatch on its own `may` coroutine.
//!
//! ```rust
//! use http::Method;
//! use logic_dispatch::{DispatchContext, Handler, Registry, RequestContext, ResultEnvelope};
//!
//! struct Echo;
//!
//! impl Handler for Echo {
//!     type Output = String;
//!
//!     fn run(&mut self, _ctx: &DispatchContext, req: &RequestContext) -> ResultEnvelope<String> {
//!         ResultEnvelope::success(req.body_text().into_owned())
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.add("echo", || Echo);
//!
//! let req = RequestContext::new(Method::POST, "/echo").with_body("hi");
//! assert_eq!(
//!     registry.call(&req, "echo").json(),
//!     r#"{"code":0,"data":"hi","text":"success"}"#
//! );
//! ```

mod core;
mod coroutine;

pub use core::{Registry, REQUEST_ID_HEADER};
pub use coroutine::CallHandle;
