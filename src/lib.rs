//! # logic-dispatch
//!
//! **logic-dispatch** is the request-dispatch core of a web-serving process: given a request
//! and a logical handler name, it finds or builds a stateful handler instance, runs it, contains
//! any failure, and hands back a uniform JSON result envelope.
//!
//! ## Overview
//!
//! The HTTP layer owns the socket and routing; this crate owns everything between "route
//! matched to a name" and "response body ready":
//!
//! - **[`dispatcher`]** - the [`Registry`]: handler factories, per-name instance pools, the
//!   ready → run → clean lifecycle and the panic boundary
//! - **[`handler`]** - the [`Handler`] contract and [`HandlerFactory`]
//! - **[`envelope`]** - the [`ResultEnvelope`] every dispatch returns
//! - **[`pool`]** - the non-blocking instance pool and its counters
//! - **[`context`]** - the inbound [`RequestContext`]
//! - **[`logging`]** - `tracing-subscriber` setup for the embedding process
//! - **[`runtime_config`]** - environment configuration
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Http as HTTP layer
//!     participant Registry
//!     participant Pool as HandlerPool
//!     participant Factory as HandlerFactory
//!     participant Handler
//!
//!     Http->>Registry: call(&request, "echo")
//!     Registry->>Registry: open dispatch span
//!
//!     alt Name not registered
//!         Registry-->>Http: {"code":406,"data":{},"text":"unregistered handler: echo"}
//!     end
//!
//!     Registry->>Pool: take()
//!     alt Pool empty
//!         Registry->>Factory: build()
//!         Factory-->>Registry: fresh instance
//!     end
//!
//!     Registry->>Handler: ready(ctx)
//!     Registry->>Handler: run(ctx, request)
//!     alt Handler panics
//!         Handler-->>Registry: panic caught
//!         Note over Registry: code 500 unless the<br/>handler already set an error
//!     end
//!     Registry->>Handler: clean(ctx)
//!     Registry->>Pool: put(instance)
//!
//!     Registry->>Registry: log envelope, close span
//!     Registry-->>Http: {"code":0,"data":"hi","text":"success"}
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use logic_dispatch::{handlers::EchoHandler, Registry, RequestContext};
//!
//! let mut registry = Registry::new();
//! registry.add("echo", EchoHandler::default);
//!
//! let req = RequestContext::new(Method::POST, "/echo").with_body("hi");
//! let envelope = registry.call(&req, "echo");
//! assert!(envelope.is_success());
//! assert_eq!(envelope.json(), r#"{"code":0,"data":"hi","text":"success"}"#);
//!
//! let missing = registry.call(&req, "missing");
//! assert_eq!(missing.code(), 406);
//! ```
//!
//! ## Runtime Considerations
//!
//! [`Registry::call`] is synchronous and runs on the caller's thread or coroutine. For a
//! task-per-request model, [`Registry::spawn_call`] runs one dispatch on a `may` coroutine
//! whose stack size comes from `LOGIC_STACK_SIZE`. Handlers run on that stack.
//!
//! Panic recovery relies on unwinding: building with `panic = "abort"` turns every handler
//! panic into a process abort.

pub mod cli;
pub mod context;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod ids;
pub mod logging;
pub mod pool;
pub mod registry;
pub mod runtime_config;

pub use context::{HeaderVec, RequestContext};
pub use dispatcher::{CallHandle, Registry};
pub use envelope::{Envelope, ResultEnvelope};
pub use error::DispatchError;
pub use handler::{DispatchContext, Handler, HandlerFactory};
pub use pool::{HandlerPool, PoolSnapshot};
