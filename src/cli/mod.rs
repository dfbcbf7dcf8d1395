//! # CLI Module
//!
//! Command-line front end for exercising a registry of the built-in
//! handlers without an HTTP server in front of it.
//!
//! ## Commands
//!
//! ### `call`
//!
//! Dispatch one request and print the envelope:
//!
//! ```bash
//! logic-dispatch call --handler echo --method POST --path /echo --body hi
//! # {"code":0,"data":"hi","text":"success"}
//! ```
//!
//! ### `list`
//!
//! Print the registered handler names.
//!
//! ### `bench`
//!
//! Fire many dispatches over coroutines and print the pool counters:
//!
//! ```bash
//! logic-dispatch bench --handler echo --requests 10000 --concurrency 64
//! ```

mod commands;


pub use commands::{run_cli, Cli, Commands};
