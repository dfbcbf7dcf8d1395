use crate::context::RequestContext;
use crate::dispatcher::Registry;
use crate::registry::register_all;
use crate::runtime_config::RuntimeConfig;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Command-line interface for the dispatch core
#[derive(Parser, Debug)]
#[command(name = "logic-dispatch")]
#[command(about = "Dispatch requests to pooled handlers", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch a single request and print the result envelope
    Call {
        /// Handler name to dispatch to
        #[arg(long)]
        handler: String,

        /// HTTP method recorded on the request
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path (defaults to /<handler>)
        #[arg(short, long)]
        path: Option<String>,

        /// Request body
        #[arg(short, long, default_value = "")]
        body: String,

        /// Request header as name=value (repeatable)
        #[arg(long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },
    /// List registered handler names
    List,
    /// Dispatch many requests concurrently and print pool metrics
    Bench {
        /// Handler name to dispatch to
        #[arg(long)]
        handler: String,

        /// Total number of requests
        #[arg(short = 'n', long, default_value_t = 1000)]
        requests: usize,

        /// Requests in flight at once
        #[arg(short, long, default_value_t = 16)]
        concurrency: usize,
    },
}

/// Parse a `name=value` header argument
pub(crate) fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{s}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Registry with the built-in handlers, prewarmed per `config`
fn builtin_registry(config: &RuntimeConfig) -> Result<Registry> {
    let mut registry = Registry::new();
    register_all(&mut registry);
    if config.pool_prewarm > 0 {
        for name in registry.handler_names() {
            registry
                .prewarm(name, config.pool_prewarm)
                .with_context(|| format!("failed to prewarm {name}"))?;
        }
    }
    Ok(registry)
}

/// Execute a parsed command. Returns whether every dispatch succeeded.
///
/// # Errors
///
/// Fails on an invalid method or when a dispatch coroutine cannot be spawned.
pub fn run_cli(cli: Cli) -> Result<bool> {
    let config = RuntimeConfig::from_env();
    let registry = builtin_registry(&config)?;

    match cli.command {
        Commands::Call {
            handler,
            method,
            path,
            body,
            headers,
        } => {
            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method '{method}'"))?;
            let path = path.unwrap_or_else(|| format!("/{handler}"));
            let mut req = RequestContext::new(method, path).with_body(body);
            for (name, value) in headers {
                req = req.with_header(&name, value);
            }

            let envelope = registry.call(&req, &handler);
            println!("{}", envelope.json());
            Ok(envelope.is_success())
        }
        Commands::List => {
            for name in registry.handler_names() {
                println!("{name}");
            }
            Ok(true)
        }
        Commands::Bench {
            handler,
            requests,
            concurrency,
        } => {
            let registry = Arc::new(registry);
            let concurrency = concurrency.max(1);
            let start = Instant::now();
            let mut failures = 0usize;

            let mut remaining = requests;
            while remaining > 0 {
                let batch = remaining.min(concurrency);
                let mut pending = Vec::with_capacity(batch);
                for _ in 0..batch {
                    let req = RequestContext::new(Method::POST, format!("/{handler}"))
                        .with_body("bench");
                    pending.push(registry.spawn_call(req, &handler, &config)?);
                }
                failures += pending
                    .into_iter()
                    .map(|call| call.join())
                    .filter(|envelope| !envelope.is_success())
                    .count();
                remaining -= batch;
            }

            let elapsed = start.elapsed();
            info!(
                handler_name = %handler,
                requests,
                failures,
                elapsed_ms = elapsed.as_millis() as u64,
                "Bench complete"
            );
            println!(
                "{requests} requests in {:.2?} ({failures} failed)",
                elapsed
            );
            if let Some(snapshot) = registry.pool_metrics(&handler) {
                println!(
                    "constructed={} reused={} returned={} prewarmed={} panics={} idle={}",
                    snapshot.constructed,
                    snapshot.reused,
                    snapshot.returned,
                    snapshot.prewarmed,
                    snapshot.panics,
                    snapshot.idle
                );
            }
            Ok(failures == 0)
        }
    }
}
