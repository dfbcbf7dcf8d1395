//! # Runtime Configuration Module
//!
//! Environment-variable configuration for the dispatch runtime.
//!
//! ## Environment Variables
//!
//! ### `LOGIC_STACK_SIZE`
//!
//! Stack size for coroutines started by
//! [`Registry::spawn_call`](crate::Registry::spawn_call). Accepts decimal
//! (`65536`) or hexadecimal (`0x10000`). Default: `0x10000` (64 KB).
//!
//! Handlers run on this stack, so deep call chains or large locals in a
//! handler need a larger value. Total virtual memory is roughly
//! `stack_size × concurrent dispatches`.
//!
//! ### `LOGIC_POOL_PREWARM`
//!
//! Number of instances to construct per registered handler before traffic
//! arrives. Default: `0` (instances are built lazily on first use).
//!
//! ## Usage
//!
//! ```rust
//! use logic_dispatch::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```

use std::env;

/// Default coroutine stack size (64 KB)
pub const DEFAULT_STACK_SIZE: usize = 0x10000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for dispatch coroutines in bytes
    pub stack_size: usize,
    /// Instances to prewarm per handler name
    pub pool_prewarm: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            pool_prewarm: 0,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = env::var("LOGIC_STACK_SIZE")
            .ok()
            .and_then(|val| parse_size(&val))
            .unwrap_or(DEFAULT_STACK_SIZE);
        let pool_prewarm = env::var("LOGIC_POOL_PREWARM")
            .ok()
            .and_then(|val| val.trim().parse().ok())
            .unwrap_or(0);
        RuntimeConfig {
            stack_size,
            pool_prewarm,
        }
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal size
fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0x4000"), Some(0x4000));
        assert_eq!(parse_size("32768"), Some(32768));
        assert_eq!(parse_size(" 0x10 "), Some(16));
        assert_eq!(parse_size("0xzz"), None);
        assert_eq!(parse_size("lots"), None);
    }

    #[test]
    fn test_default() {
        let config = RuntimeConfig::default();
        assert_eq!(config.stack_size, 0x10000);
        assert_eq!(config.pool_prewarm, 0);
    }
}
