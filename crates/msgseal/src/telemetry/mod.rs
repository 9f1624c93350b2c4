//! Structured logging setup.
//!
//! # Logging invariants
//!
//! - **No key material or token contents** appear in any log field. Secrets
//!   print as `Secret([REDACTED])` through `Debug`.
//! - Verification failures are logged at `debug` with the failing stage only.
//! - Log level comes from `RUST_LOG` when set, otherwise from the configured
//!   `MSGSEAL_LOG_LEVEL` (default: `info`).

pub mod init;

pub use init::init_tracing;
