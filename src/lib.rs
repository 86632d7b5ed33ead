//! cmdhost - A declarative command hosting runtime
//!
//! Application authors describe commands as plain data types: options are
//! declared against properties, cross-cutting behavior is attached as filters,
//! and the runtime binds parsed values and runs the handler inside the
//! composed filter pipeline.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command host: tree registration, parsing, exit codes
//! - [`engine`] - Option binding, filter pipeline, dispatch
//! - [`metadata`] - Option and filter declarations, extraction and caching
//! - [`core`] - Identities, value types, naming rules, configuration
//! - [`logging`] - Structured logging setup; below `core`, whose config
//!   schema embeds [`logging::LoggingConfig`]
//!
//! # Correctness Invariants
//!
//! 1. Option registration order is deterministic: explicit order, then
//!    hierarchy (base groups first), then declaration order
//! 2. Configuration errors are reported when bindings are built, never at
//!    invocation time
//! 3. Filters wrap binding and execution; a filter that does not continue
//!    prevents both
//! 4. A cancelled invocation never reaches its handler

pub mod cli;
pub mod core;
pub mod engine;
pub mod logging;
pub mod metadata;
