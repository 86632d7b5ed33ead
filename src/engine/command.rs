//! engine::command
//!
//! Command trait for dispatch integration.
//!
//! # Architecture
//!
//! Every command is a plain data type. It declares its options and filters
//! through [`Options`], its name and description through associated
//! constants, and its behavior through [`Command::execute`]. The engine:
//!
//! 1. Creates a fresh instance with `Default`
//! 2. Runs the filter pipeline around the final action
//! 3. In the final action, binds parsed option values onto the instance
//! 4. Awaits `execute`
//!
//! # Invariants
//!
//! - Commands never see raw argument text; they receive bound properties
//! - `execute` runs at most once per instance
//! - A cancelled invocation never reaches `execute`
//!
//! # Example
//!
//! ```
//! use cmdhost::engine::{Command, Invocation};
//! use cmdhost::metadata::{Declaration, Options};
//!
//! #[derive(Default)]
//! struct Greet {
//!     name: String,
//!     shout: bool,
//! }
//!
//! impl Options for Greet {
//!     fn declare(decl: &mut Declaration<Self>) {
//!         decl.option("name", |g: &mut Greet, v: String| g.name = v)
//!             .default("world")
//!             .order(1);
//!         decl.option("shout", |g: &mut Greet, v: bool| g.shout = v)
//!             .required()
//!             .order(0);
//!     }
//! }
//!
//! #[async_trait::async_trait]
//! impl Command for Greet {
//!     const NAME: &'static str = "greet";
//!     const DESCRIPTION: Option<&'static str> = Some("Say hello");
//!
//!     async fn execute(&mut self, _invocation: &Invocation) -> anyhow::Result<()> {
//!         let greeting = format!("Hello, {}!", self.name);
//!         if self.shout {
//!             println!("{}", greeting.to_uppercase());
//!         } else {
//!             println!("{}", greeting);
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

use super::context::Invocation;
use crate::metadata::Options;

/// A command that can be dispatched by the engine.
#[async_trait]
pub trait Command: Options + Default {
    /// Display name used on the command line.
    const NAME: &'static str;

    /// Help text.
    const DESCRIPTION: Option<&'static str> = None;

    /// Run the command against its bound properties.
    ///
    /// Errors propagate through the filter pipeline unchanged; filters may
    /// observe or translate them.
    async fn execute(&mut self, invocation: &Invocation) -> anyhow::Result<()>;
}
