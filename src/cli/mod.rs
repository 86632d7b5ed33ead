//! cli
//!
//! Command-line hosting layer.
//!
//! # Responsibilities
//!
//! - Collect command registrations into a tree
//! - Parse arguments via clap and walk to the selected command
//! - Delegate invocation to the [`crate::engine`] dispatcher
//! - Map outcomes to exit codes
//!
//! # Architecture
//!
//! The CLI layer is thin. It owns the clap command tree and the mapping from
//! command paths to dispatch targets. Binding, filters and execution all live
//! in the engine.
//!
//! # Example
//!
//! ```no_run
//! use cmdhost::cli::Host;
//! use cmdhost::engine::{Command, Invocation};
//! use cmdhost::metadata::{Declaration, Options};
//!
//! #[derive(Default)]
//! struct Hello {
//!     name: String,
//! }
//!
//! impl Options for Hello {
//!     fn declare(decl: &mut Declaration<Self>) {
//!         decl.option("name", |h: &mut Hello, v: String| h.name = v).default("world");
//!     }
//! }
//!
//! #[async_trait::async_trait]
//! impl Command for Hello {
//!     const NAME: &'static str = "hello";
//!
//!     async fn execute(&mut self, _: &Invocation) -> anyhow::Result<()> {
//!         println!("Hello, {}!", self.name);
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() {
//! let host = Host::builder("app").add_command::<Hello>().build().unwrap();
//! let code = host.run(std::env::args_os()).await;
//! std::process::exit(code);
//! # }
//! ```

pub mod host;
mod tree;

pub use host::{Host, HostBuilder, HostError, EXIT_CANCELLED, EXIT_FAILURE};
