//! engine
//!
//! Binds command types to the parser engine and runs invocations through the
//! filter pipeline.
//!
//! # Architecture
//!
//! ```text
//! build:    model::<C>() -> ActionBuilder::apply -> clap::Command + Operation
//! dispatch: ArgMatches -> CommandContext -> [filters by order] -> bind -> execute
//! ```
//!
//! - [`builder`] - Register a command's options with the parser engine
//! - [`parser`] - Translation between option descriptors and clap arguments
//! - [`filter`] - The filter contract and the filter registry
//! - [`pipeline`] - Composition of filters around the final action
//! - [`dispatch`] - Per-invocation orchestration
//! - [`filters`] - Filters shipped with the runtime
//!
//! # Invariants
//!
//! - Binding happens inside the innermost pipeline stage, after every filter's
//!   inbound side has run
//! - A filter that does not call `next` prevents binding and execution
//! - Composition is deterministic: the same registrations always produce the
//!   same stage order

pub mod builder;
pub mod command;
pub mod context;
pub mod dispatch;
pub mod filter;
pub mod filters;
pub mod parser;
pub mod pipeline;

pub use builder::{ActionBuilder, Operation, RegistrationContext};
pub use command::Command;
pub use context::{CommandContext, Invocation};
pub use dispatch::{CommandTarget, Dispatcher};
pub use filter::{CommandFilter, FilterRegistry};
pub use pipeline::{compose, FinalAction, Next};

use thiserror::Error;

use crate::metadata::Problem;

/// Errors raised while invoking a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A parsed value could not be bound onto its property.
    #[error("cannot bind option '--{option}': {message}")]
    Bind { option: String, message: String },

    /// The invocation was cancelled before the handler ran.
    #[error("invocation cancelled")]
    Cancelled,

    /// The context does not hold an instance of the expected command type.
    #[error("context does not hold a {expected} instance")]
    InstanceMismatch { expected: &'static str },

    /// A filter refused to continue the pipeline.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The handler (or a filter) failed.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Invalid command configuration, reported when bindings are built.
///
/// Carries every problem found, not only the first.
#[derive(Debug, Error)]
#[error("invalid configuration for command '{command}': {}", join_problems(.problems))]
pub struct BuildError {
    /// Name of the command being built.
    pub command: String,
    /// Everything that is wrong with it.
    pub problems: Vec<Problem>,
}

impl BuildError {
    /// Create an error for `command`.
    pub fn new(command: impl Into<String>, problems: Vec<Problem>) -> Self {
        Self {
            command: command.into(),
            problems,
        }
    }

    /// Whether any recorded problem matches `predicate`.
    pub fn has(&self, predicate: impl Fn(&Problem) -> bool) -> bool {
        self.problems.iter().any(predicate)
    }
}

fn join_problems(problems: &[Problem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_error_lists_every_problem() {
        let err = BuildError::new(
            "greet",
            vec![
                Problem::OperationAlreadySet,
                Problem::DuplicateCommandName {
                    name: "add".into(),
                },
            ],
        );
        let text = err.to_string();
        assert!(text.starts_with("invalid configuration for command 'greet'"));
        assert!(text.contains("already installed"));
        assert!(text.contains("'add'"));
        assert!(err.has(|p| matches!(p, Problem::OperationAlreadySet)));
    }

    #[test]
    fn failed_wraps_anyhow_transparently() {
        let err: CommandError = anyhow::anyhow!("disk full").into();
        assert_eq!(err.to_string(), "disk full");
    }
}
