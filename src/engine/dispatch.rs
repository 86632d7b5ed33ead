//! engine::dispatch
//!
//! Per-invocation orchestration.
//!
//! # Architecture
//!
//! ```text
//! dispatch(target, matches)
//!   -> instantiate command
//!   -> CommandContext (fresh invocation id)
//!   -> compose(global ++ command filters, Terminal)
//!   -> run pipeline
//!        Terminal: bind(matches) -> ensure_active -> execute
//! ```
//!
//! A [`Dispatcher`] is immutable after construction and shared by every
//! invocation; concurrent dispatches never share a context.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use clap::ArgMatches;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};

use super::builder::Operation;
use super::context::CommandContext;
use super::filter::FilterRegistry;
use super::pipeline::{compose, FinalAction};
use super::CommandError;
use crate::core::types::CommandTypeId;
use crate::metadata::FilterDescriptor;

/// Everything needed to invoke one registered command.
#[derive(Clone)]
pub struct CommandTarget {
    path: String,
    operation: Arc<dyn Operation>,
    filters: Arc<[FilterDescriptor]>,
}

impl CommandTarget {
    /// Target for `operation`, reachable at `path` (`remote add`).
    pub fn new(
        path: impl Into<String>,
        operation: Arc<dyn Operation>,
        filters: impl Into<Arc<[FilterDescriptor]>>,
    ) -> Self {
        Self {
            path: path.into(),
            operation,
            filters: filters.into(),
        }
    }

    /// Space-separated command path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Command type invoked by this target.
    pub fn command_type(&self) -> CommandTypeId {
        self.operation.command_type()
    }

    /// Filters declared by the command type.
    pub fn filters(&self) -> &[FilterDescriptor] {
        &self.filters
    }
}

impl std::fmt::Debug for CommandTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTarget")
            .field("path", &self.path)
            .field("command_type", &self.command_type())
            .field("filters", &self.filters)
            .finish()
    }
}

/// Final pipeline stage: bind the parsed values, then execute.
struct Terminal {
    operation: Arc<dyn Operation>,
    matches: ArgMatches,
}

#[async_trait]
impl FinalAction for Terminal {
    async fn run(&self, ctx: &mut CommandContext) -> Result<(), CommandError> {
        self.operation.invoke(&self.matches, ctx).await
    }
}

/// Runs invocations through the filter pipeline.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<FilterRegistry>,
    global: Arc<[FilterDescriptor]>,
}

impl Dispatcher {
    /// Dispatcher over `registry` with host-wide `global` filters.
    pub fn new(registry: FilterRegistry, global: Vec<FilterDescriptor>) -> Self {
        Self {
            registry: Arc::new(registry),
            global: global.into(),
        }
    }

    /// The filter registry.
    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    /// Host-wide filters, in registration order.
    pub fn global_filters(&self) -> &[FilterDescriptor] {
        &self.global
    }

    /// Invoke `target` on a fresh instance.
    pub async fn dispatch(
        &self,
        target: &CommandTarget,
        matches: ArgMatches,
        cancellation: CancellationToken,
    ) -> Result<CommandContext, CommandError> {
        let instance = target.operation.instantiate();
        self.dispatch_instance(target, instance, matches, cancellation)
            .await
    }

    /// Invoke `target` on a caller-supplied instance.
    ///
    /// Fails with [`CommandError::InstanceMismatch`] at bind time if the
    /// instance is not of the target's command type.
    pub async fn dispatch_instance(
        &self,
        target: &CommandTarget,
        instance: Box<dyn Any + Send>,
        matches: ArgMatches,
        cancellation: CancellationToken,
    ) -> Result<CommandContext, CommandError> {
        let mut ctx = CommandContext::new(
            target.command_type(),
            target.path.clone(),
            instance,
            cancellation,
        );

        let terminal = Box::new(Terminal {
            operation: Arc::clone(&target.operation),
            matches,
        });
        let pipeline = compose(&self.registry, &self.global, &target.filters, terminal);

        let span = info_span!(
            "invoke",
            command = %target.path,
            invocation = %ctx.invocation().id()
        );
        debug!(parent: &span, filters = pipeline.depth(), "pipeline composed");

        pipeline.run(&mut ctx).instrument(span).await?;
        Ok(ctx)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("global", &self.global)
            .finish()
    }
}
