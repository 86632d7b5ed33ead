//! engine::filters
//!
//! Filters shipped with the runtime.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

use super::context::CommandContext;
use super::filter::CommandFilter;
use super::pipeline::Next;
use super::CommandError;

/// Logs the start, outcome and duration of every invocation it wraps.
///
/// Usually registered as a global filter with a low order so it sees the
/// whole pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFilter;

#[async_trait]
impl CommandFilter for TracingFilter {
    async fn invoke(&self, ctx: &mut CommandContext, next: Next) -> Result<(), CommandError> {
        let started = Instant::now();
        info!(
            command = ctx.invocation().command_name(),
            invocation = %ctx.invocation().id(),
            "command started"
        );

        let result = next.run(ctx).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(()) => info!(
                command = ctx.invocation().command_name(),
                elapsed_ms,
                "command finished"
            ),
            Err(err) => warn!(
                command = ctx.invocation().command_name(),
                elapsed_ms,
                error = %err,
                "command failed"
            ),
        }
        result
    }
}

/// Stops the pipeline early when the invocation is already cancelled.
///
/// Without it a cancelled invocation still runs every filter's inbound side
/// before the final action notices.
#[derive(Debug, Default, Clone, Copy)]
pub struct CancellationFilter;

#[async_trait]
impl CommandFilter for CancellationFilter {
    async fn invoke(&self, ctx: &mut CommandContext, next: Next) -> Result<(), CommandError> {
        ctx.invocation().ensure_active()?;
        next.run(ctx).await
    }
}
