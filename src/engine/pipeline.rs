//! engine::pipeline
//!
//! Composition of filters around a final action.
//!
//! # Architecture
//!
//! A pipeline is a chain of [`Next`] stages ending in a [`FinalAction`]. It is
//! built inside-out: the descriptors are sorted ascending by order, then
//! folded from the last one, so the lowest order ends up outermost.
//!
//! ```text
//! orders [10, 20]:  F10.before -> F20.before -> action -> F20.after -> F10.after
//! ```
//!
//! # Invariants
//!
//! - Global descriptors precede per-command descriptors before the sort, and
//!   the sort is stable, so equal orders keep that precedence
//! - With no descriptors at all, the pipeline is the final action alone
//! - Descriptors whose key has no registration are skipped

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use super::context::CommandContext;
use super::filter::{CommandFilter, FilterRegistry};
use super::CommandError;
use crate::core::types::FilterKey;
use crate::metadata::FilterDescriptor;

/// Boxed future of one pipeline stage.
pub type StageFut<'a> = Pin<Box<dyn Future<Output = Result<(), CommandError>> + Send + 'a>>;

/// The innermost stage of a pipeline.
#[async_trait]
pub trait FinalAction: Send + Sync {
    async fn run(&self, ctx: &mut CommandContext) -> Result<(), CommandError>;
}

/// The remainder of a pipeline, handed to each filter.
pub struct Next {
    stage: Stage,
}

enum Stage {
    Filter {
        key: FilterKey,
        filter: Arc<dyn CommandFilter>,
        inner: Box<Next>,
    },
    Action(Box<dyn FinalAction>),
}

impl Next {
    /// A pipeline consisting of `action` alone.
    pub fn action(action: Box<dyn FinalAction>) -> Self {
        Self {
            stage: Stage::Action(action),
        }
    }

    fn wrap(key: FilterKey, filter: Arc<dyn CommandFilter>, inner: Next) -> Self {
        Self {
            stage: Stage::Filter {
                key,
                filter,
                inner: Box::new(inner),
            },
        }
    }

    /// Number of filters left before the final action.
    pub fn depth(&self) -> usize {
        match &self.stage {
            Stage::Filter { inner, .. } => 1 + inner.depth(),
            Stage::Action(_) => 0,
        }
    }

    /// Whether only the final action remains.
    pub fn is_terminal(&self) -> bool {
        matches!(self.stage, Stage::Action(_))
    }

    /// Keys of the remaining filters, outermost first.
    pub fn keys(&self) -> Vec<FilterKey> {
        let mut keys = Vec::new();
        let mut current = self;
        while let Stage::Filter { key, inner, .. } = &current.stage {
            keys.push(*key);
            current = inner;
        }
        keys
    }

    /// Run the rest of the pipeline.
    pub fn run(self, ctx: &mut CommandContext) -> StageFut<'_> {
        match self.stage {
            Stage::Filter { key, filter, inner } => Box::pin(async move {
                trace!(filter = key.short_name(), "entering filter");
                filter.invoke(ctx, *inner).await
            }),
            Stage::Action(action) => Box::pin(async move { action.run(ctx).await }),
        }
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next").field("filters", &self.keys()).finish()
    }
}

/// Compose `global` and `local` filters around `action`.
pub fn compose(
    registry: &FilterRegistry,
    global: &[FilterDescriptor],
    local: &[FilterDescriptor],
    action: Box<dyn FinalAction>,
) -> Next {
    if global.is_empty() && local.is_empty() {
        return Next::action(action);
    }

    let mut descriptors: Vec<FilterDescriptor> = global.iter().chain(local).copied().collect();
    descriptors.sort_by_key(|d| d.order);

    descriptors
        .iter()
        .rev()
        .fold(Next::action(action), |next, descriptor| {
            match registry.resolve(&descriptor.key) {
                Some(filter) => Next::wrap(descriptor.key, filter, next),
                None => {
                    debug!(filter = %descriptor.key, "filter not registered; skipping");
                    next
                }
            }
        })
}
