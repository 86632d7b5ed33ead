//! engine::context
//!
//! Per-invocation state threaded through the filter pipeline.
//!
//! # Invariants
//!
//! - Every dispatch creates a fresh [`CommandContext`]; contexts are never
//!   pooled or shared between invocations
//! - All pipeline stages of one invocation see the same context
//! - The instance is type-erased; stages recover it with [`CommandContext::command`]

use std::any::Any;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::CommandError;
use crate::core::types::CommandTypeId;

/// Read-only facts about one invocation.
///
/// Handlers receive this alongside `&mut self`; filters reach it through
/// [`CommandContext::invocation`].
#[derive(Debug, Clone)]
pub struct Invocation {
    id: Uuid,
    command_type: CommandTypeId,
    command_name: String,
    cancellation: CancellationToken,
    started_at: DateTime<Utc>,
}

impl Invocation {
    /// Unique id of this invocation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Type of the command being invoked.
    pub fn command_type(&self) -> CommandTypeId {
        self.command_type
    }

    /// Space-separated command path (`remote add`).
    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    /// Cancellation signal for the whole invocation.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Fail with [`CommandError::Cancelled`] if cancellation was requested.
    pub fn ensure_active(&self) -> Result<(), CommandError> {
        if self.is_cancelled() {
            Err(CommandError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// When dispatch started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// One in-flight command invocation.
pub struct CommandContext {
    invocation: Invocation,
    instance: Box<dyn Any + Send>,
}

impl CommandContext {
    /// Create a context for `instance`.
    pub fn new(
        command_type: CommandTypeId,
        command_name: impl Into<String>,
        instance: Box<dyn Any + Send>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            invocation: Invocation {
                id: Uuid::new_v4(),
                command_type,
                command_name: command_name.into(),
                cancellation,
                started_at: Utc::now(),
            },
            instance,
        }
    }

    /// Invocation facts.
    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Type of the command being invoked.
    pub fn command_type(&self) -> CommandTypeId {
        self.invocation.command_type
    }

    /// Cancellation signal for the whole invocation.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.invocation.cancellation
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.invocation.is_cancelled()
    }

    /// The command instance, if it is a `C`.
    pub fn command<C: 'static>(&self) -> Option<&C> {
        self.instance.downcast_ref::<C>()
    }

    /// The command instance mutably, if it is a `C`.
    pub fn command_mut<C: 'static>(&mut self) -> Option<&mut C> {
        self.instance.downcast_mut::<C>()
    }

    /// Borrow the invocation facts and the instance at the same time.
    pub fn parts_mut(&mut self) -> (&Invocation, &mut (dyn Any + Send)) {
        (&self.invocation, self.instance.as_mut())
    }

    /// Consume the context, returning the instance if it is a `C`.
    pub fn into_command<C: 'static>(self) -> Option<C> {
        self.instance.downcast::<C>().ok().map(|boxed| *boxed)
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("invocation", &self.invocation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Probe {
        hits: u32,
    }

    fn context() -> CommandContext {
        CommandContext::new(
            CommandTypeId::of::<Probe>(),
            "probe",
            Box::new(Probe::default()),
            CancellationToken::new(),
        )
    }

    mod instance_access {
        use super::*;

        #[test]
        fn downcast_to_command_type() {
            let mut ctx = context();
            ctx.command_mut::<Probe>().unwrap().hits += 1;
            assert_eq!(ctx.command::<Probe>(), Some(&Probe { hits: 1 }));
        }

        #[test]
        fn wrong_type_is_none() {
            let ctx = context();
            assert!(ctx.command::<String>().is_none());
        }

        #[test]
        fn into_command_returns_instance() {
            let mut ctx = context();
            ctx.command_mut::<Probe>().unwrap().hits = 9;
            assert_eq!(ctx.into_command::<Probe>(), Some(Probe { hits: 9 }));
        }

        #[test]
        fn parts_mut_splits_borrows() {
            let mut ctx = context();
            let (invocation, instance) = ctx.parts_mut();
            instance.downcast_mut::<Probe>().unwrap().hits = 2;
            assert_eq!(invocation.command_name(), "probe");
        }
    }

    mod cancellation {
        use super::*;

        #[test]
        fn ensure_active_until_cancelled() {
            let ctx = context();
            assert!(ctx.invocation().ensure_active().is_ok());
            ctx.cancellation().cancel();
            assert!(ctx.is_cancelled());
            assert!(matches!(
                ctx.invocation().ensure_active(),
                Err(CommandError::Cancelled)
            ));
        }
    }

    #[test]
    fn each_context_has_its_own_id() {
        assert_ne!(context().invocation().id(), context().invocation().id());
    }
}
