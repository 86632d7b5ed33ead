//! engine::builder
//!
//! Registers a command type's options with the parser engine and installs the
//! operation that binds and executes it.
//!
//! # Architecture
//!
//! [`ActionBuilder::apply`] is the only place configuration errors surface.
//! It validates the cached model of the command against the registration
//! context, collects every problem, and only then mutates the context:
//!
//! 1. Reject a context that already has an operation
//! 2. Validate types, names, aliases and reserved tokens
//! 3. Register one clap argument per option, in model order
//! 4. Install a [`BoundOperation`] for the command type
//!
//! # Invariants
//!
//! - A failed `apply` leaves the registration context untouched
//! - Every option of a successfully built command has a bindable type and a
//!   unique, non-reserved set of tokens

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use clap::ArgMatches;
use tracing::debug;

use super::command::Command;
use super::context::CommandContext;
use super::{parser, BuildError, CommandError};
use crate::core::naming::{Alias, RESERVED_TOKENS};
use crate::core::types::{CommandTypeId, PropertyId};
use crate::core::value::ValueType;
use crate::metadata::{model, CommandModel, Problem};

/// A parser-engine command under construction, plus its installed operation.
#[derive(Default)]
pub struct RegistrationContext {
    command: clap::Command,
    operation: Option<Arc<dyn Operation>>,
}

impl RegistrationContext {
    /// Wrap a clap command.
    pub fn new(command: clap::Command) -> Self {
        Self {
            command,
            operation: None,
        }
    }

    /// The clap command as built so far.
    pub fn command(&self) -> &clap::Command {
        &self.command
    }

    /// The installed operation, if any.
    pub fn operation(&self) -> Option<&Arc<dyn Operation>> {
        self.operation.as_ref()
    }

    /// Take the clap command and operation back out.
    pub fn into_parts(self) -> (clap::Command, Option<Arc<dyn Operation>>) {
        (self.command, self.operation)
    }

    fn register(&mut self, arg: clap::Arg) {
        let command = std::mem::take(&mut self.command);
        self.command = command.arg(arg);
    }

    /// Tokens already taken on the clap command (reserved ones included).
    fn taken_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = RESERVED_TOKENS.iter().map(|t| t.to_string()).collect();
        if self.command.get_version().is_some() {
            tokens.extend(["--version".to_string(), "-V".to_string()]);
        }
        for arg in self.command.get_arguments() {
            if let Some(long) = arg.get_long() {
                tokens.push(format!("--{}", long));
            }
            if let Some(short) = arg.get_short() {
                tokens.push(format!("-{}", short));
            }
        }
        tokens
    }
}

/// The invocable half of a registration: binds parsed values and runs the handler.
#[async_trait]
pub trait Operation: Send + Sync {
    /// The command type this operation binds.
    fn command_type(&self) -> CommandTypeId;

    /// Display name of the command.
    fn name(&self) -> &'static str;

    /// A fresh, unbound instance of the command type.
    fn instantiate(&self) -> Box<dyn Any + Send>;

    /// Write every option's parsed or default value onto `instance`.
    fn bind(&self, matches: &ArgMatches, instance: &mut (dyn Any + Send))
        -> Result<(), CommandError>;

    /// Bind the context's instance, then run its handler.
    async fn invoke(&self, matches: &ArgMatches, ctx: &mut CommandContext)
        -> Result<(), CommandError>;
}

/// Builds the parser-engine bindings for command type `C`.
pub struct ActionBuilder<C: Command> {
    model: Arc<CommandModel<C>>,
}

impl<C: Command> Default for ActionBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Command> ActionBuilder<C> {
    /// Builder over the cached model of `C`.
    pub fn new() -> Self {
        Self { model: model::<C>() }
    }

    /// The model the builder registers.
    pub fn model(&self) -> &CommandModel<C> {
        &self.model
    }

    /// Every problem that would make `apply` fail against `ctx`.
    pub fn validate(&self, ctx: &RegistrationContext) -> Vec<Problem> {
        let mut problems = self.model.problems().to_vec();
        let reserved = ctx.taken_tokens();
        let mut seen: HashMap<String, PropertyId> = HashMap::new();

        for option in self.model.options() {
            let property = option.property();

            if let ValueType::Unsupported(type_name) = option.value_type() {
                problems.push(Problem::UnsupportedType {
                    property,
                    type_name,
                });
            }

            let empty_alias = option
                .aliases()
                .iter()
                .any(|a| matches!(a, Alias::Long(name) if name.is_empty()));
            if option.name().is_empty() || empty_alias {
                problems.push(Problem::EmptyName { property });
                continue;
            }

            for token in option.tokens() {
                if reserved.contains(&token) {
                    problems.push(Problem::ReservedName { property, token });
                    continue;
                }
                match seen.get(&token) {
                    Some(first) => problems.push(Problem::DuplicateName {
                        property,
                        token,
                        first: *first,
                    }),
                    None => {
                        seen.insert(token, property);
                    }
                }
            }
        }

        problems
    }

    /// Register options and install the operation on `ctx`.
    pub fn apply(&self, ctx: &mut RegistrationContext) -> Result<(), BuildError> {
        if ctx.operation.is_some() {
            return Err(BuildError::new(C::NAME, vec![Problem::OperationAlreadySet]));
        }

        let problems = self.validate(ctx);
        if !problems.is_empty() {
            return Err(BuildError::new(C::NAME, problems));
        }

        for option in self.model.options() {
            debug!(
                command = C::NAME,
                option = option.name(),
                required = option.requires_input(),
                "registering option"
            );
            ctx.register(parser::to_arg(option));
        }

        ctx.operation = Some(Arc::new(BoundOperation::<C> {
            model: Arc::clone(&self.model),
            _command: PhantomData,
        }));
        Ok(())
    }
}

/// Operation for command type `C`.
struct BoundOperation<C: Command> {
    model: Arc<CommandModel<C>>,
    _command: PhantomData<fn() -> C>,
}

impl<C: Command> BoundOperation<C> {
    fn downcast(instance: &mut (dyn Any + Send)) -> Result<&mut C, CommandError> {
        instance
            .downcast_mut::<C>()
            .ok_or(CommandError::InstanceMismatch {
                expected: std::any::type_name::<C>(),
            })
    }
}

#[async_trait]
impl<C: Command> Operation for BoundOperation<C> {
    fn command_type(&self) -> CommandTypeId {
        self.model.command_type()
    }

    fn name(&self) -> &'static str {
        C::NAME
    }

    fn instantiate(&self) -> Box<dyn Any + Send> {
        Box::new(C::default())
    }

    fn bind(
        &self,
        matches: &ArgMatches,
        instance: &mut (dyn Any + Send),
    ) -> Result<(), CommandError> {
        let command = Self::downcast(instance)?;

        for option in self.model.options() {
            let Some(kind) = option.value_type().kind() else {
                continue;
            };
            let bind_error = |message: String| CommandError::Bind {
                option: option.name().to_string(),
                message,
            };

            let parsed = parser::read_value(matches, option.name(), kind)
                .map_err(|e| bind_error(e.to_string()))?;
            let value = match parsed {
                Some(value) => value,
                None => match option.default_value().supplied() {
                    Some(value) => value.clone(),
                    None => continue,
                },
            };
            if value.is_absent() && !option.value_type().is_nullable() {
                continue;
            }

            option
                .apply(command, value)
                .map_err(|e| bind_error(e.to_string()))?;
        }

        Ok(())
    }

    async fn invoke(
        &self,
        matches: &ArgMatches,
        ctx: &mut CommandContext,
    ) -> Result<(), CommandError> {
        let (invocation, instance) = ctx.parts_mut();
        self.bind(matches, instance)?;
        invocation.ensure_active()?;

        let command = Self::downcast(instance)?;
        debug!(command = C::NAME, invocation = %invocation.id(), "executing handler");
        command.execute(invocation).await.map_err(|err| {
            // Handlers may surface engine errors (e.g. `ensure_active()?`) through anyhow.
            match err.downcast::<CommandError>() {
                Ok(engine) => engine,
                Err(other) => CommandError::Failed(other),
            }
        })
    }
}
