//! cli::host
//!
//! The command host: registration, build, parse and dispatch.
//!
//! # Architecture
//!
//! ```text
//! HostBuilder::add_command / add_sub_command / use_handler / use_filter
//!   -> build(): extract metadata, apply bindings, assemble clap tree
//!   -> Host::dispatch(args): parse -> walk to leaf -> Dispatcher::dispatch
//!   -> Host::run(args): dispatch + exit code + Ctrl-C cancellation
//! ```
//!
//! # Exit Codes
//!
//! | Outcome                         | Code                      |
//! |---------------------------------|---------------------------|
//! | Success                         | 0                         |
//! | Parse error, help, version      | clap's own (2 / 0)        |
//! | Handler or filter failure       | 1                         |
//! | Cancelled                       | 130                       |

use std::collections::HashMap;
use std::ffi::OsString;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::tree::{assemble_tree, Registration};
use crate::core::config::HostConfig;
use crate::engine::{
    BuildError, Command, CommandContext, CommandError, CommandFilter, CommandTarget, Dispatcher,
    FilterRegistry,
};
use crate::metadata::{CommandDescriptor, FilterDescriptor};

/// Exit code for a failed invocation.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for a cancelled invocation (128 + SIGINT).
pub const EXIT_CANCELLED: i32 = 130;

/// Errors from the host API.
#[derive(Debug, Error)]
pub enum HostError {
    /// Argument parsing failed, or help/version output was requested.
    #[error(transparent)]
    Parse(#[from] clap::Error),

    /// The parsed command path has no handler.
    #[error("no handler registered for '{0}'")]
    UnknownCommand(String),

    /// The invocation failed.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Collects registrations for a [`Host`].
pub struct HostBuilder {
    name: String,
    about: Option<String>,
    version: Option<String>,
    config: HostConfig,
    handler: Option<Registration>,
    registrations: Vec<Registration>,
    global_filters: Vec<FilterDescriptor>,
    registry: FilterRegistry,
}

impl HostBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: None,
            version: None,
            config: HostConfig::default(),
            handler: None,
            registrations: Vec::new(),
            global_filters: Vec::new(),
            registry: FilterRegistry::new(),
        }
    }

    /// Help text of the root command.
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Version shown by `--version`.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Host configuration.
    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    /// Register `C` as a top-level command.
    pub fn add_command<C: Command>(mut self) -> Self {
        self.registrations.push(Registration::top::<C>());
        self
    }

    /// Register `C` as a sub-command of `P`.
    ///
    /// `P` may be registered before or after `C`.
    pub fn add_sub_command<P: Command, C: Command>(mut self) -> Self {
        self.registrations.push(Registration::child::<P, C>());
        self
    }

    /// Run `C` when no sub-command is given; its options go on the root command.
    pub fn use_handler<C: Command>(mut self) -> Self {
        self.handler = Some(Registration::top::<C>());
        self
    }

    /// Add a global filter that wraps every command.
    pub fn use_filter<F: 'static>(mut self, order: i32) -> Self {
        self.global_filters.push(FilterDescriptor::of::<F>(order));
        self
    }

    /// Register a shared filter instance under its own type.
    pub fn register_filter<F: CommandFilter>(mut self, filter: F) -> Self {
        self.registry.register(filter);
        self
    }

    /// Register a filter factory; each invocation gets a new instance.
    pub fn register_filter_factory<F, M>(mut self, make: M) -> Self
    where
        F: CommandFilter,
        M: Fn() -> F + Send + Sync + 'static,
    {
        self.registry.register_factory(make);
        self
    }

    /// Register `filter` under marker key `K`.
    pub fn provide_filter<K: ?Sized + 'static, F: CommandFilter>(mut self, filter: F) -> Self {
        self.registry.provide::<K, F>(filter);
        self
    }

    /// Validate every registration and assemble the host.
    ///
    /// # Errors
    ///
    /// Returns the first command whose configuration is invalid, with every
    /// problem found for it.
    pub fn build(self) -> Result<Host, BuildError> {
        let mut root = clap::Command::new(self.name.clone());
        if let Some(about) = &self.about {
            root = root.about(about.clone());
        }
        if let Some(version) = &self.version {
            root = root.version(version.clone());
        }

        let mut assembled = assemble_tree(root, self.handler, &self.registrations)?;
        // Run clap's own consistency checks now rather than on first parse.
        assembled.command.build();
        debug!(
            host = %self.name,
            commands = assembled.targets.len(),
            global_filters = self.global_filters.len(),
            "host built"
        );

        Ok(Host {
            command: assembled.command,
            tree: assembled.tree,
            targets: assembled.targets,
            dispatcher: Dispatcher::new(self.registry, self.global_filters),
            config: self.config,
        })
    }
}

/// A built command host.
///
/// Immutable; any number of invocations may be dispatched concurrently.
pub struct Host {
    command: clap::Command,
    tree: CommandDescriptor,
    targets: HashMap<Vec<String>, CommandTarget>,
    dispatcher: Dispatcher,
    config: HostConfig,
}

impl Host {
    /// Start building a host whose root command is `name`.
    pub fn builder(name: impl Into<String>) -> HostBuilder {
        HostBuilder::new(name)
    }

    /// Root of the command tree.
    pub fn tree(&self) -> &CommandDescriptor {
        &self.tree
    }

    /// The assembled clap command.
    pub fn command(&self) -> &clap::Command {
        &self.command
    }

    /// Host configuration.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Parse `args` (including the binary name) and dispatch the selected command.
    pub async fn dispatch<I, T>(
        &self,
        args: I,
        cancellation: CancellationToken,
    ) -> Result<CommandContext, HostError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut matches = self.command.clone().try_get_matches_from(args)?;

        let mut path = Vec::new();
        while let Some((name, sub)) = matches.remove_subcommand() {
            path.push(name);
            matches = sub;
        }

        let target = self
            .targets
            .get(&path)
            .ok_or_else(|| HostError::UnknownCommand(path.join(" ")))?;

        let ctx = self
            .dispatcher
            .dispatch(target, matches, cancellation)
            .await?;
        Ok(ctx)
    }

    /// Dispatch `args` and map the outcome to a process exit code.
    ///
    /// Parse errors and help output are printed by clap; failures are logged
    /// and printed to stderr.
    pub async fn run<I, T>(&self, args: I) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cancellation = CancellationToken::new();
        let watcher = self
            .config
            .runtime
            .cancel_on_interrupt
            .then(|| spawn_interrupt_watcher(cancellation.clone()));

        let code = match self.dispatch(args, cancellation).await {
            Ok(_) => 0,
            Err(HostError::Parse(err)) => {
                let _ = err.print();
                err.exit_code()
            }
            Err(HostError::Command(CommandError::Cancelled)) => {
                warn!("command cancelled");
                eprintln!("cancelled");
                EXIT_CANCELLED
            }
            Err(err) => {
                error!(error = %err, "command failed");
                eprintln!("error: {}", err);
                EXIT_FAILURE
            }
        };

        if let Some(watcher) = watcher {
            watcher.abort();
        }
        code
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("name", &self.tree.name)
            .field("commands", &self.targets.len())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

fn spawn_interrupt_watcher(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received; cancelling invocation");
            token.cancel();
        }
    })
}
