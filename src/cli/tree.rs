//! cli::tree
//!
//! Assembly of the command tree from host registrations.
//!
//! # Architecture
//!
//! Registrations are flat: each names its command type and, for sub-commands,
//! its parent type. Assembly validates the whole set, then walks it from the
//! root, applying each command's bindings to its own clap sub-command and
//! recording a [`CommandTarget`] under the command's name path.
//!
//! # Invariants
//!
//! - A command type is registered at most once
//! - Every parent named by a sub-command is itself registered
//! - Sibling commands have distinct names
//! - No command takes a name clap generates itself (`help`)
//! - Every registration is reachable from the root

use std::collections::{HashMap, HashSet};

use crate::core::naming::RESERVED_COMMAND_NAMES;
use crate::core::types::CommandTypeId;
use crate::engine::{ActionBuilder, BuildError, Command, CommandTarget, RegistrationContext};
use crate::metadata::{CommandDescriptor, FilterDescriptor, Problem};

/// Applies a command type's bindings and returns its filters.
type Assemble = fn(&mut RegistrationContext) -> Result<Vec<FilterDescriptor>, BuildError>;

fn assemble<C: Command>(ctx: &mut RegistrationContext) -> Result<Vec<FilterDescriptor>, BuildError> {
    let builder = ActionBuilder::<C>::new();
    builder.apply(ctx)?;
    Ok(builder.model().filters().to_vec())
}

/// One registered command.
#[derive(Clone, Copy)]
pub(crate) struct Registration {
    command_type: CommandTypeId,
    parent: Option<(CommandTypeId, &'static str)>,
    name: &'static str,
    description: Option<&'static str>,
    assemble: Assemble,
}

impl Registration {
    /// Registration of `C` at the top level.
    pub(crate) fn top<C: Command>() -> Self {
        Self {
            command_type: CommandTypeId::of::<C>(),
            parent: None,
            name: C::NAME,
            description: C::DESCRIPTION,
            assemble: assemble::<C>,
        }
    }

    /// Registration of `C` under parent command `P`.
    pub(crate) fn child<P: Command, C: Command>() -> Self {
        Self {
            parent: Some((CommandTypeId::of::<P>(), P::NAME)),
            ..Self::top::<C>()
        }
    }
}

/// The assembled tree.
pub(crate) struct Assembled {
    pub(crate) command: clap::Command,
    pub(crate) tree: CommandDescriptor,
    pub(crate) targets: HashMap<Vec<String>, CommandTarget>,
}

/// Validate `registrations` and build the tree under `root`.
pub(crate) fn assemble_tree(
    root: clap::Command,
    handler: Option<Registration>,
    registrations: &[Registration],
) -> Result<Assembled, BuildError> {
    let root_name = root.get_name().to_string();
    let root_type = handler.map(|h| h.command_type);

    let problems = validate(root_type, handler.as_ref(), registrations);
    if !problems.is_empty() {
        return Err(BuildError::new(root_name, problems));
    }

    let mut walk = Walk {
        registrations,
        root_type,
        targets: HashMap::new(),
        visited: HashSet::new(),
    };

    let root = match handler {
        Some(_) => root,
        None => root.subcommand_required(true).arg_required_else_help(true),
    };
    let (command, tree) = walk.node(root, handler.as_ref(), Vec::new())?;

    let unreachable: Vec<Problem> = registrations
        .iter()
        .filter(|r| !walk.visited.contains(&r.command_type))
        .filter_map(|r| r.parent.map(|(_, parent)| Problem::UnknownParent { parent }))
        .collect();
    if !unreachable.is_empty() {
        return Err(BuildError::new(root_name, unreachable));
    }

    Ok(Assembled {
        command,
        tree,
        targets: walk.targets,
    })
}

fn validate(
    root_type: Option<CommandTypeId>,
    handler: Option<&Registration>,
    registrations: &[Registration],
) -> Vec<Problem> {
    let mut problems = Vec::new();

    let mut types = HashSet::new();
    for reg in handler.into_iter().chain(registrations) {
        if !types.insert(reg.command_type) {
            problems.push(Problem::DuplicateCommand {
                name: reg.command_type.short_name().to_string(),
            });
        }
    }

    let mut siblings: HashSet<(Option<CommandTypeId>, &str)> = HashSet::new();
    for reg in registrations {
        if let Some((parent, parent_name)) = reg.parent {
            if !types.contains(&parent) {
                problems.push(Problem::UnknownParent {
                    parent: parent_name,
                });
            }
        }
        if RESERVED_COMMAND_NAMES.contains(&reg.name) {
            problems.push(Problem::ReservedCommandName {
                name: reg.name.to_string(),
            });
        }
        if !siblings.insert((effective_parent(reg, root_type), reg.name)) {
            problems.push(Problem::DuplicateCommandName {
                name: reg.name.to_string(),
            });
        }
    }

    problems
}

/// Parent type of `reg`, with the root handler's type folded into the top level.
fn effective_parent(reg: &Registration, root_type: Option<CommandTypeId>) -> Option<CommandTypeId> {
    reg.parent
        .map(|(parent, _)| parent)
        .filter(|parent| Some(*parent) != root_type)
}

struct Walk<'a> {
    registrations: &'a [Registration],
    root_type: Option<CommandTypeId>,
    targets: HashMap<Vec<String>, CommandTarget>,
    visited: HashSet<CommandTypeId>,
}

impl Walk<'_> {
    fn node(
        &mut self,
        command: clap::Command,
        registration: Option<&Registration>,
        path: Vec<String>,
    ) -> Result<(clap::Command, CommandDescriptor), BuildError> {
        let name = command.get_name().to_string();
        let description = command.get_about().map(ToString::to_string);

        let mut command = command;
        if let Some(reg) = registration {
            self.visited.insert(reg.command_type);
            let mut ctx = RegistrationContext::new(command);
            let filters = (reg.assemble)(&mut ctx)?;
            let (built, operation) = ctx.into_parts();
            command = built;
            if let Some(operation) = operation {
                let display = if path.is_empty() {
                    name.clone()
                } else {
                    path.join(" ")
                };
                self.targets
                    .insert(path.clone(), CommandTarget::new(display, operation, filters));
            }
        }

        // The root's children are the top-level registrations.
        let key = if path.is_empty() {
            None
        } else {
            registration.map(|r| r.command_type)
        };

        let children: Vec<Registration> = self
            .registrations
            .iter()
            .filter(|r| effective_parent(r, self.root_type) == key)
            .copied()
            .collect();

        let mut descriptors = Vec::new();
        for child in children {
            let mut sub = clap::Command::new(child.name);
            if let Some(about) = child.description {
                sub = sub.about(about);
            }
            let mut child_path = path.clone();
            child_path.push(child.name.to_string());

            let (sub, descriptor) = self.node(sub, Some(&child), child_path)?;
            command = command.subcommand(sub);
            descriptors.push(descriptor);
        }

        Ok((
            command,
            CommandDescriptor {
                command_type: registration.map(|r| r.command_type),
                name,
                description,
                children: descriptors,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Invocation;
    use crate::metadata::{Declaration, Options};
    use async_trait::async_trait;

    macro_rules! command {
        ($ty:ident, $name:literal) => {
            #[derive(Default)]
            struct $ty;

            impl Options for $ty {
                fn declare(_decl: &mut Declaration<Self>) {}
            }

            #[async_trait]
            impl Command for $ty {
                const NAME: &'static str = $name;

                async fn execute(&mut self, _: &Invocation) -> anyhow::Result<()> {
                    Ok(())
                }
            }
        };
    }

    command!(Remote, "remote");
    command!(Add, "add");
    command!(Remove, "remove");
    command!(Greet, "greet");
    command!(Other, "greet");
    command!(Help, "help");

    fn root() -> clap::Command {
        clap::Command::new("app")
    }

    #[test]
    fn nested_tree_and_targets() {
        let regs = [
            Registration::child::<Remote, Add>(),
            Registration::top::<Remote>(),
            Registration::top::<Greet>(),
            Registration::child::<Remote, Remove>(),
        ];
        let assembled = assemble_tree(root(), None, &regs).unwrap();

        let names: Vec<_> = assembled.tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["remote", "greet"]);
        let remote = assembled.tree.find(&["remote"]).unwrap();
        let subs: Vec<_> = remote.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(subs, vec!["add", "remove"]);

        let add = &assembled.targets[&vec!["remote".to_string(), "add".to_string()]];
        assert_eq!(add.path(), "remote add");
        assert_eq!(add.command_type(), CommandTypeId::of::<Add>());
        assert!(!assembled.targets.contains_key(&Vec::<String>::new()));
    }

    #[test]
    fn root_handler_gets_root_target() {
        let assembled =
            assemble_tree(root(), Some(Registration::top::<Greet>()), &[Registration::top::<Remote>()])
                .unwrap();
        let target = &assembled.targets[&Vec::<String>::new()];
        assert_eq!(target.path(), "app");
        assert_eq!(assembled.tree.command_type, Some(CommandTypeId::of::<Greet>()));
    }

    #[test]
    fn children_of_root_handler_are_top_level() {
        let assembled = assemble_tree(
            root(),
            Some(Registration::top::<Remote>()),
            &[Registration::child::<Remote, Add>()],
        )
        .unwrap();
        assert!(assembled.tree.find(&["add"]).is_some());
    }

    mod problems {
        use super::*;

        fn problems(regs: &[Registration]) -> Vec<Problem> {
            match assemble_tree(root(), None, regs) {
                Ok(_) => Vec::new(),
                Err(err) => err.problems,
            }
        }

        #[test]
        fn duplicate_type() {
            let found = problems(&[Registration::top::<Greet>(), Registration::top::<Greet>()]);
            assert!(found
                .iter()
                .any(|p| matches!(p, Problem::DuplicateCommand { name } if name == "Greet")));
        }

        #[test]
        fn unknown_parent() {
            let found = problems(&[Registration::child::<Remote, Add>()]);
            assert_eq!(found, vec![Problem::UnknownParent { parent: "remote" }]);
        }

        #[test]
        fn duplicate_sibling_name() {
            let found = problems(&[Registration::top::<Greet>(), Registration::top::<Other>()]);
            assert_eq!(
                found,
                vec![Problem::DuplicateCommandName {
                    name: "greet".into()
                }]
            );
        }

        #[test]
        fn generated_help_name_is_reserved() {
            let found = problems(&[
                Registration::top::<Remote>(),
                Registration::child::<Remote, Help>(),
            ]);
            assert_eq!(
                found,
                vec![Problem::ReservedCommandName {
                    name: "help".into()
                }]
            );
        }

        #[test]
        fn cycle_is_unreachable() {
            let found = problems(&[
                Registration::child::<Add, Remove>(),
                Registration::child::<Remove, Add>(),
            ]);
            assert_eq!(found.len(), 2);
            assert!(found.iter().all(|p| matches!(p, Problem::UnknownParent { .. })));
        }
    }
}
