//! engine::parser
//!
//! Translation between option descriptors and clap arguments.
//!
//! Coercion and range checks live in clap's value parsers; this module only
//! picks the right parser for a [`ValueKind`] and reads typed values back out
//! of [`ArgMatches`].

use std::path::PathBuf;

use clap::parser::MatchesError;
use clap::{value_parser, Arg, ArgAction, ArgMatches};

use crate::core::naming::Alias;
use crate::core::value::{OptionValue, ValueKind};
use crate::metadata::OptionDescriptor;

/// Build the clap argument for `option`.
///
/// The option must have a bindable type; callers validate this first.
pub(crate) fn to_arg<T>(option: &OptionDescriptor<T>) -> Arg {
    let mut arg = Arg::new(option.name().to_string())
        .long(option.name().to_string())
        .action(ArgAction::Set)
        .required(option.requires_input());

    let mut has_short = false;
    for alias in option.aliases() {
        arg = match alias {
            Alias::Short(c) if !has_short => {
                has_short = true;
                arg.short(*c)
            }
            Alias::Short(c) => arg.visible_short_alias(*c),
            Alias::Long(name) => arg.visible_alias(name.clone()),
        };
    }

    if let Some(help) = help_text(option.description(), option.completions()) {
        arg = arg.help(help);
    }

    if let Some(rendered) = option.default_value().supplied().and_then(OptionValue::render) {
        arg = arg.default_value(rendered);
    }

    match option.value_type().kind() {
        Some(kind) => with_value_parser(arg, kind),
        None => arg,
    }
}

fn with_value_parser(arg: Arg, kind: ValueKind) -> Arg {
    match kind {
        // An explicit value must be attached (`--flag=false`) so a bare flag
        // never consumes the following token.
        ValueKind::Bool => arg
            .value_parser(value_parser!(bool))
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true"),
        ValueKind::Int { min, max } => arg
            .value_parser(value_parser!(i64).range(min..=max))
            .allow_negative_numbers(true),
        ValueKind::UInt { max } => arg.value_parser(value_parser!(u64).range(0..=max)),
        ValueKind::Float => arg
            .value_parser(value_parser!(f64))
            .allow_negative_numbers(true),
        ValueKind::Text => arg.value_parser(value_parser!(String)),
        ValueKind::Path => arg.value_parser(value_parser!(PathBuf)),
    }
}

/// Help text with completion hints appended.
fn help_text(description: Option<&str>, completions: &[String]) -> Option<String> {
    let hints = (!completions.is_empty()).then(|| format!("[suggested: {}]", completions.join(", ")));
    match (description, hints) {
        (Some(text), Some(hints)) => Some(format!("{} {}", text, hints)),
        (Some(text), None) => Some(text.to_string()),
        (None, hints) => hints,
    }
}

/// Read the typed value of argument `id`, if clap has one.
pub(crate) fn read_value(
    matches: &ArgMatches,
    id: &str,
    kind: ValueKind,
) -> Result<Option<OptionValue>, MatchesError> {
    let value = match kind {
        ValueKind::Bool => matches.try_get_one::<bool>(id)?.copied().map(OptionValue::Bool),
        ValueKind::Int { .. } => matches.try_get_one::<i64>(id)?.copied().map(OptionValue::Int),
        ValueKind::UInt { .. } => matches.try_get_one::<u64>(id)?.copied().map(OptionValue::UInt),
        ValueKind::Float => matches.try_get_one::<f64>(id)?.copied().map(OptionValue::Float),
        ValueKind::Text => matches
            .try_get_one::<String>(id)?
            .cloned()
            .map(OptionValue::Text),
        ValueKind::Path => matches
            .try_get_one::<PathBuf>(id)?
            .cloned()
            .map(OptionValue::Path),
    };
    Ok(value)
}
