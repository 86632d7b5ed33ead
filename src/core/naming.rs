//! core::naming
//!
//! Option naming rules.
//!
//! # Features
//!
//! - Derive a display name from a property name (`dry_run` -> `dry-run`)
//! - Classify aliases as short (`-n`) or long (`--nm`, `nm`) spellings
//! - Produce the canonical token used for per-command uniqueness checks

/// Derive the display name of an option from its property name.
///
/// - Lowercase
/// - Underscores and spaces become hyphens
/// - Leading dashes are dropped
/// - Runs of separators collapse
///
/// # Example
///
/// ```
/// use cmdhost::core::naming::option_name;
///
/// assert_eq!(option_name("dry_run"), "dry-run");
/// assert_eq!(option_name("--Name"), "name");
/// ```
pub fn option_name(property: &str) -> String {
    property
        .trim_start_matches('-')
        .chars()
        .map(|c| {
            if c == '_' || c == ' ' {
                '-'
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// A parsed alias spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alias {
    /// Single-character alias, written `-n`.
    Short(char),
    /// Long alias, written `--name` (or bare `name`).
    Long(String),
}

impl Alias {
    /// Parse an alias as declared.
    ///
    /// A single dash followed by exactly one character is a short alias;
    /// everything else is a long alias with its leading dashes stripped.
    ///
    /// # Example
    ///
    /// ```
    /// use cmdhost::core::naming::Alias;
    ///
    /// assert_eq!(Alias::parse("-n"), Alias::Short('n'));
    /// assert_eq!(Alias::parse("--nick"), Alias::Long("nick".to_string()));
    /// assert_eq!(Alias::parse("nick"), Alias::Long("nick".to_string()));
    /// ```
    pub fn parse(raw: &str) -> Self {
        let mut chars = raw.chars();
        if let (Some('-'), Some(c), None) = (chars.next(), chars.next(), chars.next()) {
            if c != '-' {
                return Alias::Short(c);
            }
        }
        Alias::Long(option_name(raw))
    }

    /// Canonical token (`-n` / `--name`) used for uniqueness checks.
    pub fn token(&self) -> String {
        match self {
            Alias::Short(c) => format!("-{}", c),
            Alias::Long(name) => format!("--{}", name),
        }
    }
}

/// Tokens clap reserves for its generated help flag.
pub const RESERVED_TOKENS: &[&str] = &["--help", "-h"];

/// Sub-command names clap reserves for its generated help command.
pub const RESERVED_COMMAND_NAMES: &[&str] = &["help"];
