use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while compiling rules, scanning input, or moving a matcher
/// in and out of storage.
#[derive(Debug, Error)]
pub enum Error {
    /// A rule line could not be understood.
    #[error("invalid rule line {line:?}: {reason}")]
    InvalidRule {
        /// The offending line, without its line terminator.
        line: String,
        reason: String,
    },

    /// A chain of replacement rules loops back onto itself.
    #[error("circular reference while resolving replacements for {pattern:?}")]
    CircularReference { pattern: String },

    /// A pattern resolves to more than one terminal replacement.
    #[error("conflicting replacements for {pattern:?}: {targets:?}")]
    ConflictingRule { pattern: String, targets: Vec<String> },

    /// A scan argument was rejected before scanning began.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The control character was found in the input.
    #[error("reserved control character {ch:?} found in input at position {position}")]
    ReservedCharacterCollision { ch: char, position: usize },

    /// A snapshot could not be encoded or decoded.
    #[error("snapshot encoding error: {0}")]
    Persistence(#[from] bincode::Error),

    /// A snapshot was written by an incompatible format revision.
    #[error("unsupported snapshot format {found} (expected {expected})")]
    UnsupportedFormat { found: u16, expected: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A rule configuration document is not valid JSON for the expected shape.
    #[error("rule config error: {0}")]
    Json(#[from] serde_json::Error),

    /// A rule configuration imports itself, directly or transitively.
    #[error("import cycle through {}", path.display())]
    ImportCycle { path: PathBuf },
}

/// Result type alias for lexmap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal findings reported by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileWarning {
    /// A single-valued setting was given several values and was ignored.
    SettingConflict { setting: String, values: Vec<String> },
}

impl std::fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileWarning::SettingConflict { setting, values } => {
                write!(f, "multiple values for setting {setting:?} ({}); setting ignored", values.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = Error::CircularReference { pattern: "x".into() };
        assert_eq!(err.to_string(), "circular reference while resolving replacements for \"x\"");

        let err = Error::InvalidRule { line: "r\tonly-two".into(), reason: "expected 3 columns, found 2".into() };
        assert!(err.to_string().contains("expected 3 columns"));

        let err = Error::ReservedCharacterCollision { ch: '\u{1f}', position: 4 };
        assert!(err.to_string().ends_with("at position 4"));

        let err = Error::ImportCycle { path: PathBuf::from("rules/base.json") };
        assert_eq!(err.to_string(), "import cycle through rules/base.json");
    }

    #[test]
    fn warning_display_lists_values() {
        let warning = CompileWarning::SettingConflict { setting: "cs".into(), values: vec!["0".into(), "1".into()] };
        assert_eq!(warning.to_string(), "multiple values for setting \"cs\" (0, 1); setting ignored");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
