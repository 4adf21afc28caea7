use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad variable name, duplicate variable, empty pattern or missing SEO field.
    #[error("Invalid template: {}", .errors.join("; "))]
    InvalidTemplate { errors: Vec<String> },

    /// A required variable has no bound value set, or an empty one.
    #[error(
        "Missing data for variable(s) [{}]; available: [{}]",
        .missing.join(", "),
        .available.join(", ")
    )]
    MissingData {
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// Rendered output still references a placeholder. Indicates a template
    /// bug upstream; the default synthesizers should make this unreachable.
    #[error("Unresolved placeholder(s) in rendered output: {}", .placeholders.join(", "))]
    UnresolvedPlaceholder { placeholders: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// A generation worker panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub fn invalid_template(error: impl Into<String>) -> Self {
        Error::InvalidTemplate {
            errors: vec![error.into()],
        }
    }

    /// Whether the caller can retry with corrected input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::MissingData { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_data_message_lists_both_sides() {
        let err = Error::MissingData {
            missing: vec!["b".into()],
            available: vec!["a".into()],
        };
        assert_eq!(
            err.to_string(),
            "Missing data for variable(s) [b]; available: [a]"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_invalid_template_joins_errors() {
        let err = Error::InvalidTemplate {
            errors: vec!["empty pattern".into(), "bad name '1x'".into()],
        };
        assert_eq!(
            err.to_string(),
            "Invalid template: empty pattern; bad name '1x'"
        );
        assert!(!err.is_recoverable());
    }
}
