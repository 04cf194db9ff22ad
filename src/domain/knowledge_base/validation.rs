//! Knowledge base name validation

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length for knowledge base names
pub const MAX_KB_NAME_LENGTH: usize = 64;

/// Names double as directory names, so only path-safe characters are allowed
static KB_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("valid KB name pattern"));

/// Knowledge base validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeBaseValidationError {
    EmptyName,
    NameTooLong { length: usize, max: usize },
    InvalidNameFormat { name: String },
}

impl fmt::Display for KnowledgeBaseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Knowledge base name cannot be empty"),
            Self::NameTooLong { length, max } => write!(
                f,
                "Knowledge base name too long: {} characters (max {})",
                length, max
            ),
            Self::InvalidNameFormat { name } => write!(
                f,
                "Invalid knowledge base name '{}': use letters, digits, '_' and '-'",
                name
            ),
        }
    }
}

impl std::error::Error for KnowledgeBaseValidationError {}

pub fn validate_knowledge_base_name(name: &str) -> Result<(), KnowledgeBaseValidationError> {
    if name.is_empty() {
        return Err(KnowledgeBaseValidationError::EmptyName);
    }

    if name.len() > MAX_KB_NAME_LENGTH {
        return Err(KnowledgeBaseValidationError::NameTooLong {
            length: name.len(),
            max: MAX_KB_NAME_LENGTH,
        });
    }

    if !KB_NAME_PATTERN.is_match(name) {
        return Err(KnowledgeBaseValidationError::InvalidNameFormat {
            name: name.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["kb_manual", "a", "Policies-2024", "KB_9"] {
            assert!(validate_knowledge_base_name(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(
            validate_knowledge_base_name(""),
            Err(KnowledgeBaseValidationError::EmptyName)
        );
        assert!(validate_knowledge_base_name("../etc").is_err());
        assert!(validate_knowledge_base_name("_hidden").is_err());
        assert!(validate_knowledge_base_name("with space").is_err());
        assert!(matches!(
            validate_knowledge_base_name(&"a".repeat(65)),
            Err(KnowledgeBaseValidationError::NameTooLong { .. })
        ));
    }
}
