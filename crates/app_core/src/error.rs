//! Application error types

use thiserror::Error;

/// Why a tag was refused by validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRejection {
    /// Longer than the configured number of code points
    TooLong,
    /// Contains a tab, CR or LF
    ForbiddenWhitespace,
    /// Contains a control code (U+0000..U+001F or U+007F)
    ControlCharacter,
    /// Starts or ends with whitespace
    SurroundingWhitespace,
}

impl std::fmt::Display for TagRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TagRejection::TooLong => "too long",
            TagRejection::ForbiddenWhitespace => "contains a tab or line break",
            TagRejection::ControlCharacter => "contains a control character",
            TagRejection::SurroundingWhitespace => "has leading or trailing whitespace",
        };
        f.write_str(text)
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Programming errors (abort the operation) =====
    #[error("No images")]
    Empty,

    #[error("Invalid count: {0}")]
    InvalidCount(usize),

    #[error("Tag filter applied without a tag store")]
    NoFilter,

    // ===== Recoverable Errors (notify user, continue) =====
    #[error("Invalid tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: TagRejection },

    #[error("Too many tags: {count} (max {max})")]
    TooManyTags { count: usize, max: usize },

    #[error("Store error: {0}")]
    StoreIo(String),
}

impl AppError {
    /// Errors that indicate a caller bug rather than a user or I/O problem
    pub fn is_programming_error(&self) -> bool {
        matches!(self, AppError::Empty | AppError::InvalidCount(_) | AppError::NoFilter)
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidTag { tag, reason } => {
                let shown: String = if tag.chars().count() > 20 {
                    format!("{}...", tag.chars().take(20).collect::<String>())
                } else {
                    tag.clone()
                };
                format!("Tag \"{}\" {}", shown, reason)
            }
            AppError::TooManyTags { max, .. } => format!("Too many tags (max {})", max),
            AppError::StoreIo(msg) => format!("Storage error: {}", msg),
            _ => self.to_string(),
        }
    }
}

impl From<app_fs::FsError> for AppError {
    fn from(e: app_fs::FsError) -> Self {
        AppError::StoreIo(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_programming_errors() {
        assert!(AppError::Empty.is_programming_error());
        assert!(AppError::InvalidCount(0).is_programming_error());
        assert!(!AppError::StoreIo("x".into()).is_programming_error());
    }

    #[test]
    fn test_long_tag_is_shortened_in_message() {
        let err = AppError::InvalidTag {
            tag: "a".repeat(120),
            reason: TagRejection::TooLong,
        };
        let msg = err.user_message();
        assert!(msg.contains(&format!("{}...", "a".repeat(20))));
        assert!(msg.ends_with("too long"));
    }

    #[test]
    fn test_fs_errors_become_store_io() {
        let err: AppError = app_fs::FsError::NotFound("/x".into()).into();
        assert!(matches!(err, AppError::StoreIo(_)));
    }
}
