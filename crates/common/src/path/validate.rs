// Path validation: leading slash, printable ASCII, no empty segments, 512 char max.

use thiserror::Error;

/// Maximum allowed path length in characters.
pub const MAX_PATH_CHARS: usize = 512;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path must start with `/`")]
    MissingLeadingSlash,

    #[error("path exceeds maximum length of {MAX_PATH_CHARS} characters")]
    TooLong,

    #[error("path contains an empty segment")]
    EmptySegment,

    #[error("path contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Validate a document path.
///
/// Rules:
/// - Must start with `/` and must not end with `/`
/// - No empty segments (`//`)
/// - Printable ASCII only, no spaces
/// - At most 512 characters
pub fn validate_path(path: &str) -> Result<(), PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    if !path.starts_with('/') {
        return Err(PathError::MissingLeadingSlash);
    }

    if path.chars().count() > MAX_PATH_CHARS {
        return Err(PathError::TooLong);
    }

    if let Some(bad) = path.chars().find(|ch| !ch.is_ascii_graphic()) {
        return Err(PathError::InvalidCharacter(bad));
    }

    if path[1..].split('/').any(str::is_empty) {
        return Err(PathError::EmptySegment);
    }

    Ok(())
}
