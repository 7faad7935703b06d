// Document paths: namespace layout and validation.

pub mod layout;
pub mod validate;

pub use layout::{
    author_of, display_name_path, is_display_name_path, is_ephemeral, is_log_path, log_path,
    message_path, APP_NAMESPACE, FIREPLACE_NAMESPACE,
};
pub use validate::{validate_path, PathError, MAX_PATH_CHARS};
