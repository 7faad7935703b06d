// Turning user input into store writes.
//
// Composition is pure: it decides what to write and rejects bad input
// before anything reaches the store.

use thiserror::Error;
use twodays_common::command::{interpret, is_blank, Command};
use twodays_common::path::{display_name_path, log_path, message_path};
use twodays_common::time::{Millis, HORIZON, LOG_BURN};
use twodays_common::types::DocumentWrite;

use crate::store::StoreError;

/// Content of a log document.
pub const LOG_CONTENT: &str = "log";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("message is empty")]
    Empty,

    #[error("sign in to participate")]
    Anonymous,

    #[error("your log is still burning")]
    LogAlreadyBurning,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Writes for a chat submission by `author` at `now`.
///
/// The message itself expires after two days. `/nick <name>` also writes
/// the permanent display-name document.
pub fn compose_message(
    author: &str,
    input: &str,
    now: Millis,
) -> Result<Vec<DocumentWrite>, SubmitError> {
    if is_blank(input) {
        return Err(SubmitError::Empty);
    }

    let content = input.trim().to_string();
    let mut writes = Vec::with_capacity(2);

    if let Command::Rename(name) = interpret(&content) {
        if !name.is_empty() {
            writes.push(DocumentWrite {
                path: display_name_path(author),
                content: name,
                delete_after: None,
            });
        }
    }

    writes.push(DocumentWrite {
        path: message_path(author, now),
        content,
        delete_after: Some((now + HORIZON).to_micros()),
    });
    Ok(writes)
}

/// Write for the display-name document chosen when creating an identity.
pub fn compose_display_name(author: &str, name: &str) -> Option<DocumentWrite> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(DocumentWrite {
        path: display_name_path(author),
        content: name.to_string(),
        delete_after: None,
    })
}

/// Write for a log thrown on the fire, burning for one hour.
pub fn compose_log(author: &str, now: Millis) -> DocumentWrite {
    DocumentWrite {
        path: log_path(author),
        content: LOG_CONTENT.to_string(),
        delete_after: Some((now + LOG_BURN).to_micros()),
    }
}
