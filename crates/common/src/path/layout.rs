// Path layout for the twodays namespaces.
//
// /twodays-v1.0/~<author>/<millis>.txt!      chat line, expires after two days
// /twodays-v1.0/~<author>/characterName.txt  display name, permanent
// /fireplace/~<author>/!log.log              fire log, expires after one hour

use crate::time::Millis;

pub const APP_NAMESPACE: &str = "/twodays-v1.0/";
pub const FIREPLACE_NAMESPACE: &str = "/fireplace/";

const DISPLAY_NAME_FILE: &str = "characterName.txt";
const LOG_SUFFIX: &str = ".log";

pub fn message_path(author: &str, written_at: Millis) -> String {
    format!("{APP_NAMESPACE}~{author}/{}.txt!", written_at.0)
}

pub fn display_name_path(author: &str) -> String {
    format!("{APP_NAMESPACE}~{author}/{DISPLAY_NAME_FILE}")
}

pub fn log_path(author: &str) -> String {
    format!("{FIREPLACE_NAMESPACE}~{author}/!log{LOG_SUFFIX}")
}

pub fn is_display_name_path(path: &str) -> bool {
    path.ends_with(DISPLAY_NAME_FILE)
}

pub fn is_log_path(path: &str) -> bool {
    path.starts_with(FIREPLACE_NAMESPACE) && path.ends_with(LOG_SUFFIX)
}

/// Paths containing `!` hold documents that must carry `deleteAfter`.
pub fn is_ephemeral(path: &str) -> bool {
    path.contains('!')
}

/// The author owning a `~<author>` scope segment, if the path has one.
pub fn author_of(path: &str) -> Option<&str> {
    path.split('/').find_map(|segment| segment.strip_prefix('~')).filter(|a| !a.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_namespaced_paths() {
        assert_eq!(
            message_path("@suzy.b123", Millis(1_700_000_000_000)),
            "/twodays-v1.0/~@suzy.b123/1700000000000.txt!"
        );
        assert_eq!(display_name_path("@suzy.b123"), "/twodays-v1.0/~@suzy.b123/characterName.txt");
        assert_eq!(log_path("@suzy.b123"), "/fireplace/~@suzy.b123/!log.log");
    }

    #[test]
    fn classifies_paths() {
        assert!(is_display_name_path(&display_name_path("@suzy.b123")));
        assert!(is_log_path(&log_path("@suzy.b123")));
        assert!(!is_log_path("/twodays-v1.0/~@suzy.b123/x.log"));
        assert!(is_ephemeral(&message_path("@suzy.b123", Millis(1))));
        assert!(!is_ephemeral(&display_name_path("@suzy.b123")));
    }

    #[test]
    fn extracts_author_scope() {
        assert_eq!(author_of("/fireplace/~@suzy.b123/!log.log"), Some("@suzy.b123"));
        assert_eq!(author_of("/fireplace/shared.log"), None);
        assert_eq!(author_of("/fireplace/~/x"), None);
    }
}
