// Document → render-ready message record.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use twodays_common::command::{interpret, Command};
use twodays_common::time::{Micros, Millis};
use twodays_common::types::Document;

use super::identicon::IdenticonCache;
use crate::engine::expiry::classify;

/// Cosmetic per-author style buckets.
pub const STYLE_CLASSES: [&str; 6] =
    ["author-a", "author-b", "author-c", "author-d", "author-e", "author-f"];

/// How `/nick` lines show up in the message list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameDisplay {
    /// Hidden from the list.
    #[default]
    Suppress,
    /// Shown as a system notice.
    Notice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Speech,
    Action,
    Describe,
    Rename,
    Suppressed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRecord {
    pub path: String,
    pub author: String,
    pub timestamp: Micros,
    pub display_name: String,
    pub style_class: &'static str,
    pub kind: ViewKind,
    /// Command payload: spoken words, action, narration or the new name.
    pub text: String,
    pub identicon: String,
    pub visibility_weight: f64,
    pub is_expired: bool,
}

impl ViewRecord {
    /// Plain-text rendering of the line, `None` when suppressed.
    pub fn line(&self) -> Option<String> {
        match self.kind {
            ViewKind::Speech => {
                Some(format!("{} says \u{201c}{}\u{201d}", self.display_name, self.text))
            }
            ViewKind::Action => Some(format!("{} {}", self.display_name, self.text)),
            ViewKind::Describe => Some(self.text.clone()),
            ViewKind::Rename => {
                Some(format!("{} is now known as {}", short_label(&self.author), self.text))
            }
            ViewKind::Suppressed => None,
        }
    }
}

/// Builds view records; owns the identicon cache for the session.
#[derive(Debug, Default)]
pub struct Projector {
    identicons: IdenticonCache,
    rename_display: RenameDisplay,
    identicon_salt: String,
}

impl Projector {
    pub fn new(rename_display: RenameDisplay) -> Self {
        Self { rename_display, ..Self::default() }
    }

    /// Salt identicons with the viewer's secret so they differ per viewer.
    pub fn set_identicon_salt(&mut self, salt: impl Into<String>) {
        self.identicon_salt = salt.into();
    }

    pub fn identicons(&self) -> &IdenticonCache {
        &self.identicons
    }

    pub fn project(&mut self, doc: &Document, display_name: &str, now: Millis) -> ViewRecord {
        let classification = classify(doc, now);
        let (kind, text) = match interpret(&doc.content) {
            Command::Speech(text) => (ViewKind::Speech, text),
            Command::Action(text) => (ViewKind::Action, text),
            Command::Describe(text) => (ViewKind::Describe, text),
            Command::Rename(name) => match self.rename_display {
                RenameDisplay::Suppress => (ViewKind::Suppressed, name),
                RenameDisplay::Notice => (ViewKind::Rename, name),
            },
        };
        let seed = format!("{}{}", doc.author, self.identicon_salt);

        ViewRecord {
            path: doc.path.clone(),
            author: doc.author.clone(),
            timestamp: doc.timestamp,
            display_name: display_name.to_string(),
            style_class: style_class(&doc.author),
            kind,
            text,
            identicon: self.identicons.data_uri(&seed),
            visibility_weight: classification.visibility_weight,
            is_expired: classification.is_expired,
        }
    }
}

/// Display label: the author's name document if it has content, otherwise
/// a short label derived from the address.
pub fn resolve_display_name(author: &str, name_doc: Option<&Document>) -> String {
    match name_doc {
        Some(doc) if !doc.content.trim().is_empty() => doc.content.clone(),
        _ => short_label(author),
    }
}

/// `@suzy.bjzee56v2hd` → `@suzy.bjze`; anything else is cut to 10 chars.
pub fn short_label(author: &str) -> String {
    match author.split_once('.') {
        Some((name, key)) if name.starts_with('@') => {
            format!("{name}.{}", key.chars().take(4).collect::<String>())
        }
        _ => author.chars().take(10).collect(),
    }
}

pub fn style_class(author: &str) -> &'static str {
    let digest = Sha256::digest(author.as_bytes());
    let bucket = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize;
    STYLE_CLASSES[bucket % STYLE_CLASSES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: i64 = 1_700_000_000_000_000;

    fn doc(author: &str, content: &str) -> Document {
        Document {
            path: format!("/twodays-v1.0/~{author}/1.txt!"),
            author: author.into(),
            content: content.into(),
            timestamp: Micros(T),
            delete_after: None,
        }
    }

    fn now() -> Millis {
        Micros(T).to_millis() + Millis(5_000)
    }

    #[test]
    fn speech_record() {
        let mut projector = Projector::new(RenameDisplay::Suppress);
        let record = projector.project(&doc("@suzy.bjzee", "hello"), "Suzy", now());

        assert_eq!(record.kind, ViewKind::Speech);
        assert_eq!(record.text, "hello");
        assert_eq!(record.visibility_weight, 1.0);
        assert!(!record.is_expired);
        assert_eq!(record.line().as_deref(), Some("Suzy says \u{201c}hello\u{201d}"));
    }

    #[test]
    fn action_and_describe_records() {
        let mut projector = Projector::new(RenameDisplay::Suppress);

        let action = projector.project(&doc("@suzy.bjzee", "/me sips cocoa"), "Suzy", now());
        assert_eq!(action.kind, ViewKind::Action);
        assert_eq!(action.line().as_deref(), Some("Suzy sips cocoa"));

        let describe = projector.project(&doc("@suzy.bjzee", "/describe Snow."), "Suzy", now());
        assert_eq!(describe.kind, ViewKind::Describe);
        assert_eq!(describe.line().as_deref(), Some("Snow."));
    }

    #[test]
    fn rename_follows_display_variant() {
        let mut hidden = Projector::new(RenameDisplay::Suppress);
        let record = hidden.project(&doc("@suzy.bjzee", "/nick Holly"), "Holly", now());
        assert_eq!(record.kind, ViewKind::Suppressed);
        assert_eq!(record.line(), None);

        let mut shown = Projector::new(RenameDisplay::Notice);
        let record = shown.project(&doc("@suzy.bjzee", "/nick Holly"), "Holly", now());
        assert_eq!(record.kind, ViewKind::Rename);
        assert_eq!(record.line().as_deref(), Some("@suzy.bjze is now known as Holly"));
    }

    #[test]
    fn display_name_prefers_non_empty_name_doc() {
        let name_doc = doc("@suzy.bjzee", "Suzy");
        assert_eq!(resolve_display_name("@suzy.bjzee", Some(&name_doc)), "Suzy");

        let blank = doc("@suzy.bjzee", "  ");
        assert_eq!(resolve_display_name("@suzy.bjzee", Some(&blank)), "@suzy.bjze");
        assert_eq!(resolve_display_name("@suzy.bjzee", None), "@suzy.bjze");
    }

    #[test]
    fn short_label_falls_back_to_prefix() {
        assert_eq!(short_label("@ab.c"), "@ab.c");
        assert_eq!(short_label("plainaddress123"), "plainaddre");
    }

    #[test]
    fn style_class_is_stable_per_author() {
        for author in ["@suzy.b1", "@bobb.b2", "@carl.b3"] {
            let class = style_class(author);
            assert!(STYLE_CLASSES.contains(&class));
            assert_eq!(class, style_class(author));
        }
    }

    #[test]
    fn identicon_is_salted_and_cached() {
        let mut projector = Projector::new(RenameDisplay::Suppress);
        let plain = projector.project(&doc("@suzy.b1", "hi"), "Suzy", now()).identicon;

        projector.set_identicon_salt("viewer-secret");
        let salted = projector.project(&doc("@suzy.b1", "hi"), "Suzy", now()).identicon;
        let again = projector.project(&doc("@suzy.b1", "yo"), "Suzy", now()).identicon;

        assert_ne!(plain, salted);
        assert_eq!(salted, again);
        assert_eq!(projector.identicons().len(), 2);
    }
}
