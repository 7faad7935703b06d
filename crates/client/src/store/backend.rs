// Key/value backends for the local mirror.

use std::collections::BTreeMap;

use anyhow::Result;

/// Durable string key/value storage. Each `put` stands alone; there is no
/// atomicity across keys.
pub trait MirrorBackend {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn put(&mut self, key: &str, value: &str) -> Result<()>;

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Process-local backend, for tests and for running without a mirror file.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl MirrorBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self.entries.keys().filter(|key| key.starts_with(prefix)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_overwrites_and_prefix_lists_sorted() {
        let mut backend = MemoryBackend::new();
        backend.put("documents/+b", "1").unwrap();
        backend.put("documents/+a", "2").unwrap();
        backend.put("session/online", "true").unwrap();
        backend.put("documents/+a", "3").unwrap();

        assert_eq!(backend.get("documents/+a").unwrap().as_deref(), Some("3"));
        assert_eq!(backend.get("missing").unwrap(), None);
        assert_eq!(
            backend.keys_with_prefix("documents/").unwrap(),
            vec!["documents/+a".to_string(), "documents/+b".to_string()]
        );
        assert_eq!(backend.len(), 3);
    }
}
