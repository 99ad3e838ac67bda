//! String key/value persistence, the desktop counterpart of browser local storage.

use anyhow::Context;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Key holding the serialized template.
pub const TEMPLATE_KEY: &str = "template";
/// Key holding the icon-scale preset name.
pub const ICON_SCALE_KEY: &str = "iconScale";

/// Plain string storage. A missing key is `Ok(None)`, never an error.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&mut self, key: &str) -> anyhow::Result<()>;
}

/// One file per key inside a directory.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create storage dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.txt"))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.key_path(key);
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.key_path(key);
        std::fs::write(&path, value).with_context(|| format!("write {}", path.display()))
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        let path = self.key_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }
}

/// In-process storage. Clones share the same entries, so a test can keep a
/// handle and inspect what the store wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clones_share_entries() -> anyhow::Result<()> {
        let handle = MemoryStorage::new();
        let mut writer = handle.clone();
        writer.set(TEMPLATE_KEY, "{}")?;
        assert_eq!(handle.get(TEMPLATE_KEY)?.as_deref(), Some("{}"));
        writer.remove(TEMPLATE_KEY)?;
        assert_eq!(handle.get(TEMPLATE_KEY)?, None);
        Ok(())
    }

    #[test]
    fn file_storage_round_trips_and_tolerates_missing_keys() -> anyhow::Result<()> {
        let name = format!("stockpiler-test-{}", crate::model::generate_id());
        let dir = std::env::temp_dir().join(name);
        let mut storage = FileStorage::open(&dir)?;
        assert_eq!(storage.dir(), dir.as_path());
        assert_eq!(storage.get(ICON_SCALE_KEY)?, None);
        storage.set(ICON_SCALE_KEY, "large")?;
        assert_eq!(storage.get(ICON_SCALE_KEY)?.as_deref(), Some("large"));
        storage.remove(ICON_SCALE_KEY)?;
        storage.remove(ICON_SCALE_KEY)?;
        assert_eq!(storage.get(ICON_SCALE_KEY)?, None);
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
