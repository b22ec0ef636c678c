use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::*;

/// Persistence provider for the single save document.
pub trait SaveStore {
    /// Returns `Ok(None)` when nothing was ever saved.
    fn load(&self) -> Result<Option<SaveData>>;

    /// Replaces the stored document as a whole.
    fn save(&mut self, data: &SaveData) -> Result<()>;
}

/// Stores the document as pretty-printed JSON in one file.
#[derive(Clone, Debug, PartialEq)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub const FILE_NAME: &'static str = "savedata.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default file name inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| Self::FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SaveStore for JsonFileStore {
    fn load(&self) -> Result<Option<SaveData>> {
        if !self.path.exists() {
            log::debug!("No save document at {}", self.path.display());
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&mut self, data: &SaveData) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(data)?;
        // write aside then swap, so a crash never leaves a half-written document
        let temp_path = self.temp_path();
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;
        log::trace!("Saved document to {}", self.path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    data: Option<SaveData>,
    fail_writes: bool,
    writes: usize,
}

/// In-memory store; clones share the same document.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last successfully written document.
    pub fn snapshot(&self) -> Option<SaveData> {
        self.inner.borrow().data.clone()
    }

    /// Makes every following `save` fail with an I/O error until switched back.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> Result<Option<SaveData>> {
        Ok(self.inner.borrow().data.clone())
    }

    fn save(&mut self, data: &SaveData) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_writes {
            return Err(std::io::Error::other("memory store is read-only").into());
        }
        inner.data = Some(data.clone());
        inner.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> SaveData {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut data = SaveData::default();
        data.last_opened_date = Some(date);
        data.last_message_id = Some("3".into());
        data.history.push(HistoryEntry {
            date,
            message_id: "3".into(),
            message_text: "Courage.".into(),
        });
        data.seen_message_ids.insert("3".into());
        data
    }

    #[test]
    fn file_store_reports_absent_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_store_overwrites_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::in_dir(dir.path().join("nested"));

        store.save(&SaveData::default()).unwrap();
        store.save(&sample()).unwrap();

        assert_eq!(store.load().unwrap(), Some(sample()));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn file_store_surfaces_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(CookieError::Json(_))));
    }

    #[test]
    fn memory_store_clones_share_state_and_can_fail() {
        let store = MemoryStore::new();
        let mut writer = store.clone();

        writer.save(&sample()).unwrap();
        assert_eq!(store.snapshot(), Some(sample()));

        store.set_fail_writes(true);
        assert!(matches!(writer.save(&SaveData::default()), Err(CookieError::Io(_))));
        assert_eq!(store.snapshot(), Some(sample()));
        assert_eq!(store.write_count(), 1);
    }
}
