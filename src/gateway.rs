//! Whole-document persistence for [`PortalSettings`].
//!
//! A gateway either returns the full document or fails; a failed save never
//! touches the caller's copy.

use crate::dashboard::config::PortalSettings;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub trait PersistenceGateway: Send + Sync {
    fn load(&self) -> Result<PortalSettings>;

    /// Overwrite the stored document with `settings`.
    fn save(&self, settings: &PortalSettings) -> Result<()>;
}

/// Stores the document as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct FileGateway {
    path: PathBuf,
}

impl FileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceGateway for FileGateway {
    /// A missing or empty file is a first visit: the default document is
    /// written and returned.
    fn load(&self) -> Result<PortalSettings> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("read portal settings {}", self.path.display()))
            }
        };
        if content.trim().is_empty() {
            tracing::info!(path = %self.path.display(), "creating default portal settings");
            let settings = PortalSettings::default();
            self.save(&settings)?;
            return Ok(settings);
        }
        PortalSettings::from_json(&content)
            .with_context(|| format!("parse portal settings {}", self.path.display()))
    }

    fn save(&self, settings: &PortalSettings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create settings folder {}", parent.display()))?;
        }
        let json = settings
            .to_json_pretty()
            .context("serialize portal settings")?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace portal settings {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "portal settings saved");
        Ok(())
    }
}

/// In-process store with switchable failures.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    stored: Mutex<Option<PortalSettings>>,
    fail_load: AtomicBool,
    fail_save: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryGateway {
    pub fn new(settings: PortalSettings) -> Self {
        Self {
            stored: Mutex::new(Some(settings)),
            ..Self::default()
        }
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<PortalSettings> {
        self.stored.lock().ok().and_then(|s| s.clone())
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load(&self) -> Result<PortalSettings> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(anyhow!("settings service unavailable"));
        }
        let mut stored = self
            .stored
            .lock()
            .map_err(|_| anyhow!("settings store poisoned"))?;
        Ok(stored.get_or_insert_with(PortalSettings::default).clone())
    }

    fn save(&self, settings: &PortalSettings) -> Result<()> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(anyhow!("settings service rejected the update"));
        }
        let mut stored = self
            .stored
            .lock()
            .map_err(|_| anyhow!("settings store poisoned"))?;
        *stored = Some(settings.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
