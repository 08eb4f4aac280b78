use crate::core::{TranscriptSnapshot, TranscriptStorage};
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Keeps the transcript as a JSON file on local disk.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    data_file: PathBuf,
    pretty: bool,
}

impl LocalStorage {
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
            pretty: true,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }
}

impl TranscriptStorage for LocalStorage {
    fn load(&self) -> Result<Option<TranscriptSnapshot>> {
        if !self.data_file.exists() {
            tracing::debug!("No data file at {}", self.data_file.display());
            return Ok(None);
        }

        let data = fs::read(&self.data_file)?;
        let snapshot: TranscriptSnapshot = serde_json::from_slice(&data)?;
        tracing::debug!(
            "Loaded {} modules from {}",
            snapshot.modules.len(),
            self.data_file.display()
        );
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &TranscriptSnapshot) -> Result<()> {
        if let Some(parent) = self.data_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = if self.pretty {
            serde_json::to_vec_pretty(snapshot)?
        } else {
            serde_json::to_vec(snapshot)?
        };
        fs::write(&self.data_file, data)?;
        tracing::debug!(
            "Saved {} modules to {}",
            snapshot.modules.len(),
            self.data_file.display()
        );
        Ok(())
    }
}
