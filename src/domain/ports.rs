use crate::domain::goal::CapGoal;
use crate::domain::model::Module;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to rebuild a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub modules: Vec<Module>,
    #[serde(default)]
    pub goal: CapGoal,
}

pub trait TranscriptStorage {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<TranscriptSnapshot>>;
    fn save(&self, snapshot: &TranscriptSnapshot) -> Result<()>;
}
