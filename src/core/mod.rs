pub mod cap;
pub mod projection;
pub mod store;
pub mod transcript;

pub use crate::domain::goal::CapGoal;
pub use crate::domain::model::{Grade, Module, ModuleId};
pub use crate::domain::ports::{TranscriptSnapshot, TranscriptStorage};
pub use crate::utils::error::Result;
