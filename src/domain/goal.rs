use serde::{Deserialize, Serialize};
use std::fmt;

/// The user's target CAP.
///
/// Starts `Unset`. Once set, only an explicit clear returns it to `Unset`; every
/// recompute in between re-derives `impossible` from the current modules.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CapGoal {
    #[default]
    Unset,
    Set { value: f64, impossible: bool },
}

impl CapGoal {
    /// A freshly set goal is assumed possible until the next recompute says otherwise.
    pub fn new(value: f64) -> Self {
        CapGoal::Set {
            value,
            impossible: false,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, CapGoal::Set { .. })
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            CapGoal::Set { value, .. } => Some(*value),
            CapGoal::Unset => None,
        }
    }

    /// Always `false` while unset.
    pub fn is_impossible(&self) -> bool {
        matches!(
            self,
            CapGoal::Set {
                impossible: true,
                ..
            }
        )
    }

    pub fn with_feasibility(self, feasible: bool) -> Self {
        match self {
            CapGoal::Set { value, .. } => CapGoal::Set {
                value,
                impossible: !feasible,
            },
            CapGoal::Unset => CapGoal::Unset,
        }
    }
}

impl fmt::Display for CapGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapGoal::Unset => f.write_str("no goal set"),
            CapGoal::Set {
                value,
                impossible: false,
            } => write!(f, "goal {:.2}", value),
            CapGoal::Set {
                value,
                impossible: true,
            } => write!(f, "goal {:.2} (impossible)", value),
        }
    }
}
