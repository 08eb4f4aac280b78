use thiserror::Error;

#[derive(Error, Debug)]
pub enum CapError {
    #[error("Module already exists: {id}")]
    DuplicateModule { id: String },

    #[error("No such module: {id}")]
    ModuleNotFound { id: String },

    #[error("Module {id} is already completed")]
    ModuleCompleted { id: String },

    #[error("{count} modules share code {code}; year and semester are required")]
    AmbiguousModule { code: String, count: usize },

    #[error("Cannot change grade of incomplete module {id}; use adjust instead")]
    IncompleteGradeChange { id: String },

    #[error("No changes to module {id}")]
    NoChanges { id: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Configuration parse error in {field}: {message}")]
    ConfigParse { field: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Record,
    Command,
    Configuration,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CapError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CapError::DuplicateModule { .. }
            | CapError::ModuleNotFound { .. }
            | CapError::ModuleCompleted { .. } => ErrorCategory::Record,
            CapError::AmbiguousModule { .. }
            | CapError::IncompleteGradeChange { .. }
            | CapError::NoChanges { .. }
            | CapError::InvalidValue { .. } => ErrorCategory::Command,
            CapError::MissingConfig { .. } | CapError::ConfigParse { .. } => {
                ErrorCategory::Configuration
            }
            CapError::Io(_) | CapError::Serialization(_) | CapError::Csv(_) => {
                ErrorCategory::Storage
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            _ if matches!(self, CapError::NoChanges { .. }) => ErrorSeverity::Low,
            ErrorCategory::Record | ErrorCategory::Command => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
            ErrorCategory::Storage => match self {
                CapError::Csv(_) => ErrorSeverity::Medium,
                _ => ErrorSeverity::Critical,
            },
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CapError::DuplicateModule { .. } => {
                "Use a different code, year or semester, or edit the existing module"
            }
            CapError::ModuleNotFound { .. } => "Run `list` to see the modules on record",
            CapError::ModuleCompleted { .. } => {
                "Completed grades are final; use `edit --grade` to correct them"
            }
            CapError::AmbiguousModule { .. } => {
                "Pass --target-year and --target-semester to pick one module"
            }
            CapError::IncompleteGradeChange { .. } => {
                "Use `adjust` to set a planned grade on an incomplete module"
            }
            CapError::NoChanges { .. } => "Nothing to do",
            CapError::InvalidValue { .. } => "Check the value against the command usage",
            CapError::MissingConfig { .. } | CapError::ConfigParse { .. } => {
                "Check the TOML configuration file"
            }
            CapError::Io(_) => "Check that the data file path exists and is writable",
            CapError::Serialization(_) => {
                "The data file is corrupted; restore it or start a new one"
            }
            CapError::Csv(_) => "Check the export path and try again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Storage => format!("Could not access transcript data: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            _ => self.to_string(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, CapError>;
