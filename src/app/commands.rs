use crate::app::export::export_csv;
use crate::core::transcript::Transcript;
use crate::domain::model::{Code, Grade, GradeValue, Module, ModulePatch, Semester, Year};
use crate::utils::error::{CapError, Result};
use std::fmt;
use std::path::PathBuf;

/// Picks modules by code, narrowed by year and semester when given.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSelector {
    pub code: Code,
    pub year: Option<Year>,
    pub semester: Option<Semester>,
}

impl fmt::Display for ModuleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(year) = self.year {
            write!(f, " year {}", year)?;
        }
        if let Some(semester) = self.semester {
            write!(f, " semester {}", semester)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    #[default]
    All,
    Completed,
    Incomplete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(Module),
    Edit {
        target: ModuleSelector,
        patch: ModulePatch,
    },
    Remove(ModuleSelector),
    Adjust {
        target: ModuleSelector,
        grade: GradeValue,
    },
    SetGoal(f64),
    ClearGoal,
    Cap,
    List(ListFilter),
    Export(PathBuf),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Add(_) => "add",
            Command::Edit { .. } => "edit",
            Command::Remove(_) => "remove",
            Command::Adjust { .. } => "adjust",
            Command::SetGoal(_) | Command::ClearGoal => "goal",
            Command::Cap => "cap",
            Command::List(_) => "list",
            Command::Export(_) => "export",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub message: String,
    /// Whether the transcript changed and should be saved.
    pub mutated: bool,
}

impl CommandOutcome {
    fn changed(message: String) -> Self {
        Self {
            message,
            mutated: true,
        }
    }

    fn unchanged(message: String) -> Self {
        Self {
            message,
            mutated: false,
        }
    }
}

pub struct CommandExecutor {
    cap_precision: usize,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new(2)
    }
}

impl CommandExecutor {
    pub fn new(cap_precision: usize) -> Self {
        Self { cap_precision }
    }

    pub fn execute(&self, command: &Command, transcript: &mut Transcript) -> Result<CommandOutcome> {
        tracing::debug!("Executing {} command", command.name());
        let outcome = match command {
            Command::Add(module) => {
                transcript.add_module(module.clone())?;
                CommandOutcome::changed(self.with_goal_note(
                    format!("Added module: {}", module),
                    transcript,
                ))
            }
            Command::Edit { target, patch } => {
                let edited = edit_module(transcript, target, patch)?;
                CommandOutcome::changed(self.with_goal_note(
                    format!("Edited module: {}", edited),
                    transcript,
                ))
            }
            Command::Remove(target) => {
                let module = resolve(transcript, target)?;
                let removed = transcript.remove_module(&module.id())?;
                CommandOutcome::changed(self.with_goal_note(
                    format!("Removed module: {}", removed),
                    transcript,
                ))
            }
            Command::Adjust { target, grade } => {
                let module = resolve(transcript, target)?;
                let adjusted = transcript.adjust_module(&module.id(), *grade)?;
                CommandOutcome::changed(self.with_goal_note(
                    format!("Adjusted module: {}", adjusted),
                    transcript,
                ))
            }
            Command::SetGoal(value) => {
                transcript.set_goal(*value);
                CommandOutcome::changed(self.with_goal_note(
                    format!("CAP goal set to {:.prec$}", value, prec = self.cap_precision),
                    transcript,
                ))
            }
            Command::ClearGoal => {
                transcript.clear_goal();
                CommandOutcome::changed("CAP goal cleared".to_string())
            }
            Command::Cap => CommandOutcome::unchanged(self.cap_report(transcript)),
            Command::List(filter) => CommandOutcome::unchanged(self.list(transcript, *filter)),
            Command::Export(path) => {
                let rows = export_csv(transcript.modules(), path)?;
                CommandOutcome::unchanged(format!(
                    "Exported {} modules to {}",
                    rows,
                    path.display()
                ))
            }
        };
        Ok(outcome)
    }

    pub fn cap_report(&self, transcript: &Transcript) -> String {
        let mut report = format!(
            "Your current CAP is: {:.prec$}",
            transcript.cap(),
            prec = self.cap_precision
        );
        if let Some(goal) = transcript.goal().value() {
            let verdict = if transcript.is_goal_impossible() {
                "not reachable with the remaining modules"
            } else {
                "reachable"
            };
            report.push_str(&format!(
                "\nCAP goal {:.prec$} is {}",
                goal,
                verdict,
                prec = self.cap_precision
            ));
        }
        report
    }

    fn list(&self, transcript: &Transcript, filter: ListFilter) -> String {
        let modules: Vec<&Module> = match filter {
            ListFilter::All => transcript.modules().iter().collect(),
            ListFilter::Completed => transcript.completed_modules().collect(),
            ListFilter::Incomplete => transcript.incomplete_modules().collect(),
        };
        if modules.is_empty() {
            return "No modules".to_string();
        }
        let mut lines: Vec<String> = modules.iter().map(|m| m.to_string()).collect();
        lines.push(self.cap_report(transcript));
        lines.join("\n")
    }

    fn with_goal_note(&self, message: String, transcript: &Transcript) -> String {
        if transcript.is_goal_impossible() {
            format!("{}\nWarning: CAP goal is no longer reachable", message)
        } else {
            message
        }
    }
}

/// Resolves `selector` to exactly one module.
///
/// Several matches without enough year/semester detail is an error, never a guess.
pub fn resolve(transcript: &Transcript, selector: &ModuleSelector) -> Result<Module> {
    let matches = transcript.matching_modules(&selector.code, selector.year, selector.semester);
    match matches.as_slice() {
        [] => Err(CapError::ModuleNotFound {
            id: selector.to_string(),
        }),
        [module] => Ok((*module).clone()),
        many => Err(CapError::AmbiguousModule {
            code: selector.code.to_string(),
            count: many.len(),
        }),
    }
}

fn edit_module(
    transcript: &mut Transcript,
    selector: &ModuleSelector,
    patch: &ModulePatch,
) -> Result<Module> {
    let target = resolve(transcript, selector)?;
    let target_id = target.id();

    if !target.has_completed() && patch.grade.is_some() {
        return Err(CapError::IncompleteGradeChange {
            id: target_id.to_string(),
        });
    }

    let edited = target.patched(patch);
    if patch.changes_identity() && edited.id() != target_id && transcript.has_module(&edited.id())
    {
        return Err(CapError::DuplicateModule {
            id: edited.id().to_string(),
        });
    }
    if edited == target {
        return Err(CapError::NoChanges {
            id: target_id.to_string(),
        });
    }

    transcript.update_module(&target_id, edited.clone())?;
    Ok(edited)
}

/// Builds the grade an `add` or `edit` stores for a user-entered result.
pub fn completed_grade(value: Option<GradeValue>) -> Grade {
    value.map_or(Grade::Ungraded, Grade::Completed)
}
