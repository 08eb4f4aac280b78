use crate::core::cap::compute_cap;
use crate::core::projection::{project, Projection};
use crate::core::store::UniqueModuleList;
use crate::domain::goal::CapGoal;
use crate::domain::model::{Code, Grade, GradeValue, Module, ModuleId, Semester, Year};
use crate::domain::ports::{TranscriptSnapshot, SNAPSHOT_VERSION};
use crate::utils::error::{CapError, Result};
use chrono::Utc;

/// A student's record: the module list, the CAP goal, and the CAP derived from them.
///
/// Every mutation recomputes target grades and CAP before it returns, so the
/// cached CAP and the goal's feasibility always describe the current modules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    modules: UniqueModuleList,
    goal: CapGoal,
    current_cap: f64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a transcript from saved state, re-checking uniqueness and recomputing.
    pub fn from_snapshot(snapshot: TranscriptSnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CapError::InvalidValue {
                field: "version".to_string(),
                value: snapshot.version.to_string(),
                reason: format!("Only snapshot version {} is supported", SNAPSHOT_VERSION),
            });
        }
        let mut transcript = Self::new();
        transcript.modules.set_modules(snapshot.modules)?;
        transcript.goal = snapshot.goal;
        transcript.recompute();
        Ok(transcript)
    }

    pub fn to_snapshot(&self) -> TranscriptSnapshot {
        TranscriptSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            modules: self.modules.as_slice().to_vec(),
            goal: self.goal,
        }
    }

    /// Replaces every module at once; `modules` must not contain duplicates.
    pub fn set_modules(&mut self, modules: Vec<Module>) -> Result<()> {
        self.modules.set_modules(modules)?;
        self.recompute();
        Ok(())
    }

    pub fn has_module(&self, id: &ModuleId) -> bool {
        self.modules.contains(id)
    }

    pub fn has_multiple_instances(&self, code: &Code) -> bool {
        self.modules.count_by_code(code) > 1
    }

    pub fn find_module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.find(id)
    }

    pub fn find_module_by_code(&self, code: &Code) -> Option<&Module> {
        self.modules.find_by_code(code)
    }

    /// Every module with `code`, narrowed by year and semester when given.
    /// Deciding what to do with several matches is up to the caller.
    pub fn matching_modules(
        &self,
        code: &Code,
        year: Option<Year>,
        semester: Option<Semester>,
    ) -> Vec<&Module> {
        self.modules.matching(code, year, semester)
    }

    pub fn add_module(&mut self, module: Module) -> Result<()> {
        tracing::debug!("Adding module {}", module);
        self.modules.add(module)?;
        self.recompute();
        Ok(())
    }

    pub fn update_module(&mut self, target: &ModuleId, edited: Module) -> Result<()> {
        tracing::debug!("Updating module {} -> {}", target, edited);
        self.modules.replace(target, edited)?;
        self.recompute();
        Ok(())
    }

    pub fn remove_module(&mut self, id: &ModuleId) -> Result<Module> {
        let removed = self.modules.remove(id)?;
        tracing::debug!("Removed module {}", removed);
        self.recompute();
        Ok(removed)
    }

    pub fn remove_modules_where<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(&Module) -> bool,
    {
        let removed = self.modules.remove_where(predicate);
        tracing::debug!("Removed {} modules by predicate", removed);
        self.recompute();
        removed
    }

    /// Sets a planned grade on a module that has no final result yet.
    pub fn adjust_module(&mut self, target: &ModuleId, grade: GradeValue) -> Result<Module> {
        let current = self
            .modules
            .find(target)
            .ok_or_else(|| CapError::ModuleNotFound {
                id: target.to_string(),
            })?;
        if current.has_completed() {
            return Err(CapError::ModuleCompleted {
                id: target.to_string(),
            });
        }

        let adjusted = current.with_grade(Grade::Adjusted(grade));
        self.modules.replace(target, adjusted.clone())?;
        tracing::debug!("Adjusted module {}", adjusted);
        self.recompute();
        Ok(adjusted)
    }

    /// Always succeeds; whether the goal is reachable shows up in `is_goal_impossible`.
    pub fn set_goal(&mut self, value: f64) {
        tracing::debug!("Setting CAP goal to {:.2}", value);
        self.goal = CapGoal::new(value);
        self.recompute();
    }

    pub fn clear_goal(&mut self) {
        tracing::debug!("Clearing CAP goal");
        self.goal = CapGoal::Unset;
        self.recompute();
    }

    pub fn cap(&self) -> f64 {
        self.current_cap
    }

    pub fn goal(&self) -> CapGoal {
        self.goal
    }

    pub fn is_goal_impossible(&self) -> bool {
        self.goal.is_impossible()
    }

    pub fn modules(&self) -> &[Module] {
        self.modules.as_slice()
    }

    pub fn completed_modules(&self) -> impl Iterator<Item = &Module> + Clone + '_ {
        self.modules.filtered(Module::has_completed)
    }

    pub fn incomplete_modules(&self) -> impl Iterator<Item = &Module> + Clone + '_ {
        self.modules.filtered(|m: &Module| !m.has_completed())
    }

    pub fn targeted_modules(&self) -> impl Iterator<Item = &Module> + Clone + '_ {
        self.modules.filtered(Module::is_targeted)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn recompute(&mut self) {
        self.update_target_grades();
        self.current_cap = compute_cap(self.modules.iter());
        tracing::debug!(
            cap = self.current_cap,
            targeted = self.modules.filtered(Module::is_targeted).count(),
            "Recomputed transcript: {}",
            self.goal
        );
    }

    fn update_target_grades(&mut self) {
        let Some(goal) = self.goal.value() else {
            self.clear_target_grades();
            return;
        };

        match project(self.modules.as_slice(), goal) {
            Projection::Feasible(targeted) => {
                self.goal = self.goal.with_feasibility(true);
                self.swap_targetable(targeted);
            }
            Projection::Infeasible => {
                self.goal = self.goal.with_feasibility(false);
                self.clear_target_grades();
            }
        }
    }

    /// Reverts projected grades so no stale target outlives the goal that produced it.
    fn clear_target_grades(&mut self) {
        let reverted: Vec<Module> = self
            .modules
            .filtered(Module::is_targeted)
            .map(|m| m.with_grade(Grade::Ungraded))
            .collect();
        if !reverted.is_empty() {
            self.swap(Module::is_targeted, reverted);
        }
    }

    fn swap_targetable(&mut self, replacements: Vec<Module>) {
        self.swap(Module::is_targetable, replacements);
    }

    /// Replacements are derived one-to-one from the entries they replace, so
    /// identities cannot collide.
    fn swap(&mut self, predicate: fn(&Module) -> bool, replacements: Vec<Module>) {
        let replaced = self.modules.replace_where(predicate, replacements);
        debug_assert!(
            replaced.is_ok(),
            "target grade replacement collided: {:?}",
            replaced
        );
    }
}

impl std::fmt::Display for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} modules, CAP {:.2}, {}", self.len(), self.cap(), self.goal)
    }
}
