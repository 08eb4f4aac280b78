use crate::domain::model::{Code, Module, ModuleId, Semester, Year};
use crate::utils::error::{CapError, Result};
use std::collections::HashSet;

/// Insertion-ordered list of modules in which no two entries share a `ModuleId`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniqueModuleList {
    modules: Vec<Module>,
}

impl UniqueModuleList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn as_slice(&self) -> &[Module] {
        &self.modules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Module> {
        self.modules.iter()
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.position(id).is_some()
    }

    pub fn find(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.is_same_module(id))
    }

    /// First entry carrying `code`, in insertion order.
    pub fn find_by_code(&self, code: &Code) -> Option<&Module> {
        self.modules.iter().find(|m| m.code == *code)
    }

    pub fn count_by_code(&self, code: &Code) -> usize {
        self.modules.iter().filter(|m| m.code == *code).count()
    }

    /// All entries matching `code` and whichever of year/semester is given.
    pub fn matching(
        &self,
        code: &Code,
        year: Option<Year>,
        semester: Option<Semester>,
    ) -> Vec<&Module> {
        self.modules
            .iter()
            .filter(|m| m.matches(code, year, semester))
            .collect()
    }

    /// Lazy view over the current contents; clone the iterator to enumerate again.
    pub fn filtered<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Module> + Clone + 'a
    where
        P: Fn(&Module) -> bool + Clone + 'a,
    {
        self.modules.iter().filter(move |m| predicate(*m))
    }

    pub fn add(&mut self, module: Module) -> Result<()> {
        if self.contains(&module.id()) {
            tracing::warn!("Rejected duplicate module {}", module.id());
            return Err(CapError::DuplicateModule {
                id: module.id().to_string(),
            });
        }
        self.modules.push(module);
        Ok(())
    }

    /// Swaps `target` for `replacement` in place, keeping its position.
    pub fn replace(&mut self, target: &ModuleId, replacement: Module) -> Result<()> {
        let index = self
            .position(target)
            .ok_or_else(|| CapError::ModuleNotFound {
                id: target.to_string(),
            })?;

        let replacement_id = replacement.id();
        if replacement_id != *target && self.contains(&replacement_id) {
            tracing::warn!(
                "Rejected replacement of {}: {} already exists",
                target,
                replacement_id
            );
            return Err(CapError::DuplicateModule {
                id: replacement_id.to_string(),
            });
        }

        self.modules[index] = replacement;
        Ok(())
    }

    pub fn remove(&mut self, id: &ModuleId) -> Result<Module> {
        let index = self.position(id).ok_or_else(|| CapError::ModuleNotFound {
            id: id.to_string(),
        })?;
        Ok(self.modules.remove(index))
    }

    /// Removes every entry matching `predicate` and returns how many went.
    pub fn remove_where<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(&Module) -> bool,
    {
        let before = self.modules.len();
        self.modules.retain(|m| !predicate(m));
        before - self.modules.len()
    }

    /// Removes every entry matching `predicate` and appends `replacements`, or
    /// changes nothing if the result would hold a duplicate identity.
    pub fn replace_where<P>(&mut self, predicate: P, replacements: Vec<Module>) -> Result<()>
    where
        P: Fn(&Module) -> bool,
    {
        let mut seen: HashSet<ModuleId> = self
            .modules
            .iter()
            .filter(|m| !predicate(*m))
            .map(Module::id)
            .collect();
        for module in &replacements {
            if !seen.insert(module.id()) {
                return Err(CapError::DuplicateModule {
                    id: module.id().to_string(),
                });
            }
        }

        self.modules.retain(|m| !predicate(m));
        self.modules.extend(replacements);
        Ok(())
    }

    /// Replaces the whole contents; `modules` itself must be free of duplicates.
    pub fn set_modules(&mut self, modules: Vec<Module>) -> Result<()> {
        let mut seen = HashSet::with_capacity(modules.len());
        for module in &modules {
            if !seen.insert(module.id()) {
                return Err(CapError::DuplicateModule {
                    id: module.id().to_string(),
                });
            }
        }
        self.modules = modules;
        Ok(())
    }

    fn position(&self, id: &ModuleId) -> Option<usize> {
        self.modules.iter().position(|m| m.is_same_module(id))
    }
}

impl<'a> IntoIterator for &'a UniqueModuleList {
    type Item = &'a Module;
    type IntoIter = std::slice::Iter<'a, Module>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.iter()
    }
}
