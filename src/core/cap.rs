use crate::domain::model::Module;

/// Modules that count toward CAP: completed with a letter grade.
pub fn is_graded(module: &Module) -> bool {
    module.has_completed() && module.affects_cap()
}

/// Planned grades the user set by hand that would count toward CAP.
pub fn is_graded_adjusted(module: &Module) -> bool {
    module.is_adjusted() && module.affects_cap()
}

pub fn total_credit<'a, I>(modules: I) -> f64
where
    I: IntoIterator<Item = &'a Module>,
{
    modules.into_iter().map(Module::weight).sum()
}

pub fn total_point<'a, I>(modules: I) -> f64
where
    I: IntoIterator<Item = &'a Module>,
{
    modules.into_iter().map(Module::weighted_point).sum()
}

/// Credit-weighted average over completed, CAP-affecting modules.
///
/// Returns `0.0` when no such module carries any credit.
pub fn compute_cap<'a, I>(modules: I) -> f64
where
    I: IntoIterator<Item = &'a Module>,
{
    let (points, credits) = modules
        .into_iter()
        .filter(|m| is_graded(m))
        .fold((0.0, 0.0), |(points, credits), m| {
            (points + m.weighted_point(), credits + m.weight())
        });

    if credits > 0.0 {
        points / credits
    } else {
        0.0
    }
}
