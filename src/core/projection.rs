//! Target-grade projection.
//!
//! Given the current modules and a goal CAP, works out the grade every
//! targetable module needs so the overall average reaches the goal. Modules are
//! filled smallest credit first, each taking the required average rounded up to
//! the next half point, so the small modules absorb the rounding before the
//! large ones are priced.

use crate::core::cap::{is_graded, is_graded_adjusted, total_credit, total_point};
use crate::domain::model::{Grade, Letter, Module, MAX_POINT};

/// Absorbs binary floating-point noise before the half-point ceiling.
const ROUNDING_TOLERANCE: f64 = 1e-9;

/// No letter grade sits between F and D, so any target at or below this is raised to D.
const MIN_TARGET_THRESHOLD: f64 = 0.5;
const MIN_TARGET_POINT: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Infeasible,
    /// Targetable modules carrying their new `Targeted` grades, smallest credit first.
    Feasible(Vec<Module>),
}

/// Runs the full projection over `modules` for the goal CAP `goal`.
pub fn project(modules: &[Module], goal: f64) -> Projection {
    if !goal.is_finite() {
        tracing::debug!("Goal {} is not a finite number", goal);
        return Projection::Infeasible;
    }

    let graded: Vec<&Module> = modules.iter().filter(|m| is_graded(m)).collect();
    let adjusted: Vec<&Module> = modules.iter().filter(|m| is_graded_adjusted(m)).collect();
    let mut targetable: Vec<&Module> = modules.iter().filter(|m| m.is_targetable()).collect();
    // Stable: equal credits keep their store order.
    targetable.sort_by_key(|m| m.credit);

    let targetable_credit = total_credit(targetable.iter().copied());
    let total = total_credit(graded.iter().chain(adjusted.iter()).copied()) + targetable_credit;
    let earned = total_point(graded.iter().chain(adjusted.iter()).copied());

    tracing::debug!(
        graded = graded.len(),
        adjusted = adjusted.len(),
        targetable = targetable.len(),
        total_credit = total,
        earned_points = earned,
        "Projecting goal {:.2}",
        goal
    );

    if targetable_credit == 0.0 {
        return project_without_credit(&targetable, goal, earned, total);
    }

    let remaining_score = goal * total - earned;
    match assign_target_grades(&targetable, remaining_score, targetable_credit) {
        Some(targeted) => Projection::Feasible(targeted),
        None => Projection::Infeasible,
    }
}

/// Nothing left to grade carries credit, so the goal stands or falls on what is already known.
fn project_without_credit(
    targetable: &[&Module],
    goal: f64,
    earned: f64,
    total: f64,
) -> Projection {
    if total == 0.0 {
        return Projection::Infeasible;
    }
    let achieved = earned / total;
    if goal > achieved + ROUNDING_TOLERANCE {
        return Projection::Infeasible;
    }
    // Zero-credit targetable modules cannot move the average. They get no target,
    // and any target from an earlier run is dropped.
    Projection::Feasible(
        targetable
            .iter()
            .map(|m| m.with_grade(Grade::Ungraded))
            .collect(),
    )
}

/// Required grade point for the next module, rounded up to the next half point.
pub fn unit_score(remaining_score: f64, remaining_credit: f64) -> f64 {
    ((remaining_score / remaining_credit * 2.0) - ROUNDING_TOLERANCE).ceil() / 2.0
}

/// Greedy assignment over `sorted`, which must already be in ascending credit order.
///
/// Returns `None` as soon as one module would need more than the maximum grade point.
pub fn assign_target_grades(
    sorted: &[&Module],
    remaining_score: f64,
    remaining_credit: f64,
) -> Option<Vec<Module>> {
    let (targeted, _, _) = sorted.iter().try_fold(
        (Vec::with_capacity(sorted.len()), remaining_score, remaining_credit),
        |(mut targeted, score, credit), module| {
            let mut unit = unit_score(score, credit);
            if unit > MAX_POINT {
                tracing::debug!("{} would need {:.1}; goal unreachable", module.id(), unit);
                return None;
            }
            if unit <= MIN_TARGET_THRESHOLD {
                unit = MIN_TARGET_POINT;
            }
            let letter = Letter::from_point(unit)?;
            targeted.push(module.with_grade(Grade::Targeted(letter)));
            Some((
                targeted,
                score - unit * module.weight(),
                credit - module.weight(),
            ))
        },
    )?;
    Some(targeted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cap::compute_cap;
    use crate::domain::model::{Credit, GradeValue, Semester, Year};

    fn module(code: &str, credit: u32, grade: Grade) -> Module {
        Module::new(
            code.parse().unwrap(),
            Year::try_from(1).unwrap(),
            Semester::One,
            Credit::try_from(credit).unwrap(),
            grade,
        )
    }

    fn done(letter: Letter) -> Grade {
        Grade::Completed(GradeValue::Letter(letter))
    }

    fn three_modules() -> Vec<Module> {
        vec![
            module("CS1010", 4, done(Letter::BPlus)),
            module("CS1231", 4, done(Letter::BMinus)),
            module("CS2040", 4, Grade::Ungraded),
        ]
    }

    fn targets(projection: &Projection) -> Vec<(String, Letter)> {
        match projection {
            Projection::Feasible(modules) => modules
                .iter()
                .map(|m| match m.grade {
                    Grade::Targeted(letter) => (m.code.to_string(), letter),
                    other => panic!("expected a targeted grade, got {:?}", other),
                })
                .collect(),
            Projection::Infeasible => panic!("expected a feasible projection"),
        }
    }

    #[test]
    fn test_unit_score_rounds_up_to_half_points() {
        assert_eq!(unit_score(20.0, 4.0), 5.0);
        assert_eq!(unit_score(27.2, 4.0), 7.0);
        assert_eq!(unit_score(13.0, 4.0), 3.5);
        assert_eq!(unit_score(12.0, 4.0), 3.0);
        assert_eq!(unit_score(-4.0, 4.0), -1.0);
    }

    #[test]
    fn test_goal_reachable_with_top_grade() {
        let projection = project(&three_modules(), 4.0);
        assert_eq!(
            targets(&projection),
            vec![("CS2040".to_string(), Letter::A)]
        );
    }

    #[test]
    fn test_goal_beyond_top_grade_is_infeasible() {
        assert_eq!(project(&three_modules(), 4.6), Projection::Infeasible);
    }

    #[test]
    fn test_low_requirement_is_clamped_to_d() {
        let projection = project(&three_modules(), 1.0);
        assert_eq!(
            targets(&projection),
            vec![("CS2040".to_string(), Letter::D)]
        );
    }

    #[test]
    fn test_smallest_credit_filled_first() {
        let modules = vec![
            module("CS1010", 4, done(Letter::B)),
            module("BIG", 8, Grade::Ungraded),
            module("SMALL", 2, Grade::Ungraded),
            module("MID", 4, Grade::Ungraded),
        ];
        // total 18, earned 14, goal 4.0 -> need 58 over 14 credits
        let projection = project(&modules, 4.0);
        assert_eq!(
            targets(&projection),
            vec![
                ("SMALL".to_string(), Letter::AMinus),
                ("MID".to_string(), Letter::AMinus),
                ("BIG".to_string(), Letter::BPlus),
            ]
        );
    }

    #[test]
    fn test_equal_credits_keep_store_order() {
        let modules = vec![
            module("FIRST", 4, Grade::Ungraded),
            module("SECOND", 4, Grade::Ungraded),
        ];
        let codes: Vec<String> = targets(&project(&modules, 3.0))
            .into_iter()
            .map(|(code, _)| code)
            .collect();
        assert_eq!(codes, vec!["FIRST", "SECOND"]);
    }

    #[test]
    fn test_adjusted_modules_are_fixed_inputs() {
        let modules = vec![
            module("CS1010", 4, Grade::Adjusted(GradeValue::Letter(Letter::A))),
            module("CS2040", 4, Grade::Ungraded),
        ];
        // total 8, earned 20, goal 4.5 -> need 16 over 4 credits
        let projection = project(&modules, 4.5);
        assert_eq!(
            targets(&projection),
            vec![("CS2040".to_string(), Letter::BPlus)]
        );
    }

    #[test]
    fn test_nothing_targetable_compares_against_achieved() {
        let modules = vec![
            module("CS1010", 4, done(Letter::A)),
            module("CS1231", 4, done(Letter::B)),
        ];
        assert_eq!(project(&modules, 4.25), Projection::Feasible(vec![]));
        assert_eq!(project(&modules, 4.0), Projection::Feasible(vec![]));
        assert_eq!(project(&modules, 4.3), Projection::Infeasible);
    }

    #[test]
    fn test_zero_credit_targetable_is_carried_over() {
        let modules = vec![
            module("CS1010", 4, done(Letter::A)),
            module("CFG1002", 0, Grade::Ungraded),
        ];
        assert_eq!(
            project(&modules, 4.0),
            Projection::Feasible(vec![modules[1].clone()])
        );
    }

    #[test]
    fn test_zero_credit_target_from_earlier_run_is_dropped() {
        let modules = vec![
            module("CS1010", 4, done(Letter::A)),
            module("CFG1002", 0, Grade::Targeted(Letter::BMinus)),
        ];
        assert_eq!(
            project(&modules, 4.0),
            Projection::Feasible(vec![modules[1].with_grade(Grade::Ungraded)])
        );
    }

    #[test]
    fn test_non_finite_goal_is_infeasible() {
        let modules = vec![module("CS2040", 4, Grade::Ungraded)];
        assert_eq!(project(&modules, f64::NAN), Projection::Infeasible);
        assert_eq!(project(&modules, f64::INFINITY), Projection::Infeasible);
        assert_eq!(project(&modules, f64::NEG_INFINITY), Projection::Infeasible);
    }

    #[test]
    fn test_no_credit_at_all_is_infeasible() {
        assert_eq!(project(&[], 3.0), Projection::Infeasible);
        let zero_credit = vec![module("CS1010", 0, Grade::Ungraded)];
        assert_eq!(project(&zero_credit, 3.0), Projection::Infeasible);
    }

    #[test]
    fn test_exactly_five_is_feasible() {
        let modules = vec![
            module("CS1010", 4, done(Letter::A)),
            module("CS2040", 4, Grade::Ungraded),
            module("CS2030", 2, Grade::Ungraded),
        ];
        let projection = project(&modules, 5.0);
        assert!(targets(&projection)
            .iter()
            .all(|(_, letter)| *letter == Letter::A));
        assert_eq!(project(&modules, 5.01), Projection::Infeasible);
    }

    #[test]
    fn test_projected_average_meets_goal() {
        let base = vec![
            module("CS1010", 4, done(Letter::BPlus)),
            module("CS1231", 4, done(Letter::C)),
            module("GEQ1000", 2, Grade::Ungraded),
            module("CS2040", 4, Grade::Ungraded),
            module("CS2030", 6, Grade::Ungraded),
        ];
        for step in 0..=50 {
            let goal = f64::from(step) / 10.0;
            if let Projection::Feasible(targeted) = project(&base, goal) {
                let as_completed: Vec<Module> = base
                    .iter()
                    .filter(|m| !m.is_targetable())
                    .cloned()
                    .chain(
                        targeted
                            .iter()
                            .map(|m| m.with_grade(Grade::Completed(GradeValue::Letter(
                                Letter::from_point(m.grade.point()).unwrap(),
                            )))),
                    )
                    .collect();
                assert!(
                    compute_cap(&as_completed) + 1e-9 >= goal,
                    "goal {} not met",
                    goal
                );
            }
        }
    }
}
