//! Per-argument value parsers.
//!
//! Each turns one raw command-line value into its typed form or a message
//! explaining why it was rejected. clap calls them through `value_parser`.

use crate::domain::model::{Code, Credit, GradeValue, Semester, Year, MAX_POINT};
use crate::utils::error::CapError;
use crate::utils::validation::validate_range;

pub fn parse_code(value: &str) -> Result<Code, String> {
    value.parse().map_err(|e: CapError| e.to_string())
}

pub fn parse_year(value: &str) -> Result<Year, String> {
    value.parse().map_err(|e: CapError| e.to_string())
}

pub fn parse_semester(value: &str) -> Result<Semester, String> {
    value.parse().map_err(|e: CapError| e.to_string())
}

pub fn parse_credit(value: &str) -> Result<Credit, String> {
    value.parse().map_err(|e: CapError| e.to_string())
}

pub fn parse_grade(value: &str) -> Result<GradeValue, String> {
    value.parse().map_err(|e: CapError| e.to_string())
}

pub fn parse_goal(value: &str) -> Result<f64, String> {
    let goal: f64 = value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|goal: &f64| goal.is_finite())
        .ok_or_else(|| format!("'{}' is not a number", value))?;
    validate_range("goal", goal, 0.0, MAX_POINT).map_err(|e| e.to_string())?;
    Ok(goal)
}
