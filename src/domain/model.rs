use crate::utils::error::{CapError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]+$").expect("module code pattern compiles"));

pub const MIN_YEAR: u32 = 1;
pub const MAX_YEAR: u32 = 10;
pub const MAX_CREDIT: u32 = 40;
pub const MAX_POINT: f64 = 5.0;

/// Course identifier, stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code(String);

impl Code {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Code {
    type Err = CapError;

    fn from_str(s: &str) -> Result<Self> {
        validate_non_empty_string("code", s)?;
        let normalized = s.trim().to_uppercase();
        if !CODE_PATTERN.is_match(&normalized) {
            return Err(CapError::InvalidValue {
                field: "code".to_string(),
                value: s.to_string(),
                reason: "Module code must be a single alphanumeric token".to_string(),
            });
        }
        Ok(Code(normalized))
    }
}

impl TryFrom<String> for Code {
    type Error = CapError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Year(u32);

impl Year {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Year {
    type Error = CapError;

    fn try_from(value: u32) -> Result<Self> {
        validate_range("year", value, MIN_YEAR, MAX_YEAR)?;
        Ok(Year(value))
    }
}

impl From<Year> for u32 {
    fn from(year: Year) -> Self {
        year.0
    }
}

impl FromStr for Year {
    type Err = CapError;

    fn from_str(s: &str) -> Result<Self> {
        let value: u32 = s.trim().parse().map_err(|_| CapError::InvalidValue {
            field: "year".to_string(),
            value: s.to_string(),
            reason: "Year must be a positive integer".to_string(),
        })?;
        Year::try_from(value)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Semester {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "s1")]
    SpecialOne,
    #[serde(rename = "s2")]
    SpecialTwo,
}

impl Semester {
    pub fn as_str(self) -> &'static str {
        match self {
            Semester::One => "1",
            Semester::Two => "2",
            Semester::SpecialOne => "s1",
            Semester::SpecialTwo => "s2",
        }
    }
}

impl FromStr for Semester {
    type Err = CapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" => Ok(Semester::One),
            "2" => Ok(Semester::Two),
            "s1" => Ok(Semester::SpecialOne),
            "s2" => Ok(Semester::SpecialTwo),
            _ => Err(CapError::InvalidValue {
                field: "semester".to_string(),
                value: s.to_string(),
                reason: "Semester must be one of 1, 2, s1, s2".to_string(),
            }),
        }
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modular credits; the weight of a module in the average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Credit(u32);

impl Credit {
    pub fn value(self) -> u32 {
        self.0
    }

    pub fn weight(self) -> f64 {
        f64::from(self.0)
    }
}

impl TryFrom<u32> for Credit {
    type Error = CapError;

    fn try_from(value: u32) -> Result<Self> {
        validate_range("credit", value, 0, MAX_CREDIT)?;
        Ok(Credit(value))
    }
}

impl From<Credit> for u32 {
    fn from(credit: Credit) -> Self {
        credit.0
    }
}

impl FromStr for Credit {
    type Err = CapError;

    fn from_str(s: &str) -> Result<Self> {
        let value: u32 = s.trim().parse().map_err(|_| CapError::InvalidValue {
            field: "credit".to_string(),
            value: s.to_string(),
            reason: "Credit must be a non-negative integer".to_string(),
        })?;
        Credit::try_from(value)
    }
}

impl fmt::Display for Credit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Letter {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    DPlus,
    D,
    F,
}

impl Letter {
    pub fn point(self) -> f64 {
        match self {
            Letter::APlus | Letter::A => 5.0,
            Letter::AMinus => 4.5,
            Letter::BPlus => 4.0,
            Letter::B => 3.5,
            Letter::BMinus => 3.0,
            Letter::CPlus => 2.5,
            Letter::C => 2.0,
            Letter::DPlus => 1.5,
            Letter::D => 1.0,
            Letter::F => 0.0,
        }
    }

    /// Letter worth exactly `point`. No letter is worth 0.5, and 5.0 maps to A.
    pub fn from_point(point: f64) -> Option<Letter> {
        if !point.is_finite() {
            return None;
        }
        let half_steps = point * 2.0;
        if (half_steps - half_steps.round()).abs() > 1e-9 {
            return None;
        }
        match half_steps.round() as i64 {
            10 => Some(Letter::A),
            9 => Some(Letter::AMinus),
            8 => Some(Letter::BPlus),
            7 => Some(Letter::B),
            6 => Some(Letter::BMinus),
            5 => Some(Letter::CPlus),
            4 => Some(Letter::C),
            3 => Some(Letter::DPlus),
            2 => Some(Letter::D),
            0 => Some(Letter::F),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Letter::APlus => "A+",
            Letter::A => "A",
            Letter::AMinus => "A-",
            Letter::BPlus => "B+",
            Letter::B => "B",
            Letter::BMinus => "B-",
            Letter::CPlus => "C+",
            Letter::C => "C",
            Letter::DPlus => "D+",
            Letter::D => "D",
            Letter::F => "F",
        }
    }
}

impl FromStr for Letter {
    type Err = CapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "A+" => Ok(Letter::APlus),
            "A" => Ok(Letter::A),
            "A-" => Ok(Letter::AMinus),
            "B+" => Ok(Letter::BPlus),
            "B" => Ok(Letter::B),
            "B-" => Ok(Letter::BMinus),
            "C+" => Ok(Letter::CPlus),
            "C" => Ok(Letter::C),
            "D+" => Ok(Letter::DPlus),
            "D" => Ok(Letter::D),
            "F" => Ok(Letter::F),
            _ => Err(CapError::InvalidValue {
                field: "grade".to_string(),
                value: s.to_string(),
                reason: "Not a letter grade".to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Letter {
    type Error = CapError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Letter> for String {
    fn from(letter: Letter) -> Self {
        letter.as_str().to_string()
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any result a module can carry: a letter, or a non-CAP outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GradeValue {
    Letter(Letter),
    Satisfactory,
    Unsatisfactory,
    Exempted,
    Incomplete,
    Withdrawn,
}

impl GradeValue {
    pub fn affects_cap(self) -> bool {
        matches!(self, GradeValue::Letter(_))
    }

    pub fn point(self) -> f64 {
        match self {
            GradeValue::Letter(letter) => letter.point(),
            _ => 0.0,
        }
    }
}

impl FromStr for GradeValue {
    type Err = CapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "S" => Ok(GradeValue::Satisfactory),
            "U" => Ok(GradeValue::Unsatisfactory),
            "EXE" => Ok(GradeValue::Exempted),
            "IC" => Ok(GradeValue::Incomplete),
            "W" => Ok(GradeValue::Withdrawn),
            other => other
                .parse::<Letter>()
                .map(GradeValue::Letter)
                .map_err(|_| CapError::InvalidValue {
                    field: "grade".to_string(),
                    value: s.to_string(),
                    reason: "Grade must be A+ to F, S, U, EXE, IC or W".to_string(),
                }),
        }
    }
}

impl TryFrom<String> for GradeValue {
    type Error = CapError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<GradeValue> for String {
    fn from(value: GradeValue) -> Self {
        value.to_string()
    }
}

impl fmt::Display for GradeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeValue::Letter(letter) => f.write_str(letter.as_str()),
            GradeValue::Satisfactory => f.write_str("S"),
            GradeValue::Unsatisfactory => f.write_str("U"),
            GradeValue::Exempted => f.write_str("EXE"),
            GradeValue::Incomplete => f.write_str("IC"),
            GradeValue::Withdrawn => f.write_str("W"),
        }
    }
}

/// A module's grade together with where it came from.
///
/// Only `Completed` is a real, final result. `Targeted` grades are written by
/// the projection and `Adjusted` grades by the user on modules still in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Grade {
    Completed(GradeValue),
    #[default]
    Ungraded,
    Targeted(Letter),
    Adjusted(GradeValue),
}

impl Grade {
    pub fn is_complete(self) -> bool {
        matches!(self, Grade::Completed(_))
    }

    pub fn is_targeted(self) -> bool {
        matches!(self, Grade::Targeted(_))
    }

    pub fn is_adjusted(self) -> bool {
        matches!(self, Grade::Adjusted(_))
    }

    pub fn affects_cap(self) -> bool {
        match self {
            Grade::Completed(value) | Grade::Adjusted(value) => value.affects_cap(),
            Grade::Ungraded | Grade::Targeted(_) => true,
        }
    }

    pub fn point(self) -> f64 {
        match self {
            Grade::Completed(value) | Grade::Adjusted(value) => value.point(),
            Grade::Targeted(letter) => letter.point(),
            Grade::Ungraded => 0.0,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Completed(value) => write!(f, "{}", value),
            Grade::Ungraded => f.write_str("-"),
            Grade::Targeted(letter) => write!(f, "{} (target)", letter),
            Grade::Adjusted(value) => write!(f, "{} (adjusted)", value),
        }
    }
}

/// Identity of a module entry. No two entries in a transcript share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId {
    pub code: Code,
    pub year: Year,
    pub semester: Semester,
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (year {}, semester {})",
            self.code, self.year, self.semester
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub code: Code,
    pub year: Year,
    pub semester: Semester,
    pub credit: Credit,
    #[serde(default)]
    pub grade: Grade,
}

impl Module {
    pub fn new(code: Code, year: Year, semester: Semester, credit: Credit, grade: Grade) -> Self {
        Self {
            code,
            year,
            semester,
            credit,
            grade,
        }
    }

    pub fn id(&self) -> ModuleId {
        ModuleId {
            code: self.code.clone(),
            year: self.year,
            semester: self.semester,
        }
    }

    pub fn is_same_module(&self, id: &ModuleId) -> bool {
        self.code == id.code && self.year == id.year && self.semester == id.semester
    }

    /// Matches on code, and on year/semester only when they are given.
    pub fn matches(&self, code: &Code, year: Option<Year>, semester: Option<Semester>) -> bool {
        self.code == *code
            && year.is_none_or(|y| y == self.year)
            && semester.is_none_or(|s| s == self.semester)
    }

    pub fn has_completed(&self) -> bool {
        self.grade.is_complete()
    }

    pub fn affects_cap(&self) -> bool {
        self.grade.affects_cap()
    }

    pub fn is_targetable(&self) -> bool {
        !self.grade.is_complete() && !self.grade.is_adjusted()
    }

    pub fn is_targeted(&self) -> bool {
        self.grade.is_targeted()
    }

    pub fn is_adjusted(&self) -> bool {
        self.grade.is_adjusted()
    }

    pub fn weight(&self) -> f64 {
        self.credit.weight()
    }

    pub fn weighted_point(&self) -> f64 {
        self.grade.point() * self.credit.weight()
    }

    pub fn with_grade(&self, grade: Grade) -> Module {
        Module {
            grade,
            ..self.clone()
        }
    }

    pub fn patched(&self, patch: &ModulePatch) -> Module {
        Module {
            code: patch.code.clone().unwrap_or_else(|| self.code.clone()),
            year: patch.year.unwrap_or(self.year),
            semester: patch.semester.unwrap_or(self.semester),
            credit: patch.credit.unwrap_or(self.credit),
            grade: patch.grade.unwrap_or(self.grade),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Y{} Sem {} {}MC {}",
            self.code, self.year, self.semester, self.credit, self.grade
        )
    }
}

/// Field overrides applied on top of an existing module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModulePatch {
    pub code: Option<Code>,
    pub year: Option<Year>,
    pub semester: Option<Semester>,
    pub credit: Option<Credit>,
    pub grade: Option<Grade>,
}

impl ModulePatch {
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
            && self.year.is_none()
            && self.semester.is_none()
            && self.credit.is_none()
            && self.grade.is_none()
    }

    pub fn changes_identity(&self) -> bool {
        self.code.is_some() || self.year.is_some() || self.semester.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(grade: Grade) -> Module {
        Module::new(
            "cs1010".parse().unwrap(),
            Year::try_from(1).unwrap(),
            Semester::One,
            Credit::try_from(4).unwrap(),
            grade,
        )
    }

    #[test]
    fn test_code_is_normalized() {
        let code: Code = "  cs2103t ".parse().unwrap();
        assert_eq!(code.as_str(), "CS2103T");
        assert!("".parse::<Code>().is_err());
        assert!("CS 1010".parse::<Code>().is_err());
    }

    #[test]
    fn test_year_and_credit_bounds() {
        assert!("0".parse::<Year>().is_err());
        assert!("1".parse::<Year>().is_ok());
        assert!("abc".parse::<Year>().is_err());
        assert!("0".parse::<Credit>().is_ok());
        assert!("-4".parse::<Credit>().is_err());
    }

    #[test]
    fn test_semester_tokens() {
        assert_eq!("S1".parse::<Semester>().unwrap(), Semester::SpecialOne);
        assert_eq!("2".parse::<Semester>().unwrap(), Semester::Two);
        assert!("3".parse::<Semester>().is_err());
    }

    #[test]
    fn test_letter_points() {
        assert_eq!(Letter::APlus.point(), 5.0);
        assert_eq!(Letter::from_point(5.0), Some(Letter::A));
        assert_eq!(Letter::from_point(3.5), Some(Letter::B));
        assert_eq!(Letter::from_point(1.0), Some(Letter::D));
        assert_eq!(Letter::from_point(0.0), Some(Letter::F));
        assert_eq!(Letter::from_point(0.5), None);
        assert_eq!(Letter::from_point(3.3), None);
        assert_eq!(Letter::from_point(5.5), None);
        assert_eq!(Letter::from_point(f64::NAN), None);
        assert_eq!(Letter::from_point(f64::INFINITY), None);
    }

    #[test]
    fn test_grade_value_parsing() {
        assert_eq!(
            "a-".parse::<GradeValue>().unwrap(),
            GradeValue::Letter(Letter::AMinus)
        );
        assert_eq!("exe".parse::<GradeValue>().unwrap(), GradeValue::Exempted);
        assert!("Z".parse::<GradeValue>().is_err());
        assert!(!GradeValue::Satisfactory.affects_cap());
    }

    #[test]
    fn test_module_predicates() {
        let completed = module(Grade::Completed(GradeValue::Letter(Letter::B)));
        assert!(completed.has_completed());
        assert!(completed.affects_cap());
        assert!(!completed.is_targetable());

        let pass_fail = module(Grade::Completed(GradeValue::Satisfactory));
        assert!(pass_fail.has_completed());
        assert!(!pass_fail.affects_cap());

        let ungraded = module(Grade::Ungraded);
        assert!(ungraded.is_targetable());
        assert!(!ungraded.is_targeted());

        let targeted = module(Grade::Targeted(Letter::A));
        assert!(targeted.is_targetable());
        assert!(targeted.is_targeted());

        let adjusted = module(Grade::Adjusted(GradeValue::Letter(Letter::BPlus)));
        assert!(!adjusted.is_targetable());
        assert!(adjusted.is_adjusted());
        assert_eq!(adjusted.weighted_point(), 16.0);
    }

    #[test]
    fn test_patch_overrides_only_given_fields() {
        let base = module(Grade::Ungraded);
        let patch = ModulePatch {
            credit: Some(Credit::try_from(2).unwrap()),
            ..Default::default()
        };
        let patched = base.patched(&patch);
        assert_eq!(patched.credit.value(), 2);
        assert_eq!(patched.id(), base.id());
        assert!(!patch.changes_identity());
        assert!(ModulePatch::default().is_empty());
    }

    #[test]
    fn test_module_serde_round_trip() {
        let original = module(Grade::Adjusted(GradeValue::Letter(Letter::AMinus)));
        let json = serde_json::to_string(&original).unwrap();
        assert!(json.contains("\"status\":\"adjusted\""));
        let decoded: Module = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, original);

        let invalid = json.replace("CS1010", "CS 1010");
        assert!(serde_json::from_str::<Module>(&invalid).is_err());
    }
}
