use crate::domain::model::{Grade, Module};
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ModuleRow<'a> {
    code: &'a str,
    year: u32,
    semester: &'static str,
    credit: u32,
    grade: String,
    status: &'static str,
    point: Option<f64>,
}

impl<'a> From<&'a Module> for ModuleRow<'a> {
    fn from(module: &'a Module) -> Self {
        let (grade, status) = match module.grade {
            Grade::Completed(value) => (value.to_string(), "completed"),
            Grade::Ungraded => (String::new(), "ungraded"),
            Grade::Targeted(letter) => (letter.to_string(), "targeted"),
            Grade::Adjusted(value) => (value.to_string(), "adjusted"),
        };
        let point = (module.affects_cap() && module.grade != Grade::Ungraded)
            .then(|| module.grade.point());

        Self {
            code: module.code.as_str(),
            year: module.year.value(),
            semester: module.semester.as_str(),
            credit: module.credit.value(),
            grade,
            status,
            point,
        }
    }
}

/// Writes one CSV row per module, with a header, and returns the row count.
pub fn write_csv<'a, W, I>(modules: I, writer: W) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Module>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for module in modules {
        csv_writer.serialize(ModuleRow::from(module))?;
        rows += 1;
    }
    csv_writer.flush()?;
    Ok(rows)
}

pub fn export_csv<'a, I>(modules: I, path: &Path) -> Result<usize>
where
    I: IntoIterator<Item = &'a Module>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    let rows = write_csv(modules, file)?;
    tracing::debug!("Exported {} modules to {}", rows, path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Credit, GradeValue, Letter, Semester, Year};

    fn module(code: &str, grade: Grade) -> Module {
        Module::new(
            code.parse().unwrap(),
            Year::try_from(2).unwrap(),
            Semester::SpecialOne,
            Credit::try_from(4).unwrap(),
            grade,
        )
    }

    #[test]
    fn test_write_csv_rows() {
        let modules = vec![
            module("CS1010", Grade::Completed(GradeValue::Letter(Letter::BPlus))),
            module("CFG1000", Grade::Completed(GradeValue::Satisfactory)),
            module("CS2040", Grade::Targeted(Letter::A)),
            module("CS2030", Grade::Ungraded),
        ];
        let mut buffer = Vec::new();
        let rows = write_csv(&modules, &mut buffer).unwrap();
        assert_eq!(rows, 4);

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "code,year,semester,credit,grade,status,point");
        assert_eq!(lines[1], "CS1010,2,s1,4,B+,completed,4.0");
        assert_eq!(lines[2], "CFG1000,2,s1,4,S,completed,");
        assert_eq!(lines[3], "CS2040,2,s1,4,A,targeted,5.0");
        assert_eq!(lines[4], "CS2030,2,s1,4,,ungraded,");
    }

    #[test]
    fn test_export_csv_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out/transcript.csv");
        let modules = vec![module("CS1010", Grade::Ungraded)];
        assert_eq!(export_csv(&modules, &path).unwrap(), 1);
        assert!(path.exists());
    }
}
