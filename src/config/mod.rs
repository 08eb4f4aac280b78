pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use self::args::{CliCommand, CliConfig, GoalArgs, ListArgs, TargetArgs};

#[cfg(feature = "cli")]
mod args {
    use crate::app::args::{
        parse_code, parse_credit, parse_goal, parse_grade, parse_semester, parse_year,
    };
    use crate::app::commands::{completed_grade, Command, ListFilter, ModuleSelector};
    use crate::config::toml_config::TomlConfig;
    use crate::domain::model::{
        Code, Credit, GradeValue, Module, ModulePatch, Semester, Year,
    };
    use clap::{Args, Parser, Subcommand};
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "cap-tracker")]
    #[command(about = "Track module grades, CAP and the grades needed to reach a CAP goal")]
    pub struct CliConfig {
        /// Path to a TOML configuration file
        #[arg(long, global = true)]
        pub config: Option<PathBuf>,

        /// Transcript data file (overrides the configuration file)
        #[arg(long, global = true)]
        pub data_file: Option<PathBuf>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Emit logs as JSON lines")]
        pub json_logs: bool,

        #[command(subcommand)]
        pub command: CliCommand,
    }

    impl CliConfig {
        /// CLI flag first, then the TOML file, then the built-in default.
        pub fn resolve_data_file(&self, toml: &TomlConfig) -> PathBuf {
            self.data_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(toml.data_file()))
        }
    }

    /// Identifies the module to act on.
    #[derive(Debug, Clone, Args)]
    pub struct TargetArgs {
        #[arg(id = "target_code", short = 't', long = "target", value_parser = parse_code)]
        pub code: Code,

        #[arg(id = "target_year", short = 'e', long = "target-year", value_parser = parse_year, requires = "target_semester")]
        pub year: Option<Year>,

        #[arg(id = "target_semester", short = 'z', long = "target-semester", value_parser = parse_semester, requires = "target_year")]
        pub semester: Option<Semester>,
    }

    impl From<&TargetArgs> for ModuleSelector {
        fn from(args: &TargetArgs) -> Self {
            ModuleSelector {
                code: args.code.clone(),
                year: args.year,
                semester: args.semester,
            }
        }
    }

    #[derive(Debug, Clone, Args)]
    pub struct GoalArgs {
        /// Target CAP between 0 and 5
        #[arg(value_parser = parse_goal, required_unless_present = "clear")]
        pub value: Option<f64>,

        /// Remove the current goal
        #[arg(long, conflicts_with = "value")]
        pub clear: bool,
    }

    #[derive(Debug, Clone, Args)]
    pub struct ListArgs {
        #[arg(long, conflicts_with = "incomplete")]
        pub completed: bool,

        #[arg(long)]
        pub incomplete: bool,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum CliCommand {
        /// Add a module to the transcript
        Add {
            #[arg(short = 'm', long = "code", value_parser = parse_code)]
            code: Code,
            #[arg(short = 'y', long, value_parser = parse_year)]
            year: Year,
            #[arg(short = 's', long, value_parser = parse_semester)]
            semester: Semester,
            #[arg(short = 'c', long, value_parser = parse_credit)]
            credit: Credit,
            /// Final grade; omit for modules still in progress
            #[arg(short = 'g', long, value_parser = parse_grade)]
            grade: Option<GradeValue>,
        },
        /// Edit fields of an existing module
        Edit {
            #[command(flatten)]
            target: TargetArgs,
            #[arg(short = 'm', long = "code", value_parser = parse_code)]
            code: Option<Code>,
            #[arg(short = 'y', long, value_parser = parse_year)]
            year: Option<Year>,
            #[arg(short = 's', long, value_parser = parse_semester)]
            semester: Option<Semester>,
            #[arg(short = 'c', long, value_parser = parse_credit)]
            credit: Option<Credit>,
            #[arg(short = 'g', long, value_parser = parse_grade)]
            grade: Option<GradeValue>,
        },
        /// Remove a module
        Remove {
            #[command(flatten)]
            target: TargetArgs,
        },
        /// Set a planned grade on a module that is not completed yet
        Adjust {
            #[command(flatten)]
            target: TargetArgs,
            #[arg(short = 'g', long, value_parser = parse_grade)]
            grade: GradeValue,
        },
        /// Set or clear the CAP goal
        Goal(GoalArgs),
        /// Show the current CAP
        Cap,
        /// List modules
        List(ListArgs),
        /// Export modules as CSV
        Export {
            #[arg(short, long)]
            output: PathBuf,
        },
    }

    impl From<&CliCommand> for Command {
        fn from(command: &CliCommand) -> Self {
            match command {
                CliCommand::Add {
                    code,
                    year,
                    semester,
                    credit,
                    grade,
                } => Command::Add(Module::new(
                    code.clone(),
                    *year,
                    *semester,
                    *credit,
                    completed_grade(*grade),
                )),
                CliCommand::Edit {
                    target,
                    code,
                    year,
                    semester,
                    credit,
                    grade,
                } => Command::Edit {
                    target: target.into(),
                    patch: ModulePatch {
                        code: code.clone(),
                        year: *year,
                        semester: *semester,
                        credit: *credit,
                        grade: grade.map(|g| completed_grade(Some(g))),
                    },
                },
                CliCommand::Remove { target } => Command::Remove(target.into()),
                CliCommand::Adjust { target, grade } => Command::Adjust {
                    target: target.into(),
                    grade: *grade,
                },
                CliCommand::Goal(args) => match args.value {
                    Some(value) if !args.clear => Command::SetGoal(value),
                    _ => Command::ClearGoal,
                },
                CliCommand::Cap => Command::Cap,
                CliCommand::List(args) => Command::List(if args.completed {
                    ListFilter::Completed
                } else if args.incomplete {
                    ListFilter::Incomplete
                } else {
                    ListFilter::All
                }),
                CliCommand::Export { output } => Command::Export(output.clone()),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::model::{Grade, Letter};

        fn parse(args: &[&str]) -> CliConfig {
            CliConfig::try_parse_from(std::iter::once("cap-tracker").chain(args.iter().copied()))
                .unwrap()
        }

        #[test]
        fn test_add_command() {
            let cli = parse(&[
                "add", "-m", "cs1010", "-y", "1", "-s", "1", "-c", "4", "-g", "A-",
            ]);
            match Command::from(&cli.command) {
                Command::Add(module) => {
                    assert_eq!(module.code.as_str(), "CS1010");
                    assert_eq!(
                        module.grade,
                        Grade::Completed(GradeValue::Letter(Letter::AMinus))
                    );
                }
                other => panic!("unexpected command {:?}", other),
            }
        }

        #[test]
        fn test_add_without_grade_is_ungraded() {
            let cli = parse(&["add", "-m", "CS2040", "-y", "1", "-s", "s2", "-c", "4"]);
            match Command::from(&cli.command) {
                Command::Add(module) => assert_eq!(module.grade, Grade::Ungraded),
                other => panic!("unexpected command {:?}", other),
            }
        }

        #[test]
        fn test_invalid_values_are_rejected_by_parser() {
            let args = ["cap-tracker", "add", "-m", "CS1010", "-y", "0", "-s", "1", "-c", "4"];
            assert!(CliConfig::try_parse_from(args).is_err());

            let args = ["cap-tracker", "goal", "5.5"];
            assert!(CliConfig::try_parse_from(args).is_err());
        }

        #[test]
        fn test_target_year_requires_semester() {
            let args = ["cap-tracker", "remove", "-t", "CS1010", "-e", "1"];
            assert!(CliConfig::try_parse_from(args).is_err());

            let cli = parse(&["remove", "-t", "CS1010", "-e", "1", "-z", "2"]);
            match Command::from(&cli.command) {
                Command::Remove(selector) => {
                    assert_eq!(selector.year.map(|y| y.value()), Some(1));
                    assert_eq!(selector.semester, Some(Semester::Two));
                }
                other => panic!("unexpected command {:?}", other),
            }
        }

        #[test]
        fn test_goal_set_and_clear() {
            assert_eq!(
                Command::from(&parse(&["goal", "4.5"]).command),
                Command::SetGoal(4.5)
            );
            assert_eq!(
                Command::from(&parse(&["goal", "--clear"]).command),
                Command::ClearGoal
            );
            assert!(CliConfig::try_parse_from(["cap-tracker", "goal"]).is_err());
        }

        #[test]
        fn test_data_file_precedence() {
            let toml = TomlConfig::from_toml_str("[storage]\ndata_file = \"from-toml.json\"\n")
                .unwrap();
            let cli = parse(&["cap"]);
            assert_eq!(cli.resolve_data_file(&toml), PathBuf::from("from-toml.json"));

            let cli = parse(&["--data-file", "from-cli.json", "cap"]);
            assert_eq!(cli.resolve_data_file(&toml), PathBuf::from("from-cli.json"));
        }
    }
}
