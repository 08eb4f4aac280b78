use anyhow::Context;
use cap_tracker::core::TranscriptStorage;
use cap_tracker::utils::{logger, validation::Validate};
use cap_tracker::{CapError, CliConfig, Command, CommandExecutor, LocalStorage, TomlConfig, Transcript};
use clap::Parser;

fn main() {
    let cli = CliConfig::parse();

    let toml = match load_toml(&cli) {
        Ok(toml) => toml,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    };

    // 初始化日誌
    let verbose = cli.verbose || toml.verbose();
    if cli.json_logs || toml.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let command = Command::from(&cli.command);
    if let Err(e) = run(&cli, &toml, &command) {
        let exit_code = match e.downcast_ref::<CapError>() {
            Some(cap_error) => {
                tracing::error!(
                    "{} failed: {} (Category: {:?}, Severity: {:?})",
                    command.name(),
                    cap_error,
                    cap_error.category(),
                    cap_error.severity()
                );
                eprintln!("❌ {}", cap_error.user_friendly_message());
                eprintln!("💡 {}", cap_error.recovery_suggestion());
                cap_error.exit_code()
            }
            None => {
                tracing::error!("{} failed: {:#}", command.name(), e);
                eprintln!("❌ {:#}", e);
                1
            }
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

fn load_toml(cli: &CliConfig) -> anyhow::Result<TomlConfig> {
    let toml = match &cli.config {
        Some(path) => TomlConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => TomlConfig::default(),
    };
    toml.validate().context("invalid configuration")?;
    Ok(toml)
}

fn run(cli: &CliConfig, toml: &TomlConfig, command: &Command) -> anyhow::Result<()> {
    let data_file = cli.resolve_data_file(toml);
    let storage = LocalStorage::new(&data_file).with_pretty(toml.pretty());

    let mut transcript = match storage.load()? {
        Some(snapshot) => Transcript::from_snapshot(snapshot)?,
        None => {
            tracing::info!("No transcript at {}, starting empty", data_file.display());
            Transcript::new()
        }
    };

    let outcome = CommandExecutor::new(toml.cap_precision()).execute(command, &mut transcript)?;

    if outcome.mutated {
        storage.save(&transcript.to_snapshot())?;
        tracing::debug!("Saved {} modules to {}", transcript.len(), data_file.display());
    }
    println!("{}", outcome.message);
    Ok(())
}
