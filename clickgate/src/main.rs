mod config;
mod logging;
mod statsd;

use clap::{Args, Parser};
use config::{Config, ConfigError};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "clickgate", about = "Ad click attribution redirect gateway")]
enum CliCommand {
    /// Run the redirect gateway
    Serve(ConfigArgs),
    /// Load and validate the config file, then exit
    CheckConfig(ConfigArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[arg(long, short, default_value = "clickgate.yaml")]
    config: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] redirect::config::ValidationError),
    #[error(transparent)]
    Metrics(#[from] statsd::MetricsError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Redirect(#[from] redirect::errors::RedirectError),
}

fn main() {
    let cli = CliCommand::parse();

    let result = match cli {
        CliCommand::Serve(args) => serve(args),
        CliCommand::CheckConfig(args) => check_config(args),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1);
    }
}

fn load_config(args: &ConfigArgs) -> Result<Config, CliError> {
    let config = Config::from_file(&args.config)?;
    config.redirect.validate()?;
    Ok(config)
}

fn check_config(args: ConfigArgs) -> Result<(), CliError> {
    load_config(&args)?;
    println!("{}: ok", args.config.display());
    Ok(())
}

fn serve(args: ConfigArgs) -> Result<(), CliError> {
    let config = load_config(&args)?;

    let _sentry = logging::init(&config.common.logging);

    if let Some(metrics_config) = &config.common.metrics {
        statsd::init(metrics_config)?;
    }

    tracing::info!(
        config = %args.config.display(),
        listener = %format!("{}:{}", config.redirect.listener.host, config.redirect.listener.port),
        "Starting clickgate"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(redirect::run(config.redirect))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_commands() {
        let cli = CliCommand::try_parse_from(["clickgate", "serve", "--config", "/etc/cg.yaml"])
            .expect("parse serve");
        assert!(matches!(cli, CliCommand::Serve(args) if args.config == PathBuf::from("/etc/cg.yaml")));

        let cli = CliCommand::try_parse_from(["clickgate", "check-config"]).expect("parse check");
        assert!(matches!(cli, CliCommand::CheckConfig(args) if args.config == PathBuf::from("clickgate.yaml")));

        assert!(CliCommand::try_parse_from(["clickgate", "proxy"]).is_err());
    }
}
