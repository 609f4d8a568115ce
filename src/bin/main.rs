use std::process::ExitCode;

use clap::Parser;
use entra_admin::commands;
use entra_admin::parameters::{
    Commands, Environments, ExternalEndpoints, HttpArgs, build_http_config, select_environment,
};
use entra_admin::{DirectorySdk, SdkConfig};
use tracing::Level;
use tracing::error;

const EXIT_FAILED_OPERATION: u8 = 1;
const EXIT_SETUP_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "entra-admin-cli")]
struct Cli {
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// National cloud hosting the tenant. Overrides `ENTRA_CLOUD`.
    #[arg(long, value_enum, global = true)]
    environment: Option<Environments>,

    #[command(flatten)]
    endpoints: ExternalEndpoints,

    #[command(flatten)]
    http: HttpArgs,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let sdk = match build_sdk(&cli) {
        Ok(sdk) => sdk,
        Err(err) => {
            error!("{err}");
            return ExitCode::from(EXIT_SETUP_ERROR);
        }
    };

    let output = match commands::run(&sdk, cli.command) {
        Ok(output) => output,
        Err(err) => {
            error!("{err}");
            return ExitCode::from(EXIT_SETUP_ERROR);
        }
    };
    match output.to_pretty_string() {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => {
            error!("{err}");
            return ExitCode::from(EXIT_SETUP_ERROR);
        }
    }

    if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILED_OPERATION)
    }
}

fn build_sdk(
    cli: &Cli,
) -> Result<DirectorySdk<entra_admin::sdk::DefaultGraphClient>, Box<dyn std::error::Error>> {
    let http = build_http_config(&cli.http)?;
    let mut config = SdkConfig::from_env()?.with_http_config(http);
    if let Some(environment) = cli.environment.clone() {
        config = config.with_environment(select_environment(environment, cli.endpoints.clone())?);
    }

    Ok(DirectorySdk::new(&config)?)
}
