use clap::Parser;
use tracing_subscriber::EnvFilter;

use mechanics_numerics::cli::args::{CommandsEnum, MechanicsNumericsArgs};
use mechanics_numerics::cli::run::{run_scenario, validate_parameter_files};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: MechanicsNumericsArgs = MechanicsNumericsArgs::parse();

    match &args.command {
        Some(CommandsEnum::Run(params)) => run_scenario(params)?,
        Some(CommandsEnum::Validate(params)) => validate_parameter_files(&params.params_paths)?,
        None => {
            tracing::info!("Default command (nothing specified!)");
        }
    }
    Ok(())
}
