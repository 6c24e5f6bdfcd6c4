use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(author, version, about)]
pub struct MechanicsNumericsArgs {
    #[command(subcommand)]
    pub command: Option<CommandsEnum>,
}

#[derive(Debug, Subcommand)]
pub enum CommandsEnum {
    /// Run the scenario described by a parameter file and write its outputs under `out/`.
    Run(ParameterFilePath),
    /// Parse and check parameter files without running them.
    Validate(ParameterFilePaths),
}

#[derive(Debug, Args)]
pub struct ParameterFilePath {
    pub params_path: String,

    #[clap(long, short)]
    pub date_time_out: bool,
}

#[derive(Debug, Args)]
pub struct ParameterFilePaths {
    #[clap(required = true)]
    pub params_paths: Vec<String>,
}
