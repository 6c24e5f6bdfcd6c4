use crate::core::error::{NumericsError, NumericsResult};
use crate::core::file_io::{
    build_output_path_with_date_time, extract_base_name, maybe_date_time_string, FilePrefix,
};
use crate::scenarios::common::ScenarioParams;

use super::args::ParameterFilePath;

/// Runs one parameter file, writing to `out/<scenario>/<base>[/<datetime>]`.
pub fn run_scenario(args: &ParameterFilePath) -> NumericsResult<()> {
    let params = ScenarioParams::from_file(&args.params_path)?;
    let scenario = params.scenario_name();
    let file_prefix = FilePrefix {
        directory_path: build_output_path_with_date_time(
            &args.params_path,
            scenario,
            &maybe_date_time_string(args.date_time_out),
        )?,
        file_base: extract_base_name(&args.params_path)?.to_owned(),
    };
    tracing::info!("Running {scenario} from {}", args.params_path);
    tracing::debug!(?params, "parameters");
    params.run_and_record(&file_prefix).map_err(|err| {
        if err.is_non_convergence() {
            tracing::warn!("{scenario} did not converge: {err}");
        }
        err
    })
}

/// Parses and validates every file, reporting each failure before giving up.
pub fn validate_parameter_files(paths: &[String]) -> NumericsResult<()> {
    let mut failures = 0;
    for path in paths {
        match ScenarioParams::from_file(path).and_then(|params| {
            params.validate()?;
            Ok(params.scenario_name())
        }) {
            Ok(scenario) => tracing::info!("{path}: valid {scenario} parameters"),
            Err(err) => {
                tracing::warn!("{path}: {err}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        return Err(NumericsError::invalid_argument(format!(
            "{failures} of {} parameter files failed validation",
            paths.len()
        )));
    }
    Ok(())
}
