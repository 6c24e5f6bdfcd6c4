use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::core::error::NumericsResult;
use crate::core::file_io::FilePrefix;
use crate::core::stopwatch::Stopwatch;

use super::{
    definite_integral::DefiniteIntegralParams, falling_sphere::FallingSphereParams,
    harmonic_oscillator::HarmonicOscillatorParams, projectile::ProjectileParams,
    root_search::RootSearchParams, terminal_velocity::TerminalVelocityParams,
};

/// A self-contained numerical experiment described by a parameter file.
pub trait Scenario {
    type Report: Serialize;

    /// Rejects parameter sets the numerics cannot run, before any work is done.
    fn validate(&self) -> NumericsResult<()>;

    /// Validates, runs the experiment, and returns what it measured.
    fn run(&self) -> NumericsResult<Self::Report>;
}

/// Top-level contents of a parameter file.
#[derive(Serialize, Deserialize, Debug)]
pub enum ScenarioParams {
    FallingSphere(Box<FallingSphereParams>),
    HarmonicOscillator(Box<HarmonicOscillatorParams>),
    Projectile(Box<ProjectileParams>),
    TerminalVelocity(Box<TerminalVelocityParams>),
    RootSearch(Box<RootSearchParams>),
    DefiniteIntegral(Box<DefiniteIntegralParams>),
}

impl ScenarioParams {
    pub fn from_file(path: &str) -> NumericsResult<ScenarioParams> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Output sub-directory for this scenario.
    pub fn scenario_name(&self) -> &'static str {
        match self {
            ScenarioParams::FallingSphere(_) => "falling_sphere",
            ScenarioParams::HarmonicOscillator(_) => "harmonic_oscillator",
            ScenarioParams::Projectile(_) => "projectile",
            ScenarioParams::TerminalVelocity(_) => "terminal_velocity",
            ScenarioParams::RootSearch(_) => "root_search",
            ScenarioParams::DefiniteIntegral(_) => "definite_integral",
        }
    }

    pub fn validate(&self) -> NumericsResult<()> {
        match self {
            ScenarioParams::FallingSphere(inner) => inner.validate(),
            ScenarioParams::HarmonicOscillator(inner) => inner.validate(),
            ScenarioParams::Projectile(inner) => inner.validate(),
            ScenarioParams::TerminalVelocity(inner) => inner.validate(),
            ScenarioParams::RootSearch(inner) => inner.validate(),
            ScenarioParams::DefiniteIntegral(inner) => inner.validate(),
        }
    }

    /**
     * Runs the scenario, writing `<base>.json` (the parameters), `<base>_result.json`
     * (the report), and `<base>_diagnostics.txt` (stopwatch splits) under `file_prefix`.
     * The parameter echo is written first so that it survives a failed run.
     */
    pub fn run_and_record(&self, file_prefix: &FilePrefix) -> NumericsResult<()> {
        let mut stopwatch = Stopwatch::new("Scenario Stopwatch".to_owned());
        file_prefix.write_json(".json", self)?;
        stopwatch.record_split("write_params");

        match self {
            ScenarioParams::FallingSphere(inner) => record(&**inner, file_prefix, &mut stopwatch),
            ScenarioParams::HarmonicOscillator(inner) => {
                record(&**inner, file_prefix, &mut stopwatch)
            }
            ScenarioParams::Projectile(inner) => record(&**inner, file_prefix, &mut stopwatch),
            ScenarioParams::TerminalVelocity(inner) => {
                record(&**inner, file_prefix, &mut stopwatch)
            }
            ScenarioParams::RootSearch(inner) => record(&**inner, file_prefix, &mut stopwatch),
            ScenarioParams::DefiniteIntegral(inner) => {
                record(&**inner, file_prefix, &mut stopwatch)
            }
        }?;

        let mut diagnostics_file = file_prefix.create_file_with_suffix("_diagnostics.txt")?;
        stopwatch.display(&mut diagnostics_file)?;
        diagnostics_file.flush()?;
        Ok(())
    }
}

fn record<S: Scenario>(
    params: &S,
    file_prefix: &FilePrefix,
    stopwatch: &mut Stopwatch,
) -> NumericsResult<()> {
    let report = params.run()?;
    stopwatch.record_split("run");
    file_prefix.write_json("_result.json", &report)?;
    stopwatch.record_split("write_result");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_names_follow_variant() {
        let params: ScenarioParams =
            serde_json::from_str(r#"{ "HarmonicOscillator": {} }"#).unwrap();
        assert_eq!(params.scenario_name(), "harmonic_oscillator");
        params.validate().unwrap();
    }

    #[test]
    fn unknown_scenario_is_rejected() {
        let result = serde_json::from_str::<ScenarioParams>(r#"{ "Pendulum": {} }"#);
        assert!(result.is_err());
    }

    #[test]
    fn record_writes_three_files() {
        let directory_path = std::env::temp_dir().join(format!(
            "mechanics_numerics_record_{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&directory_path).unwrap();
        let file_prefix = FilePrefix {
            directory_path: directory_path.clone(),
            file_base: "spring".to_owned(),
        };
        let params: ScenarioParams = serde_json::from_str(
            r#"{ "HarmonicOscillator": { "t_final": 1.0, "time_step": 0.1 } }"#,
        )
        .unwrap();
        params.run_and_record(&file_prefix).unwrap();
        for suffix in [".json", "_result.json", "_diagnostics.txt"] {
            assert!(file_prefix.with_suffix(suffix).exists(), "missing {suffix}");
        }
        // The echo parses back into the same scenario.
        let echo = ScenarioParams::from_file(file_prefix.with_suffix(".json").to_str().unwrap())
            .unwrap();
        assert_eq!(echo.scenario_name(), "harmonic_oscillator");
        std::fs::remove_dir_all(&directory_path).unwrap();
    }
}
