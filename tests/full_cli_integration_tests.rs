use std::process::Command;

fn run_command(args: &[&str]) -> bool {
    Command::new(env!("CARGO_BIN_EXE_mechanics-numerics"))
        .args(args)
        .status()
        .expect("failed to execute process")
        .success()
}

fn read_json(file_path: &str) -> serde_json::Value {
    let text = std::fs::read_to_string(file_path)
        .unwrap_or_else(|_| panic!("missing output file: {file_path}"));
    serde_json::from_str(&text).unwrap()
}

#[cfg(test)]
mod tests {
    use crate::{read_json, run_command};
    use approx::assert_relative_eq;

    #[test]
    fn test_root_search_run() {
        assert!(run_command(&["run", "./demos/root_search/parachutist_bisection.json"]));
        let directory = "out/root_search/parachutist_bisection";
        let result = read_json(&format!("{directory}/parachutist_bisection_result.json"));
        let estimate = result["root"]["estimate"].as_f64().unwrap();
        assert_relative_eq!(estimate, 14.8011, epsilon = 1e-3);
        assert_eq!(result["method"], "bisection");

        let echo = read_json(&format!("{directory}/parachutist_bisection.json"));
        assert!(echo["RootSearch"].get("target").is_some());
        assert!(std::path::Path::new(&format!("{directory}/parachutist_bisection_diagnostics.txt")).exists());
    }

    #[test]
    fn test_definite_integral_run() {
        assert!(run_command(&["run", "./demos/definite_integral/cubic_trapezoid.json"]));
        let result = read_json("out/definite_integral/cubic_trapezoid/cubic_trapezoid_result.json");
        // 1 - 2x + 4x^3 over [-1, 2]
        assert_relative_eq!(result["exact"].as_f64().unwrap(), 15.0, epsilon = 1e-12);
        assert_eq!(result["estimates"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_validate_command() {
        assert!(run_command(&[
            "validate",
            "./demos/projectile/planar_launch.json",
            "./demos/harmonic_oscillator/default_spring.json",
        ]));
        assert!(!run_command(&["validate", "./demos/does_not_exist.json"]));
    }

    #[test]
    fn test_failed_run_exits_with_error() {
        assert!(!run_command(&["run", "./demos/does_not_exist.json"]));
    }
}
