//! Fixed-step quadrature of functions with known antiderivatives, one estimate per rule.

use serde::{Deserialize, Serialize};

use crate::core::error::{NumericsError, NumericsResult};
use crate::core::numeric::{ensure_finite, ensure_positive};
use crate::core::quadrature::{cumulative_integral, integrate, QuadratureRule};

use super::common::Scenario;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Integrand {
    Sine,
    Cosine,
    Exponential { rate: f64 }, // exp(rate * x)
    /// `c0 + c1 x + c2 x^2 + ...`
    Polynomial { coefficients: Vec<f64> },
}

impl Integrand {
    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            Integrand::Sine => x.sin(),
            Integrand::Cosine => x.cos(),
            Integrand::Exponential { rate } => (rate * x).exp(),
            Integrand::Polynomial { coefficients } => coefficients
                .iter()
                .rev()
                .fold(0.0, |total, coefficient| total * x + coefficient),
        }
    }

    pub fn antiderivative(&self, x: f64) -> f64 {
        match self {
            Integrand::Sine => -x.cos(),
            Integrand::Cosine => x.sin(),
            Integrand::Exponential { rate } => {
                if *rate == 0.0 {
                    x
                } else {
                    (rate * x).exp() / rate
                }
            }
            Integrand::Polynomial { coefficients } => {
                coefficients
                    .iter()
                    .enumerate()
                    .rev()
                    .fold(0.0, |total, (power, coefficient)| {
                        total * x + coefficient / ((power + 1) as f64)
                    })
                    * x
            }
        }
    }

    pub fn exact(&self, lower: f64, upper: f64) -> f64 {
        self.antiderivative(upper) - self.antiderivative(lower)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DefiniteIntegralParams {
    pub integrand: Integrand,
    pub lower: f64,
    pub upper: f64,
    pub step: f64,
    #[serde(default = "all_rules")]
    pub rules: Vec<QuadratureRule>,
    #[serde(default)]
    pub cumulative: Option<QuadratureRule>, // also report the running integral with this rule
}

fn all_rules() -> Vec<QuadratureRule> {
    QuadratureRule::ALL.to_vec()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RuleEstimate {
    pub rule: QuadratureRule,
    pub estimate: f64,
    pub absolute_error: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DefiniteIntegralReport {
    pub exact: f64,
    pub estimates: Vec<RuleEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cumulative: Option<Vec<(f64, f64)>>,
}

impl Scenario for DefiniteIntegralParams {
    type Report = DefiniteIntegralReport;

    fn validate(&self) -> NumericsResult<()> {
        ensure_finite(self.lower, "lower")?;
        ensure_finite(self.upper, "upper")?;
        ensure_positive(self.step, "step")?;
        if self.upper < self.lower {
            return Err(NumericsError::invalid_argument(format!(
                "upper bound {} is below lower bound {}",
                self.upper, self.lower
            )));
        }
        if self.rules.is_empty() {
            return Err(NumericsError::invalid_argument("rules is empty"));
        }
        match &self.integrand {
            Integrand::Exponential { rate } => {
                ensure_finite(*rate, "rate")?;
            }
            Integrand::Polynomial { coefficients } => {
                for &coefficient in coefficients {
                    ensure_finite(coefficient, "coefficient")?;
                }
            }
            Integrand::Sine | Integrand::Cosine => {}
        }
        Ok(())
    }

    fn run(&self) -> NumericsResult<DefiniteIntegralReport> {
        self.validate()?;
        let f = |x: f64| self.integrand.evaluate(x);
        let exact = self.integrand.exact(self.lower, self.upper);

        let estimates = self
            .rules
            .iter()
            .map(|&rule| {
                let estimate = integrate(&f, self.lower, self.upper, self.step, rule)?;
                tracing::info!(
                    "{rule}: {estimate} (exact {exact}, error {:.3e})",
                    (estimate - exact).abs()
                );
                Ok(RuleEstimate {
                    rule,
                    estimate,
                    absolute_error: (estimate - exact).abs(),
                })
            })
            .collect::<NumericsResult<Vec<_>>>()?;

        let cumulative = self
            .cumulative
            .map(|rule| cumulative_integral(&f, self.lower, self.upper, self.step, rule))
            .transpose()?;

        Ok(DefiniteIntegralReport {
            exact,
            estimates,
            cumulative,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use more_asserts::assert_lt;

    #[test]
    fn polynomial_evaluation_and_antiderivative() {
        let cubic = Integrand::Polynomial {
            coefficients: vec![1.0, -2.0, 0.0, 4.0],
        };
        assert_relative_eq!(cubic.evaluate(2.0), 1.0 - 4.0 + 32.0);
        assert_relative_eq!(cubic.antiderivative(2.0), 2.0 - 4.0 + 16.0);
        assert_eq!(cubic.antiderivative(0.0), 0.0);
        let empty = Integrand::Polynomial {
            coefficients: vec![],
        };
        assert_eq!(empty.exact(0.0, 5.0), 0.0);
    }

    #[test]
    fn exact_values() {
        use std::f64::consts::PI;
        assert_relative_eq!(Integrand::Sine.exact(0.0, PI), 2.0, epsilon = 1e-12);
        assert_relative_eq!(Integrand::Cosine.exact(0.0, PI / 2.0), 1.0, epsilon = 1e-12);
        let growth = Integrand::Exponential { rate: 2.0 };
        assert_relative_eq!(growth.exact(0.0, 1.0), (2f64.exp() - 1.0) / 2.0, epsilon = 1e-12);
        let flat = Integrand::Exponential { rate: 0.0 };
        assert_relative_eq!(flat.exact(1.0, 4.0), 3.0);
    }

    #[test]
    fn all_rules_by_default() {
        let params: DefiniteIntegralParams = serde_json::from_str(
            r#"{ "integrand": "sine", "lower": 0.0, "upper": 3.141592653589793, "step": 0.01 }"#,
        )
        .unwrap();
        let report = params.run().unwrap();
        assert_eq!(report.estimates.len(), 4);
        assert!(report.cumulative.is_none());
        for estimate in &report.estimates {
            assert_lt!(estimate.absolute_error, 1e-3);
        }
        let mid = &report.estimates[2];
        let trapezoid = &report.estimates[3];
        assert_eq!(mid.rule, QuadratureRule::Mid);
        assert_lt!(mid.absolute_error, trapezoid.absolute_error);
    }

    #[test]
    fn trapezoid_is_exact_for_a_line() {
        let params = DefiniteIntegralParams {
            integrand: Integrand::Polynomial {
                coefficients: vec![1.0, 2.0],
            },
            lower: 0.0,
            upper: 3.0,
            step: 0.25,
            rules: vec![QuadratureRule::Trapezoid],
            cumulative: Some(QuadratureRule::Trapezoid),
        };
        let report = params.run().unwrap();
        assert_relative_eq!(report.exact, 12.0);
        assert_relative_eq!(report.estimates[0].estimate, 12.0, epsilon = 1e-12);
        let cumulative = report.cumulative.unwrap();
        assert_eq!(cumulative.len(), 13);
        for &(x, total) in &cumulative {
            assert_relative_eq!(total, x + x * x, epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_reversed_bounds() {
        let params = DefiniteIntegralParams {
            integrand: Integrand::Cosine,
            lower: 1.0,
            upper: 0.0,
            step: 0.1,
            rules: all_rules(),
            cumulative: None,
        };
        assert!(params.run().is_err());
    }
}
