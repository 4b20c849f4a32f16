/// Numeric options consumed by the differentiation core.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Iteration cap for forward and adjoint fixed-point loops (default: 100).
    pub fixed_point_max_iterations: usize,
    /// Stop a fixed-point loop once successive iterates differ by at most this (default: 1e-8).
    pub fixed_point_epsilon: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            fixed_point_max_iterations: 100,
            fixed_point_epsilon: 1e-8,
        }
    }
}

impl Config {
    pub fn with_fixed_point_max_iterations(mut self, n: usize) -> Self {
        self.fixed_point_max_iterations = n;
        self
    }

    pub fn with_fixed_point_epsilon(mut self, eps: f64) -> Self {
        self.fixed_point_epsilon = eps;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let c = Config::default()
            .with_fixed_point_max_iterations(7)
            .with_fixed_point_epsilon(1e-3);
        assert_eq!(c.fixed_point_max_iterations, 7);
        assert_eq!(c.fixed_point_epsilon, 1e-3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn missing_fields_take_defaults() {
        let c: Config = serde_json::from_str(r#"{"fixed_point_max_iterations": 5}"#).unwrap();
        assert_eq!(c.fixed_point_max_iterations, 5);
        assert_eq!(c.fixed_point_epsilon, Config::default().fixed_point_epsilon);
    }
}
