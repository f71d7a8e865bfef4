//! Search configuration.

use serde::{Deserialize, Serialize};

/// Survival baseline a subgroup is compared against.
#[derive(
    Default,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Baseline {
    /// The whole dataset, subgroup cases included.
    #[default]
    #[display("population")]
    Population,
    /// Every case outside the subgroup.
    #[display("complement")]
    Complement,
}

/// Invalid search parameter.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("num_ants must be at least 1")]
    NoAnts,
    /// The first ant of a colony already counts as one repetition.
    #[display("rules_to_convergence must be at least 2, got {value}")]
    Convergence { value: usize },
    #[display("min_size_subgroup must be in (0, 1], got {value}")]
    MinSize { value: f64 },
    #[display("cover_weight must be in (0, 1], got {value}")]
    CoverWeight { value: f64 },
    #[display("alpha must be in (0, 1), got {value}")]
    Alpha { value: f64 },
    #[display("logistic_offset must be finite, got {value}")]
    LogisticOffset { value: f64 },
}

/// Parameters of one discovery run.
///
/// Missing fields take their default value when deserialized, so a config file
/// only needs to list what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Ant limit per colony.
    pub num_ants: usize,
    /// Minimum subgroup size as a fraction of the dataset.
    pub min_size_subgroup: f64,
    /// Consecutive equal pruned rules that end a colony.
    pub rules_to_convergence: usize,
    /// Colonies without new coverage tolerated before the search stops.
    pub its_to_stagnation: usize,
    /// Base of the cover-overlap attenuation, in `(0, 1]`.
    pub cover_weight: f64,
    /// Center of the discovery-count attenuation.
    pub logistic_offset: f64,
    /// Significance level of the log-rank test.
    pub alpha: f64,
    pub baseline: Baseline,
    pub seed: u64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            num_ants: 1000,
            min_size_subgroup: 0.1,
            rules_to_convergence: 5,
            its_to_stagnation: 40,
            cover_weight: 0.9,
            logistic_offset: 5.0,
            alpha: 0.05,
            baseline: Baseline::Population,
            seed: 0,
        }
    }
}

impl SearchParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_ants == 0 {
            return Err(ConfigError::NoAnts);
        }
        if self.rules_to_convergence < 2 {
            return Err(ConfigError::Convergence {
                value: self.rules_to_convergence,
            });
        }
        if !(self.min_size_subgroup > 0.0 && self.min_size_subgroup <= 1.0) {
            return Err(ConfigError::MinSize {
                value: self.min_size_subgroup,
            });
        }
        if !(self.cover_weight > 0.0 && self.cover_weight <= 1.0) {
            return Err(ConfigError::CoverWeight {
                value: self.cover_weight,
            });
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::Alpha { value: self.alpha });
        }
        if !self.logistic_offset.is_finite() {
            return Err(ConfigError::LogisticOffset {
                value: self.logistic_offset,
            });
        }
        Ok(())
    }

    /// Minimum number of cases a rule must cover: `ceil(min_size_subgroup * n)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use esmam_search::params::SearchParams;
    ///
    /// let params = SearchParams { min_size_subgroup: 0.1, ..SearchParams::default() };
    /// assert_eq!(params.min_cases_per_rule(95), 10);
    /// assert_eq!(params.min_cases_per_rule(100), 10);
    /// ```
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn min_cases_per_rule(&self, num_cases: usize) -> usize {
        (self.min_size_subgroup * num_cases as f64).ceil() as usize
    }
}
