//! Statistical primitives for survival subgroup discovery.
//!
//! This crate provides the statistical building blocks used by the search and
//! reporting layers:
//!
//! - **Survival curves**: Kaplan-Meier estimator for right-censored time-to-event data
//! - **Survival comparison**: two-sample log-rank test with a chi-square p-value
//! - **Descriptive statistics**: mean, median, variance, standard deviation, etc.
//!
//! # Modules
//!
//! - [`survival`]: Observations and Kaplan-Meier survival curves
//! - [`logrank`]: Log-rank test comparing the survival of two groups
//! - [`special`]: Special functions (`erfc`, chi-square tail) backing the p-values
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//!
//! # Examples
//!
//! ## Estimating a survival curve
//!
//! ```
//! use esmam_stats::survival::{KaplanMeierCurve, Observation};
//!
//! let data = [
//!     Observation::event(10.0),
//!     Observation::censored(20.0),
//!     Observation::event(30.0),
//! ];
//! let curve = KaplanMeierCurve::from_observations(data);
//! assert_eq!(curve.survival_at(5.0), 1.0);
//! ```
//!
//! ## Comparing two groups
//!
//! ```
//! use esmam_stats::{logrank, survival::Observation};
//!
//! let short = (1..=5).map(|t| Observation::event(f64::from(t)));
//! let long = (20..=24).map(|t| Observation::event(f64::from(t)));
//! let p_value = logrank::log_rank_p_value(short, long);
//! assert!(p_value < 0.05);
//! ```

pub mod descriptive;
pub mod logrank;
pub mod special;
pub mod survival;
