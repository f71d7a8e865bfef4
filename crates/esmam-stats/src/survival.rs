use std::cmp::Ordering;

/// A single right-censored survival observation.
///
/// `event` is `true` when the event of interest was observed at `time`, and
/// `false` when the observation was censored (the case left the study at `time`
/// without the event being observed).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Survival (or censoring) time. Expected to be finite and non-negative.
    pub time: f64,
    /// Whether the event was observed.
    pub event: bool,
}

impl Observation {
    #[must_use]
    pub fn new(time: f64, event: bool) -> Self {
        Self { time, event }
    }

    /// An observation whose event occurred at `time`.
    #[must_use]
    pub fn event(time: f64) -> Self {
        Self::new(time, true)
    }

    /// An observation censored at `time`.
    #[must_use]
    pub fn censored(time: f64) -> Self {
        Self::new(time, false)
    }
}

/// Sorts observations by time, ascending.
pub(crate) fn sort_by_time(data: &mut [Observation]) {
    data.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));
}

/// Kaplan-Meier survival curve for survival analysis.
///
/// The Kaplan-Meier estimator is a non-parametric statistic used to estimate the survival
/// function from lifetime data. It accounts for censored data (observations where the event
/// of interest has not occurred by the end of the study period).
///
/// # Fields
///
/// The curve stores parallel vectors representing the survival function at discrete time points:
/// - Time points where events occurred
/// - Survival probability at each time point
/// - Number of subjects at risk at each time point
/// - Number of events (non-censored observations) at each time point
#[derive(Debug, Clone, Default)]
pub struct KaplanMeierCurve {
    /// Time points where events (non-censored observations) occurred.
    pub times: Vec<f64>,
    /// Survival probability at each corresponding time point.
    /// Values range from 0.0 (no survival) to 1.0 (complete survival).
    pub survival_prob: Vec<f64>,
    /// Number of subjects at risk (not yet experienced the event or censored) at each time point.
    pub at_risk: Vec<usize>,
    /// Number of events (non-censored observations) that occurred at each time point.
    pub events: Vec<usize>,
}

impl KaplanMeierCurve {
    /// Computes the Kaplan-Meier survival curve from survival observations.
    ///
    /// # Examples
    ///
    /// ```
    /// # use esmam_stats::survival::{KaplanMeierCurve, Observation};
    /// let data = [
    ///     Observation::event(10.0),
    ///     Observation::censored(20.0),
    ///     Observation::event(30.0),
    /// ];
    /// let curve = KaplanMeierCurve::from_observations(data);
    /// assert_eq!(curve.times, vec![10.0, 30.0]);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_observations<I>(data: I) -> Self
    where
        I: IntoIterator<Item = Observation>,
    {
        let mut data = data.into_iter().collect::<Vec<_>>();
        if data.is_empty() {
            return Self::default();
        }
        sort_by_time(&mut data);

        let mut curve = Self::default();
        let mut current_survival = 1.0;
        let total = data.len();

        let mut i = 0;
        while i < data.len() {
            let current_time = data[i].time;
            let at_risk = total - i;

            let mut event_count = 0;
            let mut j = i;
            while j < data.len() && data[j].time == current_time {
                if data[j].event {
                    event_count += 1;
                }
                j += 1;
            }

            if event_count > 0 {
                let survival_rate = 1.0 - (event_count as f64 / at_risk as f64);
                current_survival *= survival_rate;

                curve.times.push(current_time);
                curve.survival_prob.push(current_survival);
                curve.at_risk.push(at_risk);
                curve.events.push(event_count);
            }

            i = j;
        }

        curve
    }

    /// Returns the median survival time.
    ///
    /// The median survival time is the first time at which the survival
    /// probability drops to or below 50%, linearly interpolated between the
    /// surrounding event times. Returns `None` if the curve never reaches 50%.
    ///
    /// # Examples
    ///
    /// ```
    /// # use esmam_stats::survival::{KaplanMeierCurve, Observation};
    /// let data = [10.0, 20.0, 30.0].map(Observation::event);
    /// let curve = KaplanMeierCurve::from_observations(data);
    /// assert!(curve.median_survival().is_some());
    /// ```
    #[must_use]
    pub fn median_survival(&self) -> Option<f64> {
        let i = self.survival_prob.iter().position(|&s| s <= 0.5)?;
        if i == 0 {
            return Some(self.times[0]);
        }
        let (t0, t1) = (self.times[i - 1], self.times[i]);
        let (s0, s1) = (self.survival_prob[i - 1], self.survival_prob[i]);
        Some(t0 + (0.5 - s0) / (s1 - s0) * (t1 - t0))
    }

    /// Returns the survival probability at a specific time.
    ///
    /// This is a right-continuous step function: the probability stays constant
    /// between event times and drops at each event time. Before the first event
    /// the survival probability is `1.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use esmam_stats::survival::{KaplanMeierCurve, Observation};
    /// let data = [10.0, 20.0].map(Observation::event);
    /// let curve = KaplanMeierCurve::from_observations(data);
    ///
    /// assert_eq!(curve.survival_at(5.0), 1.0);
    /// assert_eq!(curve.survival_at(10.0), 0.5);
    /// assert_eq!(curve.survival_at(25.0), 0.0);
    /// ```
    #[must_use]
    pub fn survival_at(&self, time: f64) -> f64 {
        let idx = self.times.partition_point(|&t| t <= time);
        if idx == 0 {
            1.0
        } else {
            self.survival_prob[idx - 1]
        }
    }

    /// Evaluates the step function at each of the given time points.
    #[must_use]
    pub fn sample_at(&self, times: &[f64]) -> Vec<f64> {
        times.iter().map(|&t| self.survival_at(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_curve() {
        let curve = KaplanMeierCurve::from_observations([]);
        assert!(curve.times.is_empty());
        assert_eq!(curve.survival_at(100.0), 1.0);
        assert_eq!(curve.median_survival(), None);
    }

    #[test]
    fn test_censoring_reduces_risk_set_without_drop() {
        let data = [
            Observation::event(1.0),
            Observation::censored(2.0),
            Observation::event(3.0),
            Observation::event(4.0),
        ];
        let curve = KaplanMeierCurve::from_observations(data);

        assert_eq!(curve.times, vec![1.0, 3.0, 4.0]);
        assert_eq!(curve.at_risk, vec![4, 2, 1]);
        assert!((curve.survival_prob[0] - 0.75).abs() < 1e-12);
        assert!((curve.survival_prob[1] - 0.375).abs() < 1e-12);
        assert!(curve.survival_prob[2].abs() < 1e-12);
    }

    #[test]
    fn test_tied_event_times() {
        let data = [2.0, 2.0, 5.0, 5.0].map(Observation::event);
        let curve = KaplanMeierCurve::from_observations(data);

        assert_eq!(curve.times, vec![2.0, 5.0]);
        assert_eq!(curve.events, vec![2, 2]);
        assert!((curve.survival_at(3.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_unsorted_input() {
        let data = [30.0, 10.0, 20.0].map(Observation::event);
        let curve = KaplanMeierCurve::from_observations(data);
        assert_eq!(curve.times, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_all_censored() {
        let data = [1.0, 2.0, 3.0].map(Observation::censored);
        let curve = KaplanMeierCurve::from_observations(data);
        assert!(curve.times.is_empty());
        assert_eq!(curve.survival_at(10.0), 1.0);
    }

    #[test]
    fn test_median_interpolation() {
        // S(10) = 0.75, S(20) = 0.5 -> median reached exactly at 20
        let data = [10.0, 20.0, 30.0, 40.0].map(Observation::event);
        let curve = KaplanMeierCurve::from_observations(data);
        let median = curve.median_survival().unwrap();
        assert!((median - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_at() {
        let data = [10.0, 20.0].map(Observation::event);
        let curve = KaplanMeierCurve::from_observations(data);
        assert_eq!(curve.sample_at(&[0.0, 15.0, 20.0]), vec![1.0, 0.5, 0.0]);
    }
}
