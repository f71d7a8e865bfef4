//! Two-sample log-rank test.
//!
//! The log-rank test compares the survival distributions of two groups of
//! right-censored observations. At every distinct event time the observed
//! number of events in group A is compared with the number expected under the
//! null hypothesis that both groups share one hazard, and the squared,
//! variance-normalized difference is referred to a chi-square distribution
//! with one degree of freedom.
//!
//! # Degenerate comparisons
//!
//! The test is undefined when one group is empty, when no events occur, or when
//! the hypergeometric variance is zero (e.g. every event happens while only one
//! group is at risk with a single subject). [`LogRankTest::from_groups`] returns
//! `None` in those cases; [`log_rank_p_value`] fails closed with `1.0`.

use crate::{special::chi_squared_sf_1df, survival::Observation};

/// Result of a two-sample log-rank test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRankTest {
    /// Chi-square statistic (1 degree of freedom).
    pub statistic: f64,
    /// Upper tail probability of `statistic`, in `[0, 1]`.
    pub p_value: f64,
    /// Observed number of events in group A.
    pub observed_a: f64,
    /// Expected number of events in group A under the null hypothesis.
    pub expected_a: f64,
}

impl LogRankTest {
    /// Runs the log-rank test between groups `a` and `b`.
    ///
    /// Returns `None` when the comparison is degenerate.
    ///
    /// # Examples
    ///
    /// ```
    /// use esmam_stats::{logrank::LogRankTest, survival::Observation};
    ///
    /// let a = [1.0, 2.0, 3.0].map(Observation::event);
    /// let b = [4.0, 5.0, 6.0].map(Observation::event);
    /// let test = LogRankTest::from_groups(a, b).unwrap();
    /// assert!((test.statistic - 5.0516605).abs() < 1e-6);
    /// assert!(test.p_value < 0.05);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_groups<A, B>(a: A, b: B) -> Option<Self>
    where
        A: IntoIterator<Item = Observation>,
        B: IntoIterator<Item = Observation>,
    {
        let mut data = a
            .into_iter()
            .map(|obs| (obs, true))
            .chain(b.into_iter().map(|obs| (obs, false)))
            .collect::<Vec<_>>();
        let count_a = data.iter().filter(|(_, in_a)| *in_a).count();
        if count_a == 0 || count_a == data.len() {
            return None;
        }

        data.sort_by(|(x, _), (y, _)| x.time.total_cmp(&y.time));

        let mut at_risk = data.len();
        let mut at_risk_a = count_a;
        let mut observed_a = 0.0;
        let mut expected_a = 0.0;
        let mut variance = 0.0;
        let mut total_events = 0;

        let mut i = 0;
        while i < data.len() {
            let current_time = data[i].0.time;
            let (mut count, mut count_a_here, mut events, mut events_a) = (0, 0, 0, 0);
            while i < data.len() && data[i].0.time == current_time {
                let (obs, in_a) = data[i];
                count += 1;
                if in_a {
                    count_a_here += 1;
                }
                if obs.event {
                    events += 1;
                    if in_a {
                        events_a += 1;
                    }
                }
                i += 1;
            }

            if events > 0 {
                let n = at_risk as f64;
                let n_a = at_risk_a as f64;
                let d = f64::from(events);
                let share = n_a / n;
                expected_a += d * share;
                observed_a += f64::from(events_a);
                if at_risk > 1 {
                    variance += d * share * (1.0 - share) * (n - d) / (n - 1.0);
                }
                total_events += events;
            }

            at_risk -= count;
            at_risk_a -= count_a_here;
        }

        if total_events == 0 || !variance.is_finite() || variance <= 0.0 {
            return None;
        }

        let statistic = (observed_a - expected_a).powi(2) / variance;
        Some(Self {
            statistic,
            p_value: chi_squared_sf_1df(statistic),
            observed_a,
            expected_a,
        })
    }

    /// Runs the log-rank test over labeled observations.
    ///
    /// Exactly two distinct labels must be present; the group of the first
    /// label encountered becomes group A. Returns `None` otherwise, or when the
    /// comparison is degenerate.
    ///
    /// # Examples
    ///
    /// ```
    /// use esmam_stats::{logrank::LogRankTest, survival::Observation};
    ///
    /// let labeled = [
    ///     (Observation::event(1.0), "sg"),
    ///     (Observation::event(2.0), "sg"),
    ///     (Observation::event(8.0), "pop"),
    ///     (Observation::event(9.0), "pop"),
    /// ];
    /// assert!(LogRankTest::from_labeled(labeled).is_some());
    /// assert!(LogRankTest::from_labeled([(Observation::event(1.0), "sg")]).is_none());
    /// ```
    #[must_use]
    pub fn from_labeled<I, G>(labeled: I) -> Option<Self>
    where
        I: IntoIterator<Item = (Observation, G)>,
        G: PartialEq,
    {
        let mut labels: Vec<G> = Vec::with_capacity(2);
        let mut a = vec![];
        let mut b = vec![];
        for (obs, label) in labeled {
            let idx = if let Some(idx) = labels.iter().position(|l| *l == label) {
                idx
            } else {
                if labels.len() == 2 {
                    return None;
                }
                labels.push(label);
                labels.len() - 1
            };
            if idx == 0 {
                a.push(obs);
            } else {
                b.push(obs);
            }
        }
        Self::from_groups(a, b)
    }
}

/// Log-rank p-value between groups `a` and `b`, `1.0` when degenerate.
///
/// # Examples
///
/// ```
/// use esmam_stats::{logrank, survival::Observation};
///
/// let same = [1.0, 2.0, 3.0].map(Observation::event);
/// assert_eq!(logrank::log_rank_p_value(same, same), 1.0);
///
/// let censored_only = [1.0, 2.0].map(Observation::censored);
/// assert_eq!(logrank::log_rank_p_value(censored_only, censored_only), 1.0);
/// ```
#[must_use]
pub fn log_rank_p_value<A, B>(a: A, b: B) -> f64
where
    A: IntoIterator<Item = Observation>,
    B: IntoIterator<Item = Observation>,
{
    LogRankTest::from_groups(a, b).map_or(1.0, |test| test.p_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_computed_statistic() {
        // E_a = 0.5 + 0.4 + 0.25, V = 0.25 + 0.24 + 0.1875
        let a = [1.0, 2.0, 3.0].map(Observation::event);
        let b = [4.0, 5.0, 6.0].map(Observation::event);
        let test = LogRankTest::from_groups(a, b).unwrap();

        assert!((test.observed_a - 3.0).abs() < 1e-12);
        assert!((test.expected_a - 1.15).abs() < 1e-12);
        assert!((test.statistic - 3.4225 / 0.6775).abs() < 1e-9);
        assert!((test.p_value - 0.024_602_35).abs() < 1e-6);
    }

    #[test]
    fn test_symmetric_in_groups() {
        let a = [1.0, 3.0, 7.0, 9.0].map(Observation::event);
        let b = [
            Observation::event(2.0),
            Observation::censored(4.0),
            Observation::event(12.0),
        ];
        let ab = LogRankTest::from_groups(a, b).unwrap();
        let ba = LogRankTest::from_groups(b, a).unwrap();
        assert!((ab.statistic - ba.statistic).abs() < 1e-9);
        assert!((ab.p_value - ba.p_value).abs() < 1e-12);
    }

    #[test]
    fn test_empty_group_is_degenerate() {
        let a = [1.0, 2.0].map(Observation::event);
        assert!(LogRankTest::from_groups(a, []).is_none());
        assert!(LogRankTest::from_groups([], a).is_none());
        assert_eq!(log_rank_p_value(a, []), 1.0);
    }

    #[test]
    fn test_no_events_is_degenerate() {
        let a = [1.0, 2.0].map(Observation::censored);
        let b = [3.0, 4.0].map(Observation::censored);
        assert!(LogRankTest::from_groups(a, b).is_none());
    }

    #[test]
    fn test_single_subject_groups_are_degenerate() {
        // the only event happens with a single subject at risk
        let a = [Observation::censored(1.0)];
        let b = [Observation::event(2.0)];
        assert!(LogRankTest::from_groups(a, b).is_none());
    }

    #[test]
    fn test_overlapping_groups_share_cases() {
        // a subgroup compared against a population that contains it
        let sub = [1.0, 2.0, 3.0].map(Observation::event);
        let population = [1.0, 2.0, 3.0, 10.0, 11.0, 12.0].map(Observation::event);
        let p = log_rank_p_value(sub, population);
        assert!(p > 0.0 && p < 1.0);
    }

    #[test]
    fn test_p_value_in_unit_interval() {
        for shift in 0..10 {
            let a = (0..8).map(|t| Observation::event(f64::from(t)));
            let b = (0..8).map(move |t| Observation::new(f64::from(t + shift), t % 3 != 0));
            let p = log_rank_p_value(a, b);
            assert!((0.0..=1.0).contains(&p), "p = {p}");
        }
    }

    #[test]
    fn test_labeled_three_labels_rejected() {
        let labeled = [
            (Observation::event(1.0), 0),
            (Observation::event(2.0), 1),
            (Observation::event(3.0), 2),
        ];
        assert!(LogRankTest::from_labeled(labeled).is_none());
    }

    #[test]
    fn test_labeled_matches_groups() {
        let labeled = [
            (Observation::event(1.0), 'a'),
            (Observation::event(4.0), 'b'),
            (Observation::event(2.0), 'a'),
            (Observation::event(5.0), 'b'),
            (Observation::event(3.0), 'a'),
            (Observation::event(6.0), 'b'),
        ];
        let from_labeled = LogRankTest::from_labeled(labeled).unwrap();
        let from_groups = LogRankTest::from_groups(
            [1.0, 2.0, 3.0].map(Observation::event),
            [4.0, 5.0, 6.0].map(Observation::event),
        )
        .unwrap();
        assert_eq!(from_labeled, from_groups);
    }
}
