//! Read-only views of a discovered rule set for export.
//!
//! Rules are identified as `R0, R1, ...` in their final list order.

use std::{collections::BTreeMap, fmt::Write as _};

use esmam_data::{CaseSet, CaseStore};
use esmam_stats::{descriptive::DescriptiveStats, logrank, survival::KaplanMeierCurve};
use serde::Serialize;

use crate::{params::Baseline, rule::Rule};

/// Jaccard index over conditions above which two rules count as similarly
/// described.
pub const DESCRIPTION_SIMILARITY: f64 = 0.5;

#[must_use]
pub fn rule_id(index: usize) -> String {
    format!("R{index}")
}

/// Jaccard index of two covers. Two empty covers score 0.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn cover_jaccard(a: &CaseSet, b: &CaseSet) -> f64 {
    let union = a.union_count(b);
    if union == 0 {
        return 0.0;
    }
    a.intersection_count(b) as f64 / union as f64
}

/// One exported rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleSummary {
    pub id: String,
    pub description: String,
    pub antecedent: BTreeMap<String, Vec<String>>,
    pub baseline: Baseline,
    pub num_cases: usize,
    pub fitness: f64,
    pub p_value: f64,
    pub mean_subgroup: Option<f64>,
    pub mean_population: Option<f64>,
    pub mean_complement: Option<f64>,
    /// Kaplan-Meier median survival times, `None` while the curve stays
    /// above 0.5
    pub median_subgroup: Option<f64>,
    pub median_population: Option<f64>,
    pub median_complement: Option<f64>,
    pub size_subgroup: usize,
    pub size_population: usize,
    pub size_complement: usize,
    pub cases: Vec<usize>,
}

impl RuleSummary {
    #[must_use]
    pub fn new(store: &CaseStore, baseline: Baseline, index: usize, rule: &Rule) -> Self {
        let complement = rule.cover().complement();
        let median = |cases: &CaseSet| {
            KaplanMeierCurve::from_observations(store.observations(cases)).median_survival()
        };
        Self {
            id: rule_id(index),
            description: rule.describe(store),
            antecedent: rule.antecedent().to_map(store),
            baseline,
            num_cases: rule.num_cases(),
            fitness: rule.fitness(),
            p_value: rule.p_value(),
            mean_subgroup: store.mean_survival(rule.cover()),
            mean_population: store.mean_survival(&store.all_cases()),
            mean_complement: store.mean_survival(&complement),
            median_subgroup: median(rule.cover()),
            median_population: KaplanMeierCurve::from_observations(
                store.all_observations().iter().copied(),
            )
            .median_survival(),
            median_complement: median(&complement),
            size_subgroup: rule.num_cases(),
            size_population: store.len(),
            size_complement: complement.count(),
            cases: rule.cover().iter().collect(),
        }
    }

    /// Summaries of `rules` in order.
    #[must_use]
    pub fn all(store: &CaseStore, baseline: Baseline, rules: &[Rule]) -> Vec<Self> {
        rules
            .iter()
            .enumerate()
            .map(|(i, rule)| Self::new(store, baseline, i, rule))
            .collect()
    }
}

/// Kaplan-Meier curves of the population and every rule on a common time
/// grid: 0 and each distinct observed time.
#[derive(Debug, Clone, Serialize)]
pub struct SurvivalTable {
    pub times: Vec<f64>,
    pub population: Vec<f64>,
    pub rules: Vec<(String, Vec<f64>)>,
}

impl SurvivalTable {
    #[must_use]
    pub fn new(store: &CaseStore, rules: &[Rule]) -> Self {
        let mut times = store
            .all_observations()
            .iter()
            .map(|obs| obs.time)
            .collect::<Vec<_>>();
        times.push(0.0);
        times.sort_by(f64::total_cmp);
        times.dedup();

        let population =
            KaplanMeierCurve::from_observations(store.all_observations().iter().copied())
                .sample_at(&times);
        let rules = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                let curve = KaplanMeierCurve::from_observations(store.observations(rule.cover()));
                (rule_id(i), curve.sample_at(&times))
            })
            .collect();
        Self {
            times,
            population,
            rules,
        }
    }
}

/// Aggregate quality of a rule set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleSetMetrics {
    pub num_rules: usize,
    /// Mean number of attribute clauses per rule.
    pub length: f64,
    /// Mean cover size as a fraction of the dataset.
    pub rule_coverage: f64,
    /// Standard deviation of the cover fractions.
    pub rule_coverage_std: f64,
    /// Fraction of cases covered by at least one rule.
    pub set_coverage: f64,
}

impl RuleSetMetrics {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new(store: &CaseStore, rules: &[Rule]) -> Self {
        let n = store.len() as f64;
        let lengths =
            DescriptiveStats::new(rules.iter().map(|r| r.antecedent().num_attributes() as f64));
        let covers = DescriptiveStats::new(rules.iter().map(|r| r.num_cases() as f64 / n));
        let (Some(lengths), Some(covers)) = (lengths, covers) else {
            return Self::default();
        };
        let mut union = CaseSet::empty(store.len());
        for rule in rules {
            union.union_with(rule.cover());
        }
        Self {
            num_rules: rules.len(),
            length: lengths.mean,
            rule_coverage: covers.mean,
            rule_coverage_std: covers.std_dev,
            set_coverage: union.count() as f64 / n,
        }
    }
}

/// A representative rule and the not yet listed rules resembling it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarityGroup {
    pub representative: usize,
    pub similar_models: Vec<usize>,
    pub similar_descriptions: Vec<usize>,
}

/// Pairwise similarity of the discovered rules.
///
/// Two rules have similar models when the log-rank test between their covers
/// is not significant at `alpha`, and similar descriptions when the Jaccard
/// index of their conditions reaches [`DESCRIPTION_SIMILARITY`]. The diagonal
/// is always `false`.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityReport {
    pub model: Vec<Vec<bool>>,
    pub description: Vec<Vec<bool>>,
    pub groups: Vec<SimilarityGroup>,
}

impl SimilarityReport {
    #[must_use]
    pub fn new(store: &CaseStore, rules: &[Rule], alpha: f64) -> Self {
        let n = rules.len();
        let mut model = vec![vec![false; n]; n];
        let mut description = vec![vec![false; n]; n];
        for i in 0..n {
            for j in i + 1..n {
                let p = logrank::log_rank_p_value(
                    store.observations(rules[i].cover()),
                    store.observations(rules[j].cover()),
                );
                let m = p >= alpha;
                let d = rules[i].antecedent().jaccard(rules[j].antecedent())
                    >= DESCRIPTION_SIMILARITY;
                (model[i][j], model[j][i]) = (m, m);
                (description[i][j], description[j][i]) = (d, d);
            }
        }

        let mut listed = vec![false; n];
        let mut groups = vec![];
        for i in 0..n {
            if listed[i] {
                continue;
            }
            listed[i] = true;
            let mut take = |row: &[bool]| {
                let mut members = vec![];
                for (j, &similar) in row.iter().enumerate() {
                    if similar && !listed[j] {
                        listed[j] = true;
                        members.push(j);
                    }
                }
                members
            };
            let similar_models = take(&model[i]);
            let similar_descriptions = take(&description[i]);
            groups.push(SimilarityGroup {
                representative: i,
                similar_models,
                similar_descriptions,
            });
        }

        Self {
            model,
            description,
            groups,
        }
    }

    /// Text listing of the groups with size and Jaccard annotations.
    #[must_use]
    pub fn render(&self, store: &CaseStore, rules: &[Rule]) -> String {
        let n = store.len();
        let mut out = String::from("DISCOVERED SUBGROUPS");
        for group in &self.groups {
            let rep = &rules[group.representative];
            write!(
                &mut out,
                "\n\n{}: {} [size={}/{n}]",
                rule_id(group.representative),
                rep.describe(store),
                rep.num_cases()
            )
            .unwrap();
            let tagged = group
                .similar_models
                .iter()
                .map(|&j| ("SM", j))
                .chain(group.similar_descriptions.iter().map(|&j| ("SD", j)));
            for (tag, j) in tagged {
                let rule = &rules[j];
                write!(
                    &mut out,
                    "\n[{tag}] {}: {} [size={}/{n}; jaccard-c={:.2}; jaccard-d={:.2}]",
                    rule_id(j),
                    rule.describe(store),
                    rule.num_cases(),
                    cover_jaccard(rule.cover(), rep.cover()),
                    rule.antecedent().jaccard(rep.antecedent()),
                )
                .unwrap();
            }
        }
        out.push_str(
            "\n\n---------\n\
             [SM] similar model\n\
             [SD] similar description\n\
             [jaccard-c] jaccard index over coverage\n\
             [jaccard-d] jaccard index over description\n",
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use esmam_data::RawTable;

    use super::*;
    use crate::rule::Antecedent;

    const CSV: &str = "\
a,b,t,e
x,p,1,1
x,q,2,1
x,p,3,1
x,q,4,0
y,p,10,1
y,q,11,1
y,p,12,0
y,q,13,1
";

    fn store() -> CaseStore {
        CaseStore::from_table(&RawTable::parse_csv(CSV, "t", "e").unwrap()).unwrap()
    }

    fn rule(store: &CaseStore, terms: &[(&str, &str)]) -> Rule {
        let items = terms.iter().map(|(a, v)| store.find_item(a, v).unwrap());
        Rule::new(store, Baseline::Complement, Antecedent::from_items(store, items))
    }

    #[test]
    fn test_rule_summary() {
        let store = store();
        let summary = RuleSummary::new(&store, Baseline::Complement, 3, &rule(&store, &[("a", "x")]));
        assert_eq!(summary.id, "R3");
        assert_eq!(summary.description, "(a=x)");
        assert_eq!(summary.antecedent["a"], ["x"]);
        assert_eq!(summary.size_subgroup, 4);
        assert_eq!(summary.size_complement, 4);
        assert_eq!(summary.mean_subgroup, Some(2.5));
        assert_eq!(summary.mean_complement, Some(11.5));
        assert_eq!(summary.mean_population, Some(7.0));
        // x: S(1) = 0.75, S(2) = 0.5
        assert!((summary.median_subgroup.unwrap() - 2.0).abs() < 1e-9);
        assert!((summary.median_complement.unwrap() - 11.0).abs() < 1e-9);
        // S(3) = 0.625, S(10) = 0.46875
        assert!((summary.median_population.unwrap() - 8.6).abs() < 1e-9);
        assert_eq!(summary.cases, [0, 1, 2, 3]);
    }

    #[test]
    fn test_survival_table_grid() {
        let store = store();
        let rules = [rule(&store, &[("a", "x")])];
        let table = SurvivalTable::new(&store, &rules);
        assert_eq!(table.times, [0.0, 1.0, 2.0, 3.0, 4.0, 10.0, 11.0, 12.0, 13.0]);
        assert_eq!(table.population[0], 1.0);
        let (id, curve) = &table.rules[0];
        assert_eq!(id, "R0");
        assert_eq!(curve.len(), table.times.len());
        // x: deaths at 1, 2, 3, then censored at 4
        assert!((curve[3] - 0.25).abs() < 1e-12);
        assert!((curve[8] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_metrics() {
        let store = store();
        assert_eq!(RuleSetMetrics::new(&store, &[]), RuleSetMetrics::default());

        let rules = [
            rule(&store, &[("a", "x")]),
            rule(&store, &[("a", "x"), ("b", "p")]),
        ];
        let metrics = RuleSetMetrics::new(&store, &rules);
        assert_eq!(metrics.num_rules, 2);
        assert!((metrics.length - 1.5).abs() < 1e-12);
        assert!((metrics.rule_coverage - 0.375).abs() < 1e-12);
        assert!((metrics.rule_coverage_std - 0.125).abs() < 1e-12);
        assert!((metrics.set_coverage - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_groups() {
        let store = store();
        let rules = [
            rule(&store, &[("a", "x")]),
            rule(&store, &[("a", "y")]),
            rule(&store, &[("a", "x"), ("b", "p")]),
            rule(&store, &[("a", "y"), ("b", "q")]),
        ];
        let report = SimilarityReport::new(&store, &rules, 0.05);
        assert!(report.model[0][2]);
        assert!(!report.model[0][0]);
        assert!(report.description[1][3]);
        assert_eq!(report.groups[0].representative, 0);
        assert!(report.groups[0].similar_models.contains(&2));

        let text = report.render(&store, &rules);
        assert!(text.starts_with("DISCOVERED SUBGROUPS\n\nR0: (a=x) [size=4/8]"));
        assert!(text.contains("R2: (a=x) & (b=p) [size=2/8; jaccard-c=0.50; jaccard-d=0.50]"));
        assert!(text.ends_with("[jaccard-d] jaccard index over description\n"));
        // every rule appears exactly once as a listed line
        for id in ["R0:", "R1:", "R2:", "R3:"] {
            assert_eq!(text.matches(id).count(), 1, "{id}");
        }
    }
}
