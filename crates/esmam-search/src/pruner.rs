//! Greedy backward elimination of attribute clauses.

use esmam_data::CaseStore;

use crate::{params::Baseline, rule::Rule};

#[derive(Debug, Clone, Copy)]
pub struct Pruner<'a> {
    store: &'a CaseStore,
    baseline: Baseline,
}

impl<'a> Pruner<'a> {
    #[must_use]
    pub fn new(store: &'a CaseStore, baseline: Baseline) -> Self {
        Self { store, baseline }
    }

    /// Removes clauses while that does not lower fitness.
    ///
    /// Each round evaluates dropping every clause and commits the best removal
    /// whose fitness is at least the current one. Among equally good removals
    /// the last attribute wins. Stops at a single clause or when every removal
    /// would lower fitness.
    #[must_use]
    pub fn prune(&self, mut rule: Rule) -> Rule {
        while rule.antecedent().num_attributes() > 1 {
            let mut best: Option<Rule> = None;
            for attribute in rule.antecedent().attributes() {
                let candidate = Rule::new(
                    self.store,
                    self.baseline,
                    rule.antecedent().without_attribute(attribute),
                );
                let threshold = best.as_ref().unwrap_or(&rule).fitness();
                if candidate.fitness() >= threshold {
                    best = Some(candidate);
                }
            }
            let Some(pruned) = best else {
                break;
            };
            tracing::trace!(
                from = %rule.describe(self.store),
                to = %pruned.describe(self.store),
                fitness = pruned.fitness(),
                "pruned clause"
            );
            rule = pruned;
        }
        rule
    }
}

#[cfg(test)]
mod tests {
    use esmam_data::RawTable;

    use super::*;
    use crate::rule::Antecedent;

    const CSV: &str = "\
a,b,c,t,e
x,p,u,1,1
x,q,v,2,1
x,p,u,3,1
x,q,v,4,1
y,p,v,10,1
y,q,u,11,1
y,p,v,12,1
y,q,u,13,1
";

    fn store() -> CaseStore {
        CaseStore::from_table(&RawTable::parse_csv(CSV, "t", "e").unwrap()).unwrap()
    }

    fn rule(store: &CaseStore, terms: &[(&str, &str)]) -> Rule {
        let items = terms.iter().map(|(a, v)| store.find_item(a, v).unwrap());
        Rule::new(store, Baseline::Complement, Antecedent::from_items(store, items))
    }

    #[test]
    fn test_prunes_noise_clauses() {
        let store = store();
        let pruner = Pruner::new(&store, Baseline::Complement);
        let original = rule(&store, &[("a", "x"), ("b", "p"), ("c", "u")]);
        let pruned = pruner.prune(original.clone());

        assert_eq!(pruned.describe(&store), "(a=x)");
        assert!(pruned.fitness() >= original.fitness());
        assert!(pruned.num_cases() >= original.num_cases());
        assert!(original.cover().is_subset(pruned.cover()));
    }

    #[test]
    fn test_single_clause_is_untouched() {
        let store = store();
        let pruner = Pruner::new(&store, Baseline::Complement);
        let single = rule(&store, &[("b", "p")]);
        assert_eq!(pruner.prune(single.clone()), single);

        let empty = Rule::empty(&store);
        assert_eq!(pruner.prune(empty.clone()), empty);
    }

    #[test]
    fn test_cover_never_shrinks() {
        let store = store();
        let pruner = Pruner::new(&store, Baseline::Population);
        let items = store.item_ids().collect::<Vec<_>>();
        for &i in &items {
            for &j in &items {
                for &k in &items {
                    let antecedent = Antecedent::from_items(&store, [i, j, k]);
                    let original = Rule::new(&store, Baseline::Population, antecedent);
                    let pruned = pruner.prune(original.clone());
                    assert!(pruned.num_cases() >= original.num_cases());
                    assert!(pruned.fitness() >= original.fitness());
                }
            }
        }
    }
}
