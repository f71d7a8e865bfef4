//! Rule-set admission and diversification.
//!
//! A colony's best rule is offered to the discovered set once. The decision
//! compares it with every active rule in order:
//!
//! - an identical rule, or a more specific rule with a similar survival model,
//!   rejects it
//! - a similar but more specific rule already in the set is replaced, provided
//!   the candidate is admissible without it
//! - a similar, partially overlapping rule leads to a derived rule (the root,
//!   i.e. the shared conditions, and/or the merge, i.e. all conditions) that is
//!   itself offered recursively; the candidate survives only if it stays
//!   distinguishable from what got inserted
//!
//! Two rules are *similar* when the log-rank test between their covers is not
//! significant at `alpha`.
//!
//! Recursion is bounded two ways. Replacing a more specific rule re-checks the
//! candidate against a strictly shorter list. Derived rules are checked against
//! the stack of antecedents already under evaluation, and a derived antecedent
//! already on the stack is not admissible.

use esmam_data::CaseStore;

use crate::{
    params::Baseline,
    rule::{Antecedent, Rule},
    rule_set::{RuleId, RuleSet},
};

#[derive(Debug)]
pub struct Admission<'a> {
    store: &'a CaseStore,
    baseline: Baseline,
    alpha: f64,
    pending: Vec<Antecedent>,
}

impl<'a> Admission<'a> {
    #[must_use]
    pub fn new(store: &'a CaseStore, baseline: Baseline, alpha: f64) -> Self {
        Self {
            store,
            baseline,
            alpha,
            pending: vec![],
        }
    }

    /// Offers `candidate` to `rules`, inserting it when admissible.
    ///
    /// Derived rules may be inserted and existing rules removed even when the
    /// candidate itself is rejected.
    pub fn offer(&mut self, rules: &mut RuleSet, candidate: Rule) -> bool {
        self.pending.push(candidate.antecedent().clone());
        let ids = rules.ids();
        let accepted = self.can_add(rules, &candidate, &ids);
        self.pending.pop();
        if accepted {
            tracing::debug!(rule = %candidate.describe(self.store), "rule admitted");
            rules.insert(candidate);
        }
        accepted
    }

    fn similar(&self, a: &Rule, b: &Rule) -> bool {
        !a.is_exceptional(b, self.store, self.alpha)
    }

    fn reject(&self, rule: &Rule, reason: &str) -> bool {
        tracing::debug!(rule = %rule.describe(self.store), reason, "rule rejected");
        false
    }

    fn can_add(&mut self, rules: &mut RuleSet, new_rule: &Rule, list: &[RuleId]) -> bool {
        if new_rule.p_value() >= self.alpha {
            return self.reject(new_rule, "not exceptional");
        }

        for (pos, &id) in list.iter().enumerate() {
            // removed by a nested admission
            if !rules.contains(id) {
                continue;
            }
            let rule = rules.get(id).clone();

            if new_rule.equals(&rule) {
                return self.reject(new_rule, "already discovered");
            }
            if !self.similar(new_rule, &rule) {
                continue;
            }

            let (new_terms, terms) = (new_rule.antecedent(), rule.antecedent());
            if !new_terms.shares_attribute(terms) {
                continue;
            }
            if new_terms.is_in(terms) {
                return self.reject(new_rule, "more specific, same model");
            }
            if terms.is_in(new_terms) {
                let reduced = [&list[..pos], &list[pos + 1..]].concat();
                if self.can_add(rules, new_rule, &reduced) {
                    tracing::debug!(
                        removed = %rule.describe(self.store),
                        by = %new_rule.describe(self.store),
                        "rule generalized"
                    );
                    rules.remove(id);
                    return true;
                }
                return false;
            }

            let has_root = new_terms.has_root(terms);
            let has_merge = new_terms.has_merge(terms);
            match (has_root, has_merge) {
                (false, false) => {}
                (true, true) => {
                    let root = Rule::root(self.store, self.baseline, new_rule, &rule);
                    let merged = Rule::merge(self.store, self.baseline, new_rule, &rule);
                    if self.similar(&root, &merged) {
                        if self.admit_derived(rules, &root) && self.similar(new_rule, &root) {
                            return self.reject(new_rule, "absorbed by root");
                        }
                    } else {
                        let merge_added = self.admit_derived(rules, &merged);
                        let root_added = self.admit_derived(rules, &root);
                        let inserted = [(root_added, &root), (merge_added, &merged)]
                            .into_iter()
                            .filter_map(|(added, derived)| added.then_some(derived))
                            .collect::<Vec<_>>();
                        if !inserted.is_empty()
                            && inserted.iter().all(|derived| self.similar(new_rule, derived))
                        {
                            return self.reject(new_rule, "absorbed by root and merge");
                        }
                    }
                }
                (true, false) | (false, true) => {
                    let derived = if has_root {
                        Rule::root(self.store, self.baseline, new_rule, &rule)
                    } else {
                        Rule::merge(self.store, self.baseline, new_rule, &rule)
                    };
                    if self.admit_derived(rules, &derived) && self.similar(new_rule, &derived) {
                        return self.reject(new_rule, "absorbed by derived rule");
                    }
                }
            }
        }
        true
    }

    /// Recursively checks a root or merge rule and inserts it when admissible.
    fn admit_derived(&mut self, rules: &mut RuleSet, derived: &Rule) -> bool {
        if self.pending.contains(derived.antecedent()) {
            return false;
        }
        self.pending.push(derived.antecedent().clone());
        let ids = rules.ids();
        let admitted = self.can_add(rules, derived, &ids);
        self.pending.pop();
        if admitted {
            tracing::debug!(rule = %derived.describe(self.store), "derived rule admitted");
            rules.insert(derived.clone());
        }
        admitted
    }
}

#[cfg(test)]
mod tests {
    use esmam_data::RawTable;

    use super::*;

    // `a` separates early from late deaths; `b` and `c` split each `a` group
    // evenly.
    const CSV: &str = "\
a,b,c,t,e
x,p,u,1,1
x,p,v,2,1
x,q,u,3,1
x,q,v,4,1
x,p,u,5,1
x,p,v,6,1
x,q,u,7,1
x,q,v,8,1
y,p,u,20,1
y,p,v,21,1
y,q,u,22,1
y,q,v,23,1
y,p,u,24,1
y,p,v,25,1
y,q,u,26,1
y,q,v,27,1
";

    const ALPHA: f64 = 0.05;
    const BASELINE: Baseline = Baseline::Complement;

    // `(a=x) & (b=p)` and `(a=x) & (b=q)` share a model, `(a=x) & (b=r)` is
    // much later, and `a=y` is later still.
    const CSV_THREE_WAY: &str = "\
a,b,t,e
x,p,1,1
x,p,2,1
x,p,3,1
x,p,4,1
x,q,2,1
x,q,3,1
x,q,4,1
x,q,5,1
x,r,10,1
x,r,11,1
x,r,12,1
x,r,13,1
x,r,14,1
x,r,15,1
y,p,40,1
y,q,41,1
y,r,42,1
y,p,43,1
y,q,44,1
y,r,45,1
y,p,46,1
y,q,47,1
y,r,48,1
y,p,49,1
y,q,50,1
y,r,51,1
";

    // Within `a=x`, `(b=p) & (c=u)` dies first and `(b=p)` alone stays close
    // to it, while `a=x` as a whole is distinguishable from both.
    const CSV_NESTED: &str = "\
a,b,c,t,e
x,p,u,1,1
x,p,u,2,1
x,p,u,3,1
x,p,u,4,1
x,p,v,9,1
x,p,v,12,1
x,p,v,14,1
x,p,v,15,1
x,q,u,6,1
x,q,u,9,1
x,q,u,13,1
x,q,u,23,1
x,q,v,15,1
x,q,v,15,1
x,q,v,19,1
x,q,v,23,1
y,p,u,27,1
y,p,u,33,1
y,p,v,22,1
y,p,v,37,1
y,q,u,20,1
y,q,u,26,1
y,q,v,28,1
y,q,v,39,1
";

    fn store() -> CaseStore {
        store_from(CSV)
    }

    fn store_from(csv: &str) -> CaseStore {
        CaseStore::from_table(&RawTable::parse_csv(csv, "t", "e").unwrap()).unwrap()
    }

    fn rule(store: &CaseStore, terms: &[(&str, &str)]) -> Rule {
        rule_with(store, BASELINE, terms)
    }

    fn rule_with(store: &CaseStore, baseline: Baseline, terms: &[(&str, &str)]) -> Rule {
        let items = terms.iter().map(|(a, v)| store.find_item(a, v).unwrap());
        Rule::new(store, baseline, Antecedent::from_items(store, items))
    }

    fn descriptions(store: &CaseStore, rules: &RuleSet) -> Vec<String> {
        rules.iter().map(|r| r.describe(store)).collect()
    }

    #[test]
    fn test_rejects_non_exceptional_candidate() {
        let store = store();
        let mut admission = Admission::new(&store, BASELINE, ALPHA);
        let mut rules = RuleSet::new(store.len());

        let noise = rule(&store, &[("b", "p")]);
        assert!(noise.p_value() >= ALPHA);
        assert!(!admission.offer(&mut rules, noise.clone()));

        assert!(admission.offer(&mut rules, rule(&store, &[("a", "x")])));
        assert!(!admission.offer(&mut rules, noise));
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_identical_rule_rejected() {
        let store = store();
        let mut admission = Admission::new(&store, BASELINE, ALPHA);
        let mut rules = RuleSet::new(store.len());
        let x = rule(&store, &[("a", "x")]);
        assert!(admission.offer(&mut rules, x.clone()));
        assert!(!admission.offer(&mut rules, x));
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.uncovered_count(), 8);
    }

    #[test]
    fn test_distinct_models_coexist() {
        let store = store();
        let mut admission = Admission::new(&store, BASELINE, ALPHA);
        let mut rules = RuleSet::new(store.len());
        assert!(admission.offer(&mut rules, rule(&store, &[("a", "x")])));
        assert!(admission.offer(&mut rules, rule(&store, &[("a", "y")])));
        assert_eq!(descriptions(&store, &rules), ["(a=x)", "(a=y)"]);
        assert_eq!(rules.uncovered_count(), 0);
    }

    #[test]
    fn test_more_specific_rule_with_same_model_rejected() {
        let store = store();
        let mut admission = Admission::new(&store, BASELINE, ALPHA);
        let mut rules = RuleSet::new(store.len());
        assert!(admission.offer(&mut rules, rule(&store, &[("a", "x")])));

        let specific = rule(&store, &[("a", "x"), ("b", "p")]);
        assert!(specific.p_value() < ALPHA);
        assert!(!admission.offer(&mut rules, specific.clone()));
        assert!(!admission.offer(&mut rules, specific));
        assert_eq!(descriptions(&store, &rules), ["(a=x)"]);
    }

    #[test]
    fn test_more_general_rule_replaces_specific_one() {
        let store = store();
        let mut admission = Admission::new(&store, BASELINE, ALPHA);
        let mut rules = RuleSet::new(store.len());
        assert!(admission.offer(&mut rules, rule(&store, &[("a", "x"), ("b", "p")])));
        assert_eq!(rules.uncovered_count(), 12);

        assert!(admission.offer(&mut rules, rule(&store, &[("a", "x")])));
        assert_eq!(descriptions(&store, &rules), ["(a=x)"]);
        assert_eq!(rules.uncovered_count(), 8);
    }

    #[test]
    fn test_partial_overlap_inserts_root() {
        let store = store();
        let mut admission = Admission::new(&store, BASELINE, ALPHA);
        let mut rules = RuleSet::new(store.len());
        assert!(admission.offer(&mut rules, rule(&store, &[("a", "x"), ("b", "p")])));

        // shares `a=x` but constrains another attribute: root only
        let overlapping = rule(&store, &[("a", "x"), ("c", "u")]);
        assert!(overlapping.p_value() < ALPHA);
        assert!(!admission.offer(&mut rules, overlapping));
        assert_eq!(descriptions(&store, &rules), ["(a=x)"]);
        assert_eq!(rules.uncovered_count(), 8);
    }

    #[test]
    fn test_root_preferred_when_merge_has_same_model() {
        let store = store();
        let mut admission = Admission::new(&store, BASELINE, ALPHA);
        let mut rules = RuleSet::new(store.len());
        assert!(admission.offer(&mut rules, rule(&store, &[("a", "x"), ("b", "p")])));

        // same attributes and a shared item: both root and merge exist, and
        // (a=x) & (b=p|q) covers exactly what (a=x) covers
        let sibling = rule(&store, &[("a", "x"), ("b", "q")]);
        assert!(sibling.p_value() < ALPHA);
        assert!(!admission.offer(&mut rules, sibling));
        assert_eq!(descriptions(&store, &rules), ["(a=x)"]);
    }

    #[test]
    fn test_population_baseline_rejects_insignificant_candidate() {
        let store = store();
        let baseline = Baseline::Population;
        let mut admission = Admission::new(&store, baseline, ALPHA);
        let mut rules = RuleSet::new(store.len());

        // a real but weak difference from the population
        let weak = rule_with(&store, baseline, &[("a", "y")]);
        assert!(weak.p_value() >= ALPHA);
        assert!(weak.p_value() < 1.0);
        assert!(!admission.offer(&mut rules, weak.clone()));
        assert!(rules.is_empty());

        let strong = rule_with(&store, baseline, &[("a", "x")]);
        assert!(strong.p_value() < ALPHA);
        assert!(admission.offer(&mut rules, strong));
        assert!(!admission.offer(&mut rules, weak));
        assert_eq!(descriptions(&store, &rules), ["(a=x)"]);
        assert_eq!(rules.uncovered_count(), 8);
    }

    #[test]
    fn test_root_and_merge_both_inserted() {
        let store = store_from(CSV_THREE_WAY);
        let mut admission = Admission::new(&store, BASELINE, ALPHA);
        let mut rules = RuleSet::new(store.len());
        assert!(admission.offer(&mut rules, rule(&store, &[("a", "x"), ("b", "p")])));

        // the merge (b=p|q) differs from the root (a=x), so both go in and
        // the merge replaces the more specific (a=x) & (b=p)
        let sibling = rule(&store, &[("a", "x"), ("b", "q")]);
        assert!(sibling.p_value() < ALPHA);
        assert!(!admission.offer(&mut rules, sibling));
        assert_eq!(descriptions(&store, &rules), ["(a=x) & (b=p|q)", "(a=x)"]);
        assert_eq!(rules.uncovered_count(), 12);
        assert!(admission.pending.is_empty());
    }

    #[test]
    fn test_failed_generalization_keeps_specific_rule() {
        let store = store_from(CSV_NESTED);
        let mut admission = Admission::new(&store, BASELINE, ALPHA);
        let mut rules = RuleSet::new(store.len());
        assert!(admission.offer(&mut rules, rule(&store, &[("a", "x"), ("b", "p"), ("c", "u")])));
        assert!(admission.offer(&mut rules, rule(&store, &[("a", "x")])));
        assert_eq!(rules.len(), 2);

        // generalizes the first rule, but is itself a more specific rule of
        // (a=x) with the same model
        let candidate = rule(&store, &[("a", "x"), ("b", "p")]);
        assert!(candidate.p_value() < ALPHA);
        assert!(!admission.offer(&mut rules, candidate));
        assert_eq!(descriptions(&store, &rules), ["(a=x) & (b=p) & (c=u)", "(a=x)"]);
        assert_eq!(rules.uncovered_count(), 8);
        assert!(admission.pending.is_empty());
    }

    #[test]
    fn test_every_admitted_rule_is_exceptional() {
        let store = store();
        let mut admission = Admission::new(&store, BASELINE, ALPHA);
        let mut rules = RuleSet::new(store.len());
        let items = store.item_ids().collect::<Vec<_>>();
        for &i in &items {
            for &j in &items {
                let candidate = Rule::new(&store, BASELINE, Antecedent::from_items(&store, [i, j]));
                admission.offer(&mut rules, candidate);
            }
        }
        assert!(!rules.is_empty());
        for rule in rules.iter() {
            assert!(rule.p_value() < ALPHA);
            assert!(rule.num_cases() >= 1);
        }
        let antecedents = rules.iter().map(Rule::antecedent).collect::<Vec<_>>();
        for (k, a) in antecedents.iter().enumerate() {
            assert!(!antecedents[k + 1..].contains(a));
        }
        assert!(admission.pending.is_empty());
    }
}
