//! Pheromone and heuristic bookkeeping over all terms.
//!
//! [`TermsManager`] owns one [`Term`] per catalog item together with the
//! per-term tables the ants read and write:
//!
//! - **pheromone**: reset to `1/|terms|` at the start of every colony,
//!   reinforced after every ant and kept L1-normalized
//! - **heuristic**: raw separation score times both attenuation factors,
//!   L1-normalized, recomputed once per colony
//! - **usage**: how often each term was committed by an ant this colony
//! - **discoveries**: how often each term appeared in a colony's best rule,
//!   over the whole run
//!
//! Attribute availability tracks which attributes the rule under construction
//! already uses. It is reset after every pheromone update.

use esmam_data::{AttributeId, CaseSet, CaseStore, CoverCounts, ItemId};
use rand::{Rng, distr::Distribution as _, distr::weighted::WeightedIndex};

use crate::{
    rule::Antecedent,
    term::{Term, cover_attenuation, discovery_attenuation},
};

/// Normalizes `values` to sum to 1.0 (L1 normalization).
///
/// Returns `false` and leaves `values` unchanged when the sum is not positive.
///
/// # Examples
///
/// ```
/// use esmam_search::terms::normalize_l1;
///
/// let mut values = vec![1.0, 3.0];
/// assert!(normalize_l1(&mut values));
/// assert_eq!(values, vec![0.25, 0.75]);
///
/// let mut zeros = vec![0.0, 0.0];
/// assert!(!normalize_l1(&mut zeros));
/// ```
pub fn normalize_l1(values: &mut [f64]) -> bool {
    let sum: f64 = values.iter().copied().sum();
    if sum > 0.0 {
        for v in values {
            *v /= sum;
        }
        true
    } else {
        false
    }
}

#[derive(Debug, Clone)]
pub struct TermsManager {
    terms: Vec<Term>,
    pheromone: Vec<f64>,
    heuristic: Vec<f64>,
    usage: Vec<u32>,
    discoveries: Vec<u32>,
    available: Vec<bool>,
    min_cases: usize,
}

impl TermsManager {
    /// Creates one term per catalog item, with heuristics computed over the
    /// full case set.
    #[must_use]
    pub fn new(store: &CaseStore, min_cases: usize) -> Self {
        let terms = store
            .item_ids()
            .map(|item| Term::new(store, item))
            .collect::<Vec<_>>();
        let n = terms.len();
        let mut manager = Self {
            terms,
            pheromone: vec![0.0; n],
            heuristic: vec![0.0; n],
            usage: vec![0; n],
            discoveries: vec![0; n],
            available: vec![true; store.num_attributes()],
            min_cases,
        };
        manager.pheromone_init();
        manager.update_heuristics(store, &CoverCounts::new(store.len()), 1.0, f64::INFINITY);
        manager
    }

    #[must_use]
    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    #[must_use]
    pub fn term(&self, item: ItemId) -> &Term {
        &self.terms[item.index()]
    }

    #[must_use]
    pub fn min_cases(&self) -> usize {
        self.min_cases
    }

    /// Starts a new colony: uniform pheromone, zeroed usage counters, every
    /// attribute available.
    #[expect(clippy::cast_precision_loss)]
    pub fn pheromone_init(&mut self) {
        let initial = 1.0 / self.terms.len() as f64;
        self.pheromone.fill(initial);
        self.usage.fill(0);
        self.available.fill(true);
    }

    /// Recomputes the normalized heuristic table from the cases `counts`
    /// reports as uncovered.
    ///
    /// Returns `false` when the table sums to zero, meaning no term can seed a
    /// rule any more.
    pub fn update_heuristics(
        &mut self,
        store: &CaseStore,
        counts: &CoverCounts,
        cover_weight: f64,
        logistic_offset: f64,
    ) -> bool {
        let uncovered = counts.uncovered();
        let Some(threshold) = store.mean_survival(&uncovered) else {
            self.heuristic.fill(0.0);
            return false;
        };
        for (term, heuristic) in self.terms.iter_mut().zip(&mut self.heuristic) {
            term.update_heuristic(store, &uncovered, threshold, self.min_cases);
            let discovered = self.discoveries[term.item().index()];
            *heuristic = term.heuristic()
                * discovery_attenuation(discovered, logistic_offset)
                * cover_attenuation(store.coverage(term.item()), counts, cover_weight);
        }
        normalize_l1(&mut self.heuristic)
    }

    /// Whether any attribute is still free for the rule under construction.
    #[must_use]
    pub fn has_available(&self) -> bool {
        self.available.iter().any(|&a| a)
    }

    #[must_use]
    pub fn is_available(&self, attribute: AttributeId) -> bool {
        self.available[attribute.index()]
    }

    pub fn mark_attribute_used(&mut self, attribute: AttributeId) {
        self.available[attribute.index()] = false;
    }

    /// Draws the next term for a rule whose current cover is `cover`.
    ///
    /// Candidates are the items of available attributes that occur in at least
    /// one case of `cover`, weighted by `heuristic * pheromone`. NaN weights
    /// count as zero. Returns `None` if no candidate has positive weight.
    pub fn sample_next_term<R>(
        &self,
        store: &CaseStore,
        cover: &CaseSet,
        rng: &mut R,
    ) -> Option<&Term>
    where
        R: Rng + ?Sized,
    {
        let reachable = store.items_covering(cover);
        let candidates = self
            .terms
            .iter()
            .filter(|term| self.is_available(term.attribute()))
            .filter(|term| reachable.contains(term.item().index()))
            .collect::<Vec<_>>();
        let weights = candidates.iter().map(|term| {
            let i = term.item().index();
            let score = self.heuristic[i] * self.pheromone[i];
            if score.is_nan() { 0.0 } else { score }
        });
        let dist = WeightedIndex::new(weights).ok()?;
        let term = candidates[dist.sample(rng)];
        tracing::trace!(
            candidates = candidates.len(),
            item = %store.item_label(term.item()),
            "sampled term"
        );
        Some(term)
    }

    /// Counts one committed use of `item` by the current colony's ants.
    pub fn record_usage(&mut self, item: ItemId) {
        self.usage[item.index()] += 1;
    }

    /// Reinforces the terms of `antecedent` by `pheromone * fitness`,
    /// renormalizes the table and frees every attribute for the next ant.
    pub fn pheromone_update(&mut self, antecedent: &Antecedent, fitness: f64) {
        for item in antecedent.items() {
            let p = &mut self.pheromone[item.index()];
            *p += *p * fitness;
        }
        normalize_l1(&mut self.pheromone);
        self.available.fill(true);
    }

    /// Counts the terms of a colony's best rule as discovered once more.
    pub fn record_discovery(&mut self, antecedent: &Antecedent) {
        for item in antecedent.items() {
            self.discoveries[item.index()] += 1;
        }
    }

    #[must_use]
    pub fn pheromone(&self) -> &[f64] {
        &self.pheromone
    }

    #[must_use]
    pub fn heuristic(&self) -> &[f64] {
        &self.heuristic
    }

    #[must_use]
    pub fn usage(&self) -> &[u32] {
        &self.usage
    }

    #[must_use]
    pub fn discoveries(&self) -> &[u32] {
        &self.discoveries
    }
}

#[cfg(test)]
mod tests {
    use esmam_data::RawTable;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    const CSV: &str = "\
a,b,t,e
x,p,1,1
x,q,2,1
x,p,3,1
x,q,4,1
y,p,10,1
y,q,11,1
y,p,12,1
y,q,13,1
";

    fn store() -> CaseStore {
        CaseStore::from_table(&RawTable::parse_csv(CSV, "t", "e").unwrap()).unwrap()
    }

    #[test]
    fn test_initial_tables() {
        let store = store();
        let terms = TermsManager::new(&store, 1);
        assert_eq!(terms.num_terms(), 4);
        assert!(terms.pheromone().iter().all(|&p| (p - 0.25).abs() < 1e-12));
        // only attribute `a` separates the survival classes
        let h = terms.heuristic();
        assert!((h[0] - 0.5).abs() < 1e-12);
        assert!((h[1] - 0.5).abs() < 1e-12);
        assert_eq!(h[2], 0.0);
        assert_eq!(h[3], 0.0);
    }

    #[test]
    fn test_pheromone_update_conserves_mass() {
        let store = store();
        let mut terms = TermsManager::new(&store, 1);
        let x = store.find_item("a", "x").unwrap();
        let q = store.find_item("b", "q").unwrap();
        let antecedent = Antecedent::from_items(&store, [x, q]);

        terms.mark_attribute_used(AttributeId(0));
        terms.pheromone_update(&antecedent, 0.8);
        let sum = terms.pheromone().iter().sum::<f64>();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(terms.pheromone()[x.index()] > terms.pheromone()[1]);
        assert!(terms.has_available());
        assert!(terms.is_available(AttributeId(0)));

        terms.pheromone_init();
        assert!(terms.pheromone().iter().all(|&p| (p - 0.25).abs() < 1e-12));
    }

    #[test]
    fn test_zero_fitness_keeps_pheromone() {
        let store = store();
        let mut terms = TermsManager::new(&store, 1);
        let x = store.find_item("a", "x").unwrap();
        terms.pheromone_update(&Antecedent::from_items(&store, [x]), 0.0);
        assert!(terms.pheromone().iter().all(|&p| (p - 0.25).abs() < 1e-12));
    }

    #[test]
    fn test_sampling_respects_availability_and_weights() {
        let store = store();
        let mut terms = TermsManager::new(&store, 1);
        let mut rng = Pcg64::seed_from_u64(7);

        for _ in 0..20 {
            let term = terms
                .sample_next_term(&store, &store.all_cases(), &mut rng)
                .unwrap();
            // zero-heuristic terms of `b` are never drawn
            assert_eq!(term.attribute(), AttributeId(0));
        }

        terms.mark_attribute_used(AttributeId(0));
        assert!(
            terms
                .sample_next_term(&store, &store.all_cases(), &mut rng)
                .is_none()
        );
        terms.mark_attribute_used(AttributeId(1));
        assert!(!terms.has_available());
    }

    #[test]
    fn test_sampling_restricted_to_reachable_values() {
        let store = store();
        let terms = TermsManager::new(&store, 1);
        let mut rng = Pcg64::seed_from_u64(1);
        let x = store.find_item("a", "x").unwrap();
        for _ in 0..20 {
            let term = terms
                .sample_next_term(&store, store.coverage(x), &mut rng)
                .unwrap();
            assert_eq!(term.item(), x);
        }
    }

    #[test]
    fn test_heuristics_follow_uncovered_cases() {
        let store = store();
        let mut terms = TermsManager::new(&store, 1);
        let mut counts = CoverCounts::new(store.len());
        counts.add(&store.all_cases());
        assert!(!terms.update_heuristics(&store, &counts, 0.9, 5.0));
        assert!(terms.heuristic().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_discoveries_attenuate() {
        let store = store();
        let mut terms = TermsManager::new(&store, 1);
        let x = store.find_item("a", "x").unwrap();
        for _ in 0..10 {
            terms.record_discovery(&Antecedent::from_items(&store, [x]));
        }
        let counts = CoverCounts::new(store.len());
        assert!(terms.update_heuristics(&store, &counts, 0.9, 5.0));
        let y = store.find_item("a", "y").unwrap();
        assert!(terms.heuristic()[x.index()] < terms.heuristic()[y.index()]);
        assert_eq!(terms.discoveries()[x.index()], 10);
    }
}
