//! Rules: antecedents over catalog items, their cover and fitness.
//!
//! An [`Antecedent`] is a set of [`Condition`]s kept sorted by item id. Since
//! item ids are attribute-major, the conditions of one attribute are adjacent;
//! together they form a clause whose values are alternatives. Clauses of
//! different attributes must all hold.
//!
//! A [`Rule`] pairs an antecedent with its cover and the log-rank p-value of
//! that cover against the configured [`Baseline`]. The fields are private and
//! every constructor computes the cover from the antecedent, so the two never
//! drift apart.

use std::collections::BTreeMap;

use esmam_data::{AttributeId, CaseSet, CaseStore, ItemId};
use esmam_stats::logrank;
use rand::Rng;
use serde::Serialize;

use crate::{params::Baseline, terms::TermsManager};

/// `attribute = item` clause member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Condition {
    pub attribute: AttributeId,
    pub item: ItemId,
}

impl Condition {
    #[must_use]
    pub fn new(store: &CaseStore, item: ItemId) -> Self {
        Self {
            attribute: store.attribute_of(item),
            item,
        }
    }
}

/// Sorted, duplicate-free set of conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Antecedent {
    conditions: Vec<Condition>,
}

impl Antecedent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_items<I>(store: &CaseStore, items: I) -> Self
    where
        I: IntoIterator<Item = ItemId>,
    {
        let mut conditions = items
            .into_iter()
            .map(|item| Condition::new(store, item))
            .collect::<Vec<_>>();
        conditions.sort_unstable();
        conditions.dedup();
        Self { conditions }
    }

    /// Adds a condition. Returns `false` if it was already present.
    pub fn insert(&mut self, condition: Condition) -> bool {
        match self.conditions.binary_search(&condition) {
            Ok(_) => false,
            Err(pos) => {
                self.conditions.insert(pos, condition);
                true
            }
        }
    }

    /// Copy with the whole clause of `attribute` removed.
    #[must_use]
    pub fn without_attribute(&self, attribute: AttributeId) -> Self {
        Self {
            conditions: self
                .conditions
                .iter()
                .copied()
                .filter(|c| c.attribute != attribute)
                .collect(),
        }
    }

    /// Number of conditions (terms).
    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.conditions.iter().map(|c| c.item)
    }

    /// Attributes with a clause, ascending.
    #[must_use]
    pub fn attributes(&self) -> Vec<AttributeId> {
        let mut attributes = self
            .conditions
            .iter()
            .map(|c| c.attribute)
            .collect::<Vec<_>>();
        attributes.dedup();
        attributes
    }

    #[must_use]
    pub fn num_attributes(&self) -> usize {
        self.attributes().len()
    }

    #[must_use]
    pub fn has_attribute(&self, attribute: AttributeId) -> bool {
        self.conditions.iter().any(|c| c.attribute == attribute)
    }

    #[must_use]
    pub fn contains(&self, condition: &Condition) -> bool {
        self.conditions.binary_search(condition).is_ok()
    }

    #[must_use]
    pub fn shares_attribute(&self, other: &Self) -> bool {
        self.conditions.iter().any(|c| other.has_attribute(c.attribute))
    }

    /// Whether `self` is at least as specific as `other`.
    ///
    /// Holds when `self` constrains every attribute of `other`, and on those
    /// attributes only allows values `other` allows too.
    #[must_use]
    pub fn is_in(&self, other: &Self) -> bool {
        let shared = other
            .attributes()
            .into_iter()
            .all(|attr| self.has_attribute(attr));
        shared
            && self
                .conditions
                .iter()
                .filter(|c| other.has_attribute(c.attribute))
                .all(|c| other.contains(c))
    }

    /// Whether both antecedents have a condition in common (a root exists).
    #[must_use]
    pub fn has_root(&self, other: &Self) -> bool {
        self.conditions.iter().any(|c| other.contains(c))
    }

    /// Whether both antecedents constrain the same attributes (a merge exists).
    #[must_use]
    pub fn has_merge(&self, other: &Self) -> bool {
        self.attributes() == other.attributes()
    }

    /// Conditions present in both.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            conditions: self
                .conditions
                .iter()
                .copied()
                .filter(|c| other.contains(c))
                .collect(),
        }
    }

    /// Conditions present in either.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut union = self.clone();
        for &c in &other.conditions {
            union.insert(c);
        }
        union
    }

    /// Jaccard index over conditions. Two empty antecedents score 1.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn jaccard(&self, other: &Self) -> f64 {
        let common = self.intersection(other).len();
        let union = self.len() + other.len() - common;
        if union == 0 {
            return 1.0;
        }
        common as f64 / union as f64
    }

    /// Renders as `(attr=v1) & (attr=v2|v3)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use esmam_data::{CaseStore, RawTable};
    /// use esmam_search::rule::Antecedent;
    ///
    /// let csv = "sex,stage,t,e\nm,I,1,1\nf,II,2,1\nf,III,3,0\n";
    /// let store = CaseStore::from_table(&RawTable::parse_csv(csv, "t", "e").unwrap()).unwrap();
    /// let items = [("sex", "f"), ("stage", "III"), ("stage", "I")]
    ///     .map(|(a, v)| store.find_item(a, v).unwrap());
    /// let antecedent = Antecedent::from_items(&store, items);
    /// assert_eq!(antecedent.describe(&store), "(sex=f) & (stage=I|III)");
    /// ```
    #[must_use]
    pub fn describe(&self, store: &CaseStore) -> String {
        self.clauses(store)
            .into_iter()
            .map(|(name, values)| format!("({name}={})", values.join("|")))
            .collect::<Vec<_>>()
            .join(" & ")
    }

    /// Attribute names mapped to their allowed values.
    #[must_use]
    pub fn to_map(&self, store: &CaseStore) -> BTreeMap<String, Vec<String>> {
        self.clauses(store).into_iter().collect()
    }

    fn clauses(&self, store: &CaseStore) -> Vec<(String, Vec<String>)> {
        self.conditions
            .chunk_by(|a, b| a.attribute == b.attribute)
            .map(|clause| {
                let name = store.attribute(clause[0].attribute).name.clone();
                let values = clause
                    .iter()
                    .map(|c| store.item(c.item).value.clone())
                    .collect();
                (name, values)
            })
            .collect()
    }
}

/// Log-rank p-value of `cover` against `baseline`.
///
/// With [`Baseline::Population`] the subgroup is compared with the full
/// dataset, its own cases included. Degenerate comparisons yield 1.
#[must_use]
pub fn baseline_p_value(store: &CaseStore, baseline: Baseline, cover: &CaseSet) -> f64 {
    let subgroup = store.observations(cover);
    match baseline {
        Baseline::Population => {
            logrank::log_rank_p_value(subgroup, store.all_observations().iter().copied())
        }
        Baseline::Complement => {
            let complement = cover.complement();
            logrank::log_rank_p_value(subgroup, store.observations(&complement))
        }
    }
}

/// An antecedent with its cover and statistical quality.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    antecedent: Antecedent,
    cover: CaseSet,
    p_value: f64,
}

impl Rule {
    /// The empty rule: covers everything, fitness 0.
    #[must_use]
    pub fn empty(store: &CaseStore) -> Self {
        Self {
            antecedent: Antecedent::new(),
            cover: store.all_cases(),
            p_value: 1.0,
        }
    }

    /// Evaluates `antecedent`: cover by conjunction of clauses, then fitness.
    #[must_use]
    pub fn new(store: &CaseStore, baseline: Baseline, antecedent: Antecedent) -> Self {
        let cover = store.coverage_of(antecedent.items());
        Self::with_cover(store, baseline, antecedent, cover)
    }

    fn with_cover(
        store: &CaseStore,
        baseline: Baseline,
        antecedent: Antecedent,
        cover: CaseSet,
    ) -> Self {
        debug_assert_eq!(cover, store.coverage_of(antecedent.items()));
        let p_value = baseline_p_value(store, baseline, &cover);
        Self {
            antecedent,
            cover,
            p_value,
        }
    }

    /// One ant's probabilistic construction.
    ///
    /// Terms are drawn from `terms` while an attribute is available. A term is
    /// committed only if the narrowed cover keeps at least the minimum number
    /// of cases; the first term that would not ends the construction.
    pub fn construct<R>(
        store: &CaseStore,
        terms: &mut TermsManager,
        baseline: Baseline,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut antecedent = Antecedent::new();
        let mut cover = store.all_cases();
        while terms.has_available() {
            let Some(term) = terms.sample_next_term(store, &cover, rng) else {
                break;
            };
            let (item, attribute) = (term.item(), term.attribute());
            let narrowed = cover.intersection(store.coverage(item));
            if narrowed.count() < terms.min_cases() {
                break;
            }
            antecedent.insert(Condition { attribute, item });
            cover = narrowed;
            terms.mark_attribute_used(attribute);
            terms.record_usage(item);
        }
        Self::with_cover(store, baseline, antecedent, cover)
    }

    /// Rule over the conditions shared by `a` and `b`.
    #[must_use]
    pub fn root(store: &CaseStore, baseline: Baseline, a: &Self, b: &Self) -> Self {
        Self::new(store, baseline, a.antecedent.intersection(&b.antecedent))
    }

    /// Rule over the conditions of either `a` or `b`.
    #[must_use]
    pub fn merge(store: &CaseStore, baseline: Baseline, a: &Self, b: &Self) -> Self {
        Self::new(store, baseline, a.antecedent.union(&b.antecedent))
    }

    #[must_use]
    pub fn antecedent(&self) -> &Antecedent {
        &self.antecedent
    }

    #[must_use]
    pub fn cover(&self) -> &CaseSet {
        &self.cover
    }

    #[must_use]
    pub fn num_cases(&self) -> usize {
        self.cover.count()
    }

    #[must_use]
    pub fn p_value(&self) -> f64 {
        self.p_value
    }

    /// `1 - p_value`, in `[0, 1]`.
    #[must_use]
    pub fn fitness(&self) -> f64 {
        1.0 - self.p_value
    }

    /// Same set of conditions.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.antecedent == other.antecedent
    }

    /// Whether the survival models of both covers differ at level `alpha`.
    #[must_use]
    pub fn is_exceptional(&self, other: &Self, store: &CaseStore, alpha: f64) -> bool {
        let p = logrank::log_rank_p_value(
            store.observations(&self.cover),
            store.observations(&other.cover),
        );
        p < alpha
    }

    #[must_use]
    pub fn describe(&self, store: &CaseStore) -> String {
        self.antecedent.describe(store)
    }
}
