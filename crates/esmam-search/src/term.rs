//! Terms and their class-separation heuristic.
//!
//! A [`Term`] is one catalog item seen as a candidate clause. Its raw heuristic
//! is recomputed once per colony from the cases no accepted rule covers yet:
//!
//! 1. Split the uncovered cases into two classes by `time >= mean time`.
//! 2. Take the uncovered cases the term covers and the fraction `p` of them in
//!    the upper class.
//! 3. Score `1 - H(p)`, with `H` the binary entropy in bits.
//!
//! Terms covering fewer uncovered cases than the minimum rule size score 0.
//! The two attenuation factors applied on top of the raw score live here too.

use esmam_data::{AttributeId, CaseSet, CaseStore, CoverCounts, ItemId};

/// One `(attribute, value)` item as a construction candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    item: ItemId,
    attribute: AttributeId,
    heuristic: f64,
}

impl Term {
    #[must_use]
    pub fn new(store: &CaseStore, item: ItemId) -> Self {
        Self {
            item,
            attribute: store.attribute_of(item),
            heuristic: 0.0,
        }
    }

    #[must_use]
    pub fn item(&self) -> ItemId {
        self.item
    }

    #[must_use]
    pub fn attribute(&self) -> AttributeId {
        self.attribute
    }

    /// Raw heuristic from the last [`Term::update_heuristic`] call.
    #[must_use]
    pub fn heuristic(&self) -> f64 {
        self.heuristic
    }

    /// Recomputes the raw heuristic over `uncovered` cases.
    ///
    /// `threshold` is the mean survival time of the uncovered cases.
    pub fn update_heuristic(
        &mut self,
        store: &CaseStore,
        uncovered: &CaseSet,
        threshold: f64,
        min_cases: usize,
    ) {
        let cases = store.coverage(self.item).intersection(uncovered);
        self.heuristic = separation_heuristic(store, &cases, threshold, min_cases);
    }
}

/// `1 - H(p)` where `p` is the fraction of `cases` surviving at least
/// `threshold`.
///
/// # Examples
///
/// ```
/// use esmam_data::{CaseSet, CaseStore, RawTable};
/// use esmam_search::term::separation_heuristic;
///
/// let csv = "a,t,e\nx,1,1\nx,2,1\ny,9,1\ny,8,1\n";
/// let store = CaseStore::from_table(&RawTable::parse_csv(csv, "t", "e").unwrap()).unwrap();
///
/// // all short survivors: perfectly pure
/// let pure = CaseSet::from_indices(4, [0, 1]);
/// assert_eq!(separation_heuristic(&store, &pure, 5.0, 1), 1.0);
///
/// // one of each class: maximal entropy
/// let mixed = CaseSet::from_indices(4, [0, 2]);
/// assert_eq!(separation_heuristic(&store, &mixed, 5.0, 1), 0.0);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn separation_heuristic(
    store: &CaseStore,
    cases: &CaseSet,
    threshold: f64,
    min_cases: usize,
) -> f64 {
    let total = cases.count();
    if total == 0 || total < min_cases {
        return 0.0;
    }
    let above = store
        .observations(cases)
        .filter(|obs| obs.time >= threshold)
        .count();
    let p = above as f64 / total as f64;
    1.0 - binary_entropy(p)
}

fn binary_entropy(p: f64) -> f64 {
    [p, 1.0 - p]
        .into_iter()
        .filter(|&q| q > 0.0)
        .map(|q| -q * q.log2())
        .sum()
}

/// Inverse logistic in the number of times a term was discovered:
/// `1 - 1 / (1 + exp(-(count - offset)))`.
///
/// # Examples
///
/// ```
/// use esmam_search::term::discovery_attenuation;
///
/// assert_eq!(discovery_attenuation(5, 5.0), 0.5);
/// assert!(discovery_attenuation(0, 5.0) > 0.99);
/// assert!(discovery_attenuation(20, 5.0) < 1e-6);
/// ```
#[must_use]
pub fn discovery_attenuation(count: u32, offset: f64) -> f64 {
    1.0 - 1.0 / (1.0 + (-(f64::from(count) - offset)).exp())
}

/// Mean of `weight^count(case)` over the cases a term covers.
///
/// A term covering nothing scores 0.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn cover_attenuation(term_cases: &CaseSet, counts: &CoverCounts, weight: f64) -> f64 {
    let total = term_cases.count();
    if total == 0 {
        return 0.0;
    }
    let sum = term_cases
        .iter()
        .map(|case| weight.powf(f64::from(counts.count(case))))
        .sum::<f64>();
    sum / total as f64
}
