//! The discovered rule set.
//!
//! Rules live in an append-only arena addressed by [`RuleId`]. The ordered list
//! of active ids is the rule set proper; removing a rule only drops its id from
//! that list, so ids held elsewhere (for instance in a snapshot taken before a
//! nested admission) stay valid.

use esmam_data::{CaseSet, CoverCounts};

use crate::rule::Rule;

/// Stable handle to a rule in a [`RuleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
#[display("#{_0}")]
pub struct RuleId(usize);

#[derive(Debug, Clone)]
pub struct RuleSet {
    arena: Vec<Rule>,
    active: Vec<RuleId>,
    counts: CoverCounts,
}

impl RuleSet {
    #[must_use]
    pub fn new(num_cases: usize) -> Self {
        Self {
            arena: vec![],
            active: vec![],
            counts: CoverCounts::new(num_cases),
        }
    }

    /// Number of active rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Appends `rule` and counts its cover.
    pub fn insert(&mut self, rule: Rule) -> RuleId {
        let id = RuleId(self.arena.len());
        self.counts.add(rule.cover());
        self.arena.push(rule);
        self.active.push(id);
        id
    }

    /// Deactivates `id` and uncounts its cover. Returns `false` if it was not
    /// active.
    pub fn remove(&mut self, id: RuleId) -> bool {
        let Some(pos) = self.active.iter().position(|&a| a == id) else {
            return false;
        };
        self.active.remove(pos);
        self.counts.remove(self.arena[id.0].cover());
        true
    }

    #[must_use]
    pub fn contains(&self, id: RuleId) -> bool {
        self.active.contains(&id)
    }

    /// Rule behind `id`, active or not.
    #[must_use]
    pub fn get(&self, id: RuleId) -> &Rule {
        &self.arena[id.0]
    }

    /// Active ids in insertion order.
    #[must_use]
    pub fn ids(&self) -> Vec<RuleId> {
        self.active.clone()
    }

    /// Active rules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.active.iter().map(|id| &self.arena[id.0])
    }

    #[must_use]
    pub fn counts(&self) -> &CoverCounts {
        &self.counts
    }

    #[must_use]
    pub fn uncovered(&self) -> CaseSet {
        self.counts.uncovered()
    }

    #[must_use]
    pub fn uncovered_count(&self) -> usize {
        self.counts.uncovered_count()
    }

    /// Active rules, in order.
    #[must_use]
    pub fn into_rules(self) -> Vec<Rule> {
        let Self { arena, active, .. } = self;
        let mut slots = arena.into_iter().map(Some).collect::<Vec<_>>();
        active
            .into_iter()
            .filter_map(|id| slots[id.0].take())
            .collect()
    }
}
