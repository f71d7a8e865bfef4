//! The colony loop.
//!
//! Each colony starts from uniform pheromone and a heuristic table rebuilt
//! from the still uncovered cases. Ants then construct and prune rules one
//! after another, each reinforcing the terms it used, until the ant limit is
//! reached or enough consecutive ants produce the same rule. The colony's best
//! rule is offered to the discovered set.
//!
//! The run stops when every case is covered, when too many consecutive
//! colonies leave the uncovered count unchanged, or when no term has any
//! heuristic value left.

use std::time::{Duration, Instant};

use esmam_data::CaseStore;
use rand::SeedableRng as _;
use rand_pcg::Pcg64;
use serde::Serialize;

use crate::{
    admission::Admission,
    params::{ConfigError, SearchParams},
    pruner::Pruner,
    rule::{Antecedent, Rule},
    rule_set::RuleSet,
    terms::TermsManager,
};

/// Why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    #[display("all cases covered")]
    AllCovered,
    #[display("stagnation threshold exceeded")]
    Stagnation,
    #[display("heuristic table exhausted")]
    HeuristicExhausted,
}

/// One ant's rule before and after pruning.
#[derive(Debug, Clone, Serialize)]
pub struct AntLog {
    /// Pheromone table this ant sampled from, before its own update.
    pub pheromone: Vec<f64>,
    pub constructed: Antecedent,
    pub constructed_fitness: f64,
    pub pruned: Antecedent,
    pub pruned_fitness: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColonyLog {
    pub ants: Vec<AntLog>,
    /// Normalized heuristic table the colony sampled from.
    pub heuristic: Vec<f64>,
    /// Committed uses of each term by this colony's ants.
    pub usage: Vec<u32>,
    /// Discovery counts after this colony's best rule was recorded.
    pub discoveries: Vec<u32>,
    pub best: Antecedent,
    pub best_fitness: f64,
    pub admitted: bool,
    pub uncovered: usize,
}

/// Result of [`EsmamDs::fit`].
#[derive(Debug, Clone)]
pub struct Discovery {
    pub rules: Vec<Rule>,
    pub colonies: Vec<ColonyLog>,
    pub stop_reason: StopReason,
    pub uncovered: Vec<usize>,
    pub num_terms: usize,
    pub elapsed: Duration,
}

/// Mutable state of a run: tables, discovered set, generator and counters.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub terms: TermsManager,
    pub rules: RuleSet,
    pub rng: Pcg64,
    pub stagnation: usize,
}

/// Ant-colony subgroup discovery over one dataset.
#[derive(Debug)]
pub struct EsmamDs<'a> {
    store: &'a CaseStore,
    params: SearchParams,
    state: SearchState,
}

impl<'a> EsmamDs<'a> {
    pub fn new(store: &'a CaseStore, params: SearchParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let min_cases = params.min_cases_per_rule(store.len());
        let state = SearchState {
            terms: TermsManager::new(store, min_cases),
            rules: RuleSet::new(store.len()),
            rng: Pcg64::seed_from_u64(params.seed),
            stagnation: 0,
        };
        Ok(Self {
            store,
            params,
            state,
        })
    }

    #[must_use]
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    #[must_use]
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    fn stop_reason(&self) -> Option<StopReason> {
        if self.state.rules.uncovered_count() == 0 {
            Some(StopReason::AllCovered)
        } else if self.state.stagnation > self.params.its_to_stagnation {
            Some(StopReason::Stagnation)
        } else {
            None
        }
    }

    /// Runs colonies until a stopping condition holds.
    pub fn fit(mut self) -> Discovery {
        let start = Instant::now();
        let mut colonies = vec![];
        let stop_reason = loop {
            if let Some(reason) = self.stop_reason() {
                break reason;
            }
            match self.run_colony(colonies.len()) {
                Some(log) => colonies.push(log),
                None => break StopReason::HeuristicExhausted,
            }
        };
        let elapsed = start.elapsed();
        tracing::info!(
            colonies = colonies.len(),
            rules = self.state.rules.len(),
            uncovered = self.state.rules.uncovered_count(),
            %stop_reason,
            ?elapsed,
            "search finished"
        );

        let uncovered = self.state.rules.uncovered().iter().collect();
        Discovery {
            rules: self.state.rules.into_rules(),
            colonies,
            stop_reason,
            uncovered,
            num_terms: self.state.terms.num_terms(),
            elapsed,
        }
    }

    /// Runs one colony. Returns `None` when the heuristic table sums to zero.
    fn run_colony(&mut self, index: usize) -> Option<ColonyLog> {
        let store = self.store;
        let params = &self.params;
        let state = &mut self.state;
        let pruner = Pruner::new(store, params.baseline);

        state.terms.pheromone_init();
        if !state.terms.update_heuristics(
            store,
            state.rules.counts(),
            params.cover_weight,
            params.logistic_offset,
        ) {
            tracing::info!(colony = index, "no term has heuristic value left");
            return None;
        }
        let heuristic = state.terms.heuristic().to_vec();

        let mut ants = vec![];
        let mut previous = Rule::empty(store);
        let mut best = previous.clone();
        let mut converged = 1;
        while ants.len() < params.num_ants && converged < params.rules_to_convergence {
            let constructed =
                Rule::construct(store, &mut state.terms, params.baseline, &mut state.rng);
            let pruned = pruner.prune(constructed.clone());
            tracing::debug!(
                colony = index,
                ant = ants.len(),
                rule = %pruned.describe(store),
                fitness = pruned.fitness(),
                "ant finished"
            );

            if pruned.equals(&previous) {
                converged += 1;
            } else {
                converged = 1;
                if pruned.fitness() > best.fitness() {
                    best = pruned.clone();
                }
            }
            let pheromone = state.terms.pheromone().to_vec();
            state.terms.pheromone_update(pruned.antecedent(), pruned.fitness());
            ants.push(AntLog {
                pheromone,
                constructed: constructed.antecedent().clone(),
                constructed_fitness: constructed.fitness(),
                pruned: pruned.antecedent().clone(),
                pruned_fitness: pruned.fitness(),
            });
            previous = pruned;
        }

        let uncovered_before = state.rules.uncovered_count();
        let admitted = Admission::new(store, params.baseline, params.alpha)
            .offer(&mut state.rules, best.clone());
        let uncovered = state.rules.uncovered_count();
        if uncovered == uncovered_before {
            state.stagnation += 1;
        } else {
            state.stagnation = 0;
        }
        let usage = state.terms.usage().to_vec();
        state.terms.record_discovery(best.antecedent());

        tracing::info!(
            colony = index,
            ants = ants.len(),
            best = %best.describe(store),
            fitness = best.fitness(),
            admitted,
            rules = state.rules.len(),
            uncovered,
            stagnation = state.stagnation,
            "colony finished"
        );

        Some(ColonyLog {
            ants,
            heuristic,
            usage,
            discoveries: state.terms.discoveries().to_vec(),
            best: best.antecedent().clone(),
            best_fitness: best.fitness(),
            admitted,
            uncovered,
        })
    }
}
