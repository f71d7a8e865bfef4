use std::path::PathBuf;

use chrono::{DateTime, Utc};
use esmam_data::CaseStore;
use esmam_search::{
    colony::{ColonyLog, Discovery, StopReason},
    params::SearchParams,
    report::{RuleSetMetrics, RuleSummary, SimilarityReport, SurvivalTable},
};
use serde::Serialize;

/// Complete record of one discovery run, written as `<prefix>_log.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunLog {
    /// Effective search parameters after merging config file and flags
    pub params: SearchParams,
    pub metrics: RuleSetMetrics,
    /// One summary per discovered rule, in `R0, R1, ...` order
    pub model: Vec<RuleSummary>,
    /// Kaplan-Meier curves of the population and every rule
    pub survival: SurvivalTable,
    pub similarity: SimilarityReport,
    pub run: RunInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub timestamp: DateTime<Utc>,
    pub data_path: PathBuf,
    /// `(cases, attributes)`, survival targets excluded
    pub data_shape: (usize, usize),
    pub num_terms: usize,
    /// Wall-clock search time in seconds
    pub run_time: f64,
    pub num_colonies: usize,
    pub seed: u64,
    pub stop_reason: StopReason,
    /// Indices of cases no discovered rule covers
    pub uncovered: Vec<usize>,
    pub colonies: Vec<ColonyLog>,
}

impl RunLog {
    pub fn new(
        store: &CaseStore,
        params: &SearchParams,
        data_path: PathBuf,
        discovery: Discovery,
    ) -> Self {
        let Discovery {
            rules,
            colonies,
            stop_reason,
            uncovered,
            num_terms,
            elapsed,
        } = discovery;
        Self {
            params: params.clone(),
            metrics: RuleSetMetrics::new(store, &rules),
            model: RuleSummary::all(store, params.baseline, &rules),
            survival: SurvivalTable::new(store, &rules),
            similarity: SimilarityReport::new(store, &rules, params.alpha),
            run: RunInfo {
                timestamp: Utc::now(),
                data_path,
                data_shape: (store.len(), store.num_attributes()),
                num_terms,
                run_time: elapsed.as_secs_f64(),
                num_colonies: colonies.len(),
                seed: params.seed,
                stop_reason,
                uncovered,
                colonies,
            },
        }
    }
}
