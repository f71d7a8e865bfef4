//! Ant-colony discovery of subgroups with exceptional survival.
//!
//! The search looks for a small, diverse set of rules (conjunctions of
//! attribute-value clauses) whose covered cases have a survival curve that
//! differs significantly from a baseline, either the whole population or the
//! rule's complement.
//!
//! # How a Run Works
//!
//! 1. **Heuristic** - Every term is scored by how cleanly it separates the
//!    still uncovered cases into short and long survivors
//! 2. **Construction** - Each ant draws terms with probability proportional to
//!    `heuristic * pheromone`, narrowing its cover while it stays large enough
//! 3. **Pruning** - Clauses are removed greedily while fitness does not drop
//! 4. **Reinforcement** - The pruned rule's terms gain pheromone in proportion
//!    to its fitness (`1 - p_value`)
//! 5. **Admission** - The colony's best rule is offered to the discovered set,
//!    which may reject it, replace more specific rules with it, or derive
//!    generalized rules from it
//!
//! # Architecture
//!
//! ```text
//! CaseStore (esmam-data)
//!     ↓ coverage queries
//! TermsManager ── pheromone / heuristic tables
//!     ↓ samples terms for
//! Rule::construct → Pruner
//!     ↓ best rule per colony
//! Admission → RuleSet
//!     ↓ exported through
//! report (summaries, survival curves, metrics, similarity)
//! ```
//!
//! # Example
//!
//! ```
//! use esmam_data::{CaseStore, RawTable};
//! use esmam_search::{colony::EsmamDs, params::{Baseline, SearchParams}};
//!
//! let csv = "a,t,e\nx,1,1\nx,2,1\nx,3,1\nx,4,1\ny,10,1\ny,11,1\ny,12,1\ny,13,1\n";
//! let store = CaseStore::from_table(&RawTable::parse_csv(csv, "t", "e")?)?;
//!
//! let params = SearchParams {
//!     num_ants: 10,
//!     min_size_subgroup: 0.5,
//!     baseline: Baseline::Complement,
//!     ..SearchParams::default()
//! };
//! let discovery = EsmamDs::new(&store, params)?.fit();
//! assert_eq!(discovery.rules.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Current Limitations
//!
//! - **Sequential ants**: each ant depends on the pheromone left by the
//!   previous one, so colonies are not parallelized
//! - **Categorical attributes only**: numeric columns must be discretized
//!   before loading

pub mod admission;
pub mod colony;
pub mod params;
pub mod pruner;
pub mod report;
pub mod rule;
pub mod rule_set;
pub mod term;
pub mod terms;
