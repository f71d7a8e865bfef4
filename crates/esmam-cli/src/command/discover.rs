use std::{io::Write as _, path::PathBuf};

use anyhow::Context;
use esmam_search::{
    colony::EsmamDs,
    params::{Baseline, SearchParams},
    report::{RuleSummary, SimilarityReport, SurvivalTable},
};

use crate::{
    export,
    schema::run_log::RunLog,
    util::{self, Output},
};

/// Search parameter flags. Each one given overrides the config file value.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ParamOverrides {
    /// Maximum number of ants per colony
    #[arg(long)]
    num_ants: Option<usize>,
    /// Minimum cover of a rule, as a fraction of all cases
    #[arg(long)]
    min_size_subgroup: Option<f64>,
    /// Consecutive identical ants that end a colony
    #[arg(long)]
    rules_to_convergence: Option<usize>,
    /// Consecutive rejected colonies that end the search
    #[arg(long)]
    its_to_stagnation: Option<usize>,
    /// Weight of cover attenuation on term heuristics
    #[arg(long)]
    cover_weight: Option<f64>,
    /// Offset of the logistic discovery attenuation
    #[arg(long)]
    logistic_offset: Option<f64>,
    /// Significance level of the log-rank test
    #[arg(long)]
    alpha: Option<f64>,
    /// Survival baseline (population or complement)
    #[arg(long)]
    baseline: Option<Baseline>,
    #[arg(long)]
    seed: Option<u64>,
}

impl ParamOverrides {
    fn apply(&self, params: &mut SearchParams) {
        let Self {
            num_ants,
            min_size_subgroup,
            rules_to_convergence,
            its_to_stagnation,
            cover_weight,
            logistic_offset,
            alpha,
            baseline,
            seed,
        } = *self;
        if let Some(v) = num_ants {
            params.num_ants = v;
        }
        if let Some(v) = min_size_subgroup {
            params.min_size_subgroup = v;
        }
        if let Some(v) = rules_to_convergence {
            params.rules_to_convergence = v;
        }
        if let Some(v) = its_to_stagnation {
            params.its_to_stagnation = v;
        }
        if let Some(v) = cover_weight {
            params.cover_weight = v;
        }
        if let Some(v) = logistic_offset {
            params.logistic_offset = v;
        }
        if let Some(v) = alpha {
            params.alpha = v;
        }
        if let Some(v) = baseline {
            params.baseline = v;
        }
        if let Some(v) = seed {
            params.seed = v;
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DiscoverArg {
    /// CSV dataset with a header row
    data: PathBuf,
    /// Column holding survival times
    #[arg(long, default_value = "survival_time")]
    time_column: String,
    /// Column holding event flags (1 = event, 0 = censored)
    #[arg(long, default_value = "survival_status")]
    event_column: String,
    /// JSON file with search parameters
    #[arg(long)]
    config: Option<PathBuf>,
    #[clap(flatten)]
    overrides: ParamOverrides,
    /// Prefix of the result files (`<prefix>_RuleModel.csv`, ...).
    /// Without it the rule summaries are printed to stdout as JSON.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Also write `<prefix>_log.json`
    #[arg(long, requires = "output")]
    save_log: bool,
}

impl DiscoverArg {
    fn search_params(&self) -> anyhow::Result<SearchParams> {
        let mut params = match &self.config {
            Some(path) => util::read_json_file("config", path)?,
            None => SearchParams::default(),
        };
        self.overrides.apply(&mut params);
        params.validate().context("Invalid search parameters")?;
        Ok(params)
    }
}

pub(crate) fn run(arg: &DiscoverArg) -> anyhow::Result<()> {
    let DiscoverArg {
        data,
        time_column,
        event_column,
        output,
        save_log,
        ..
    } = arg;
    let params = arg.search_params()?;

    let store = util::read_dataset_file(data, time_column, event_column)?;
    tracing::info!(
        path = %data.display(),
        cases = store.len(),
        attributes = store.num_attributes(),
        items = store.num_items(),
        "dataset loaded"
    );

    let discovery = EsmamDs::new(&store, params.clone())
        .context("Invalid search parameters")?
        .fit();

    let rules = &discovery.rules;
    let summaries = RuleSummary::all(&store, params.baseline, rules);
    let Some(prefix) = output else {
        return Output::save_json(&summaries, None);
    };

    let path = util::prefixed_path(prefix, "_RuleModel.csv");
    Output::open(path)?.write_with(|w| export::write_rule_model(w, &summaries))?;

    let survival = SurvivalTable::new(&store, rules);
    let path = util::prefixed_path(prefix, "_SurvivalModels.csv");
    Output::open(path)?.write_with(|w| export::write_survival_models(w, &survival))?;

    let text = SimilarityReport::new(&store, rules, params.alpha).render(&store, rules);
    let path = util::prefixed_path(prefix, "_RuleSet.txt");
    Output::open(path)?.write_with(|w| w.write_all(text.as_bytes()))?;

    let num_rules = rules.len();
    let uncovered = discovery.uncovered.len();
    let stop_reason = discovery.stop_reason;
    if *save_log {
        let log = RunLog::new(&store, &params, data.clone(), discovery);
        Output::save_json(&log, Some(util::prefixed_path(prefix, "_log.json")))?;
    }

    eprintln!();
    eprintln!("Discovery completed");
    eprintln!("  Rules: {num_rules}");
    eprintln!("  Uncovered cases: {uncovered}/{}", store.len());
    eprintln!("  Stopped: {stop_reason}");
    eprintln!("  Results: {}_*", prefix.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Cli {
        #[clap(flatten)]
        arg: DiscoverArg,
    }

    fn parse(argv: &[&str]) -> DiscoverArg {
        Cli::try_parse_from(argv).unwrap().arg
    }

    #[test]
    fn test_defaults_without_flags() {
        let arg = parse(&["esmam", "data.csv"]);
        assert_eq!(arg.time_column, "survival_time");
        assert_eq!(arg.event_column, "survival_status");
        assert_eq!(arg.search_params().unwrap(), SearchParams::default());
    }

    #[test]
    fn test_flags_override_params() {
        let arg = parse(&[
            "esmam",
            "data.csv",
            "--num-ants",
            "50",
            "--baseline",
            "complement",
            "--alpha",
            "0.01",
            "--seed",
            "7",
        ]);
        let params = arg.search_params().unwrap();
        assert_eq!(params.num_ants, 50);
        assert_eq!(params.baseline, Baseline::Complement);
        assert!((params.alpha - 0.01).abs() < f64::EPSILON);
        assert_eq!(params.seed, 7);
        assert_eq!(
            params.rules_to_convergence,
            SearchParams::default().rules_to_convergence
        );
    }

    #[test]
    fn test_invalid_flag_value_rejected() {
        let arg = parse(&["esmam", "data.csv", "--alpha", "1.5"]);
        assert!(arg.search_params().is_err());
    }

    #[test]
    fn test_save_log_requires_output() {
        let cli = Cli::try_parse_from(["esmam", "data.csv", "--save-log"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_writes_result_files() {
        let dir = std::env::temp_dir().join(format!("esmam-discover-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let data = dir.join("data.csv");
        std::fs::write(
            &data,
            "a,b,survival_time,survival_status\n\
             x,p,1,1\nx,q,2,1\nx,p,3,1\nx,q,4,1\n\
             y,p,10,1\ny,q,11,1\ny,p,12,1\ny,q,13,1\n",
        )
        .unwrap();
        let prefix = dir.join("run");

        let arg = parse(&[
            "esmam",
            data.to_str().unwrap(),
            "--num-ants",
            "20",
            "--min-size-subgroup",
            "0.5",
            "--rules-to-convergence",
            "3",
            "--its-to-stagnation",
            "3",
            "--baseline",
            "complement",
            "--output",
            prefix.to_str().unwrap(),
            "--save-log",
        ]);
        run(&arg).unwrap();

        let model =
            std::fs::read_to_string(util::prefixed_path(&prefix, "_RuleModel.csv")).unwrap();
        let rows = model.lines().collect::<Vec<_>>();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].starts_with("R0,(a="));
        assert!(rows[1].contains(",complement,"));

        let survival =
            std::fs::read_to_string(util::prefixed_path(&prefix, "_SurvivalModels.csv")).unwrap();
        assert!(survival.starts_with("times,population,R0\n0,1,1\n"));

        let text = std::fs::read_to_string(util::prefixed_path(&prefix, "_RuleSet.txt")).unwrap();
        assert!(text.contains("(a="));

        let log: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(util::prefixed_path(&prefix, "_log.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(log["run"]["data_shape"], serde_json::json!([8, 2]));
        assert_eq!(log["params"]["baseline"], "complement");
        assert_eq!(log["model"][0]["id"], "R0");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
