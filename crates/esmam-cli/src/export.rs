//! Plain-text result files: the rule model and survival model CSVs.

use std::{
    borrow::Cow,
    io::{self, Write},
};

use esmam_search::report::{RuleSummary, SurvivalTable};

const RULE_MODEL_HEADER: &str =
    "id,sg,baseline,fitness,pvalue,mean_sg,mean_pop,mean_cpm,size_sg,size_pop,size_cpm";

/// One row per rule. Missing means (empty groups) are left blank.
pub fn write_rule_model<W>(writer: &mut W, summaries: &[RuleSummary]) -> io::Result<()>
where
    W: Write,
{
    writeln!(writer, "{RULE_MODEL_HEADER}")?;
    for s in summaries {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{}",
            s.id,
            csv_field(&s.description),
            s.baseline,
            s.fitness,
            s.p_value,
            optional(s.mean_subgroup),
            optional(s.mean_population),
            optional(s.mean_complement),
            s.size_subgroup,
            s.size_population,
            s.size_complement,
        )?;
    }
    Ok(())
}

/// One row per grid time: `times,population,R0,R1,...`.
pub fn write_survival_models<W>(writer: &mut W, table: &SurvivalTable) -> io::Result<()>
where
    W: Write,
{
    write!(writer, "times,population")?;
    for (id, _) in &table.rules {
        write!(writer, ",{}", csv_field(id))?;
    }
    writeln!(writer)?;

    for (i, time) in table.times.iter().enumerate() {
        write!(writer, "{time},{}", table.population[i])?;
        for (_, curve) in &table.rules {
            write!(writer, ",{}", curve[i])?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
