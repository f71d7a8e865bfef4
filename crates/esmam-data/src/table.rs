//! Raw tabular input: attribute cells plus the two survival target columns.

use esmam_stats::survival::Observation;

/// Errors raised while loading a dataset. All of them abort the run before
/// any search starts.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum LoadError {
    #[display("input has no header row")]
    EmptyHeader,
    #[display("missing column '{name}'")]
    MissingColumn { name: String },
    #[display("input has no attribute columns besides the survival targets")]
    NoAttributes,
    #[display("row {row}: expected {expected} cells, found {found}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[display("row {row}: invalid survival time '{value}'")]
    InvalidTime { row: usize, value: String },
    #[display("row {row}: invalid event flag '{value}'")]
    InvalidEvent { row: usize, value: String },
    #[display("row {row}: value '{value}' is not in the catalog of attribute '{attribute}'")]
    UnknownValue {
        row: usize,
        attribute: String,
        value: String,
    },
    #[display("value '{value}' listed twice in the catalog of attribute '{attribute}'")]
    DuplicateValue { attribute: String, value: String },
    #[display("{rows} attribute rows but {observations} survival observations")]
    ObservationCount { rows: usize, observations: usize },
}

/// Attribute cells and survival observations, before item ids are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    observations: Vec<Observation>,
}

impl RawTable {
    /// Builds a table from already-split attribute rows.
    ///
    /// Every row must have one cell per column, and there must be one
    /// observation per row with a finite, non-negative time.
    pub fn new(
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        observations: Vec<Observation>,
    ) -> Result<Self, LoadError> {
        if columns.is_empty() {
            return Err(LoadError::NoAttributes);
        }
        if rows.len() != observations.len() {
            return Err(LoadError::ObservationCount {
                rows: rows.len(),
                observations: observations.len(),
            });
        }
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != columns.len() {
                return Err(LoadError::RowLength {
                    row,
                    expected: columns.len(),
                    found: cells.len(),
                });
            }
        }
        for (row, obs) in observations.iter().enumerate() {
            if !obs.time.is_finite() || obs.time < 0.0 {
                return Err(LoadError::InvalidTime {
                    row,
                    value: obs.time.to_string(),
                });
            }
        }
        Ok(Self {
            columns,
            rows,
            observations,
        })
    }

    /// Parses comma-separated text with a header row.
    ///
    /// `time_column` and `event_column` name the survival targets; every other
    /// column becomes a categorical attribute. Cells are trimmed and stripped of
    /// surrounding double quotes. Event cells accept `1`/`0`, `true`/`false`
    /// and `yes`/`no` (case-insensitive). Blank lines are skipped.
    ///
    /// Row numbers in errors are 0-based data rows (the header is not counted).
    ///
    /// # Examples
    ///
    /// ```
    /// use esmam_data::table::RawTable;
    ///
    /// let csv = "age,stage,survival_time,survival_status\n\
    ///            young,I,12.5,1\n\
    ///            old,II,3,0\n";
    /// let table = RawTable::parse_csv(csv, "survival_time", "survival_status").unwrap();
    /// assert_eq!(table.columns(), ["age", "stage"]);
    /// assert_eq!(table.len(), 2);
    /// ```
    pub fn parse_csv(text: &str, time_column: &str, event_column: &str) -> Result<Self, LoadError> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let header = lines
            .next()
            .map(split_cells)
            .ok_or(LoadError::EmptyHeader)?;

        let find = |name: &str| {
            header
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| LoadError::MissingColumn {
                    name: name.to_owned(),
                })
        };
        let time_idx = find(time_column)?;
        let event_idx = find(event_column)?;

        let attr_idx = (0..header.len())
            .filter(|&i| i != time_idx && i != event_idx)
            .collect::<Vec<_>>();
        let columns = attr_idx.iter().map(|&i| header[i].clone()).collect();

        let mut rows = vec![];
        let mut observations = vec![];
        for (row, line) in lines.enumerate() {
            let cells = split_cells(line);
            if cells.len() != header.len() {
                return Err(LoadError::RowLength {
                    row,
                    expected: header.len(),
                    found: cells.len(),
                });
            }
            let time = parse_time(&cells[time_idx]).ok_or_else(|| LoadError::InvalidTime {
                row,
                value: cells[time_idx].clone(),
            })?;
            let event = parse_event(&cells[event_idx]).ok_or_else(|| LoadError::InvalidEvent {
                row,
                value: cells[event_idx].clone(),
            })?;
            observations.push(Observation::new(time, event));
            rows.push(attr_idx.iter().map(|&i| cells[i].clone()).collect());
        }

        Self::new(columns, rows, observations)
    }

    /// Attribute column names, in input order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows (cases).
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Distinct values of each column, in first-seen order.
    #[must_use]
    pub fn first_seen_catalog(&self) -> Vec<(String, Vec<String>)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(col, name)| {
                let mut values: Vec<String> = vec![];
                for row in &self.rows {
                    if !values.contains(&row[col]) {
                        values.push(row[col].clone());
                    }
                }
                (name.clone(), values)
            })
            .collect()
    }
}

fn split_cells(line: &str) -> Vec<String> {
    line.split(',')
        .map(|cell| cell.trim().trim_matches('"').to_owned())
        .collect()
}

fn parse_time(cell: &str) -> Option<f64> {
    cell.parse::<f64>()
        .ok()
        .filter(|t| t.is_finite() && *t >= 0.0)
}

fn parse_event(cell: &str) -> Option<bool> {
    match cell.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" => Some(true),
        "0" | "0.0" | "false" | "no" => Some(false),
        _ => None,
    }
}
