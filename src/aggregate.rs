//! Summarising raw benchmark CSVs: mean and standard deviation of each metric per key count.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use failure::ResultExt;

use crate::error::RunnerError;

/// The column the rows are grouped by.
pub const KEY_COLUMN: &str = "Keys";

/// The measured columns that get summarised.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    Create,
    Find,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Create, Metric::Find];

    /// The column in the raw file, which is also the mean column in the summary.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Create => "CreateTime",
            Metric::Find => "FindTime",
        }
    }

    /// The standard deviation column in the summary.
    pub fn std_column(self) -> &'static str {
        match self {
            Metric::Create => "CreateStd",
            Metric::Find => "FindStd",
        }
    }

    /// Prefix of the summary file name.
    pub fn file_prefix(self) -> &'static str {
        match self {
            Metric::Create => "create",
            Metric::Find => "find",
        }
    }

    /// The verb used in plot titles.
    pub fn action(self) -> &'static str {
        match self {
            Metric::Create => "Create",
            Metric::Find => "Find",
        }
    }
}

/// One line of a summary file.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedRow {
    pub key: u64,
    pub mean: f64,
    /// `None` when the group has a single sample.
    pub std_dev: Option<f64>,
}

/// Arithmetic mean and sample (n - 1) standard deviation.
pub fn mean_std(samples: &[f64]) -> (f64, Option<f64>) {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;

    let std_dev = if samples.len() > 1 {
        let ss: f64 = samples.iter().map(|x| (x - mean) * (x - mean)).sum();
        Some((ss / (n - 1.0)).sqrt())
    } else {
        None
    };

    (mean, std_dev)
}

/// The summaries of one raw file, one list of rows per metric, each sorted by key.
pub type Summary = BTreeMap<Metric, Vec<AggregatedRow>>;

fn parse_cell<T: std::str::FromStr>(
    record: &csv::StringRecord,
    idx: usize,
    column: &str,
    file: &str,
) -> Result<T, RunnerError> {
    let value = record.get(idx).unwrap_or("");
    value.parse::<T>().map_err(|_| RunnerError::BadValue {
        file: file.into(),
        column: column.into(),
        value: value.into(),
    })
}

/// Read a raw results file and summarise every metric per distinct key.
pub fn summarize_file(path: &Path) -> Result<Summary, failure::Error> {
    let file = path.display().to_string();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|_| format!("opening {}", file))?;

    let headers = reader.headers()?.clone();
    let index_of = |column: &str| {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| RunnerError::MissingColumn {
                file: file.clone(),
                column: column.into(),
            })
    };

    let key_idx = index_of(KEY_COLUMN)?;
    let metric_idx = Metric::ALL
        .iter()
        .map(|&m| Ok((m, index_of(m.column())?)))
        .collect::<Result<Vec<_>, RunnerError>>()?;

    let mut groups: BTreeMap<Metric, BTreeMap<u64, Vec<f64>>> = BTreeMap::new();

    for record in reader.records() {
        let record = record.with_context(|_| format!("reading {}", file))?;

        let key: u64 = parse_cell(&record, key_idx, KEY_COLUMN, &file)?;

        for &(metric, idx) in metric_idx.iter() {
            let value: f64 = parse_cell(&record, idx, metric.column(), &file)?;
            groups
                .entry(metric)
                .or_default()
                .entry(key)
                .or_default()
                .push(value);
        }
    }

    Ok(Metric::ALL
        .iter()
        .map(|&metric| {
            let rows = groups
                .remove(&metric)
                .unwrap_or_default()
                .into_iter()
                .map(|(key, samples)| {
                    let (mean, std_dev) = mean_std(&samples);
                    AggregatedRow { key, mean, std_dev }
                })
                .collect();
            (metric, rows)
        })
        .collect())
}

/// Format a float so that it reads back to the same value and is stable across runs.
fn format_float(x: f64) -> String {
    format!("{:?}", x)
}

/// Write the summary of one metric with the header `Keys,<metric>,<metric std>`.
pub fn write_summary(
    path: &Path,
    metric: Metric,
    rows: &[AggregatedRow],
) -> Result<(), failure::Error> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|_| format!("creating {}", path.display()))?;

    writer.write_record(&[KEY_COLUMN, metric.column(), metric.std_column()])?;
    for row in rows {
        writer.write_record(&[
            row.key.to_string(),
            format_float(row.mean),
            row.std_dev.map(format_float).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

/// Names of everything generated from one raw file: its base name (without extension) and the
/// name of the directory it was found in (the host it came from).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputNames {
    pub base: String,
    pub parent: String,
}

impl OutputNames {
    pub fn for_input(path: &Path) -> Result<Self, failure::Error> {
        let base = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| failure::format_err!("Bad file name: {}", path.display()))?;
        let parent = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .unwrap_or("");

        Ok(OutputNames {
            base: base.into(),
            parent: parent.into(),
        })
    }

    /// `<create|find>_<base>_<parent>.csv`
    pub fn summary(&self, metric: Metric) -> String {
        format!("{}_{}_{}.csv", metric.file_prefix(), self.base, self.parent)
    }

    /// `<base>_<parent>_pgfplots.tex`
    pub fn plot_document(&self) -> String {
        format!("{}_{}_pgfplots.tex", self.base, self.parent)
    }
}

/// All files under `start` with extension `ext`, in a stable order. Anything under `skip` (the
/// output directory, if it lies inside `start`) is ignored.
pub fn discover(
    start: &Path,
    ext: &str,
    skip: Option<&Path>,
) -> Result<Vec<PathBuf>, failure::Error> {
    let skip = skip.and_then(|s| s.canonicalize().ok());

    let walker = walkdir::WalkDir::new(start)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_entry(|e| match (&skip, e.path().canonicalize()) {
            (Some(skip), Ok(path)) => path != *skip,
            _ => true,
        });

    let mut files = vec![];
    for entry in walker {
        let entry = entry.with_context(|_| format!("walking {}", start.display()))?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(ext)
        {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
