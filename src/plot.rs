//! Turning summaries into pgfplots documents, plus the `main.tex` that pulls them all together.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use failure::ResultExt;

use log::info;

use regex::Regex;

use crate::{
    aggregate::{discover, summarize_file, write_summary, Metric, OutputNames},
    error::RunnerError,
    paths::INDEX_FILE,
    sweep::Method,
};

/// Benchmark result files are named `bbhash-<method>-gamma-<gamma>-partitions-<partitions>.csv`,
/// and everything generated from them keeps that name as a substring.
const NAME_PATTERN: &str = r"bbhash-(\w+)-gamma-(\d+\.\d+)-partitions-(\d+)";

/// `NAME_PATTERN`, compiled on first use.
fn name_regex() -> &'static Regex {
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    NAME_REGEX.get_or_init(|| Regex::new(NAME_PATTERN).unwrap())
}

/// The parameters encoded in a result file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlotName {
    /// The method tag, e.g. `par2`. Not necessarily one we know about.
    pub method: String,
    /// The gamma value exactly as written in the name, e.g. `2.0`.
    pub gamma: String,
    pub partitions: u64,
}

impl PlotName {
    /// Find the parameters anywhere in `filename`. `None` if they are not there.
    pub fn parse(filename: &str) -> Option<PlotName> {
        let caps = name_regex().captures(filename)?;

        Some(PlotName {
            method: caps[1].to_owned(),
            gamma: caps[2].to_owned(),
            partitions: caps[3].parse().ok()?,
        })
    }

    /// The known method, if it is one.
    pub fn known_method(&self) -> Option<Method> {
        Method::from_tag(&self.method)
    }
}

/// The title of the plot of `metric` for the summary file `filename`, e.g.
/// `Create Parallel2, Gamma 2.0, Partitions 4`. Unknown methods appear as their raw tag, and the
/// partitions clause is left out for single-partition runs.
pub fn title(filename: &str, metric: Metric) -> Result<String, RunnerError> {
    let name =
        PlotName::parse(filename).ok_or_else(|| RunnerError::FilenameFormat(filename.into()))?;

    let method: &str = match name.known_method() {
        Some(method) => method.display_name(),
        None => name.method.as_str(),
    };

    let mut parts = vec![
        format!("{} {}", metric.action(), method),
        format!("Gamma {}", name.gamma),
    ];
    if name.partitions != 1 {
        parts.push(format!("Partitions {}", name.partitions));
    }

    Ok(parts.join(", "))
}

/// How each summary is drawn. Both are log-log.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlotStyle {
    /// Lines with symmetric error bars.
    Line,
    /// Bars with error bars.
    Bar,
}

/// The `tikzpicture` for one summary file.
pub fn axis(style: PlotStyle, title: &str, csv_file: &str, metric: Metric) -> String {
    match style {
        PlotStyle::Line => format!(
            r#"
\begin{{tikzpicture}}
\begin{{axis}}[
    title={{{title}}},
    xlabel=Keys,
    ylabel=Time (ms),
    xmode=log,
    ymode=log
]
\addplot+[
    error bars/.cd,
    y dir=both,
    y explicit
] table [
    x=Keys,
    y={avg},
    y error={std},
    col sep=comma
] {{./{file}}};
\end{{axis}}
\end{{tikzpicture}}
"#,
            title = title,
            avg = metric.column(),
            std = metric.std_column(),
            file = csv_file,
        ),

        PlotStyle::Bar => format!(
            r#"
\begin{{tikzpicture}}
\begin{{axis}}[
    title={{{title}}},
    xlabel=Keys,
    ylabel=Time (ms),
    ymajorgrids=true,
    ybar,
    xmode=log,
    ymode=log,
    bar width=20pt
]
\addplot[
    fill,
    error bars/.cd,
    y explicit
] table [
    x=Keys,
    y={avg},
    y error={std},
    col sep=comma
] {{{file}}};
\end{{axis}}
\end{{tikzpicture}}
"#,
            title = title,
            avg = metric.column(),
            std = metric.std_column(),
            file = csv_file,
        ),
    }
}

/// The figure for one raw file: the create and find plots side by side.
pub fn plot_document(style: PlotStyle, names: &OutputNames) -> Result<String, RunnerError> {
    let mut doc = String::from("\\begin{figure}[ht!]\n\\centering\n");

    for (i, &metric) in Metric::ALL.iter().enumerate() {
        let csv_file = names.summary(metric);

        if i > 0 {
            doc.push_str("\\hfill\n");
        }
        doc.push_str("\\begin{subfigure}[b]{0.45\\linewidth}\n");
        doc.push_str(&axis(style, &title(&csv_file, metric)?, &csv_file, metric));
        doc.push_str("\\end{subfigure}\n");
    }

    doc.push_str("\\end{figure}\n");
    Ok(doc)
}

/// Position of a plot document in the index.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexKey {
    /// By partitions, then method (unknown methods after known ones), then name.
    Named {
        partitions: u64,
        rank: usize,
        name: String,
    },
    /// Names without benchmark parameters go last.
    Other(String),
}

impl IndexKey {
    pub fn of(filename: &str) -> IndexKey {
        match PlotName::parse(filename) {
            Some(name) => IndexKey::Named {
                partitions: name.partitions,
                rank: name
                    .known_method()
                    .map(Method::rank)
                    .unwrap_or(Method::ALL.len()),
                name: filename.into(),
            },
            None => IndexKey::Other(filename.into()),
        }
    }
}

/// `main.tex`, which inputs every plot document in index order.
pub fn index_document(tex_files: &[String]) -> String {
    let mut files: Vec<&String> = tex_files.iter().collect();
    files.sort_by_key(|f| IndexKey::of(f));

    let mut doc = String::from(
        "\\documentclass[11pt]{article}\n\
         \\usepackage{pgfplots}\n\
         \\pgfplotsset{compat=1.18}\n\
         \\usepackage{subcaption}\n\
         \\usepackage[margin=1in]{geometry}\n\
         \\begin{document}\n",
    );

    for file in files {
        doc.push_str(&format!("\\input{{{}}}\n", file));
        doc.push_str("\\vspace{1cm}\n");
    }

    doc.push_str("\\end{document}\n");
    doc
}

/// Write `main.tex` for every `.tex` file in `plot_dir` (other than `main.tex` itself).
pub fn write_index(plot_dir: &Path) -> Result<PathBuf, failure::Error> {
    let mut tex_files = vec![];
    for entry in std::fs::read_dir(plot_dir)
        .with_context(|_| format!("listing {}", plot_dir.display()))?
    {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(".tex") && name != INDEX_FILE {
                tex_files.push(name.to_owned());
            }
        }
    }

    let path = plot_dir.join(INDEX_FILE);
    std::fs::write(&path, index_document(&tex_files))?;
    Ok(path)
}

/// Options for `generate`.
#[derive(Clone, Debug)]
pub struct PlotOptions {
    /// Extension of the raw result files, e.g. `csv`.
    pub ext: String,
    pub style: PlotStyle,
}

impl Default for PlotOptions {
    fn default() -> Self {
        PlotOptions {
            ext: "csv".into(),
            style: PlotStyle::Line,
        }
    }
}

/// Summarise every raw result file under `start_dir` into `plot_dir`, write a plot document for
/// each, and write the index. Returns the path of the index.
///
/// A raw file whose name does not carry the benchmark parameters aborts the whole run.
pub fn generate(
    start_dir: &Path,
    plot_dir: &Path,
    opts: &PlotOptions,
) -> Result<PathBuf, failure::Error> {
    std::fs::create_dir_all(plot_dir)
        .with_context(|_| format!("creating {}", plot_dir.display()))?;

    let inputs = discover(start_dir, &opts.ext, Some(plot_dir))?;
    info!("Processing {} files under {}", inputs.len(), start_dir.display());

    for input in inputs.iter() {
        info!("Processing {}", input.display());

        let names = OutputNames::for_input(input)?;
        let document = plot_document(opts.style, &names)?;
        let summary = summarize_file(input)?;

        for (&metric, rows) in summary.iter() {
            write_summary(&plot_dir.join(names.summary(metric)), metric, rows)?;
        }
        std::fs::write(plot_dir.join(names.plot_document()), document)?;
    }

    write_index(plot_dir)
}
