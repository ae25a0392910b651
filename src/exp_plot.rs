//! Turn collected CSVs into per-key summaries and LaTeX plot documents.

use std::path::Path;

use clap::{clap_app, Arg};

use crate::plot::{self, PlotOptions, PlotStyle};

pub fn cli_options() -> clap::App<'static, 'static> {
    clap_app! { plot =>
        (about: "Summarise every result file under a directory and write pgfplots documents plus \
                 an index.")
        (@setting DisableVersion)
        (@arg START_DIR: +required +takes_value
         "The directory to search (recursively) for result files")
        (@arg BAR: --bar
         "Draw bar charts instead of lines")
    }
    .arg(
        Arg::with_name("PLOT_DIR")
            .long("plot-dir")
            .takes_value(true)
            .default_value("plot")
            .help("Where to write the summaries and documents"),
    )
    .arg(
        Arg::with_name("EXT")
            .long("ext")
            .takes_value(true)
            .default_value("csv")
            .help("Extension of the result files"),
    )
}

fn parse_options(sub_m: &clap::ArgMatches<'_>) -> PlotOptions {
    PlotOptions {
        ext: sub_m.value_of("EXT").unwrap().into(),
        style: if sub_m.is_present("BAR") {
            PlotStyle::Bar
        } else {
            PlotStyle::Line
        },
    }
}

pub fn run(sub_m: &clap::ArgMatches<'_>) -> Result<(), failure::Error> {
    let start_dir = Path::new(sub_m.value_of("START_DIR").unwrap());
    let plot_dir = Path::new(sub_m.value_of("PLOT_DIR").unwrap());

    let mut timers = vec![];
    let index = time!(
        timers,
        "Plot",
        plot::generate(start_dir, plot_dir, &parse_options(sub_m))?
    );

    println!("{}", crate::timings_str(timers.as_slice()));
    println!("RESULTS: {}", index.display());

    Ok(())
}
