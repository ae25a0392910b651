//! Some routines for adding common CLI options in a consistent, less boilerplatey way.

use std::path::PathBuf;

use clap::{App, Arg, ArgMatches};

use crate::{
    build::Build,
    config::RunConfig,
    paths::{DEFAULT_FIRST_HOST, DEFAULT_HOST_PREFIX, DEFAULT_LAST_HOST},
};

pub fn is_usize(s: String) -> Result<(), String> {
    s.as_str()
        .parse::<usize>()
        .map(|_| ())
        .map_err(|e| format!("{:?}", e))
}

pub fn is_f64(s: String) -> Result<(), String> {
    s.as_str()
        .parse::<f64>()
        .map(|_| ())
        .map_err(|e| format!("{:?}", e))
}

/// Parse a comma-separated list of numbers, e.g. `2,4,8`.
pub fn parse_usize_list(s: &str) -> Result<Vec<usize>, failure::Error> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<usize>()
                .map_err(|e| failure::format_err!("bad number {:?} in list: {}", p, e))
        })
        .collect()
}

pub fn is_usize_list(s: String) -> Result<(), String> {
    parse_usize_list(&s).map(|_| ()).map_err(|e| e.to_string())
}

/// Options shared by every routine that talks to the hosts.
pub fn add_cli_options<'a, 'b>(app: App<'a, 'b>) -> App<'a, 'b> {
    app.arg(
        Arg::with_name("USER")
            .long("user")
            .takes_value(true)
            .help("The username on the hosts. Defaults to $USER."),
    )
    .arg(
        Arg::with_name("PREFIX")
            .long("prefix")
            .takes_value(true)
            .default_value(DEFAULT_HOST_PREFIX)
            .help("Host names are the prefix followed by a number (e.g. bbchain2)"),
    )
    .arg(
        Arg::with_name("FIRST")
            .long("first")
            .takes_value(true)
            .validator(is_usize)
            .help("The number of the first host (inclusive) [default: 2]"),
    )
    .arg(
        Arg::with_name("LAST")
            .long("last")
            .takes_value(true)
            .validator(is_usize)
            .help("The number of the last host (exclusive) [default: 30]"),
    )
    .arg(
        Arg::with_name("JOBS")
            .long("jobs")
            .short("j")
            .takes_value(true)
            .validator(is_usize)
            .help("How many hosts to talk to at once. 0 or absent means all of them."),
    )
    .arg(
        Arg::with_name("SOURCE")
            .long("source")
            .takes_value(true)
            .default_value(".")
            .help("The directory holding the benchmark sources"),
    )
    .arg(
        Arg::with_name("RESULTS")
            .long("results")
            .takes_value(true)
            .default_value(".")
            .help("The directory in which to create the timestamped results directory"),
    )
    .arg(
        Arg::with_name("BINARY")
            .long("binary")
            .takes_value(true)
            .help("Distribute this prebuilt benchmark binary instead of building one"),
    )
}

/// Parse and validate the values added by `add_cli_options`.
pub fn parse_cli_options(sub_m: &ArgMatches<'_>) -> Result<RunConfig, failure::Error> {
    let user = RunConfig::resolve_user(sub_m.value_of("USER"), std::env::var("USER").ok())?;

    let first_host = sub_m
        .value_of("FIRST")
        .map(|s| s.parse::<usize>().unwrap())
        .unwrap_or(DEFAULT_FIRST_HOST);
    let last_host = sub_m
        .value_of("LAST")
        .map(|s| s.parse::<usize>().unwrap())
        .unwrap_or(DEFAULT_LAST_HOST);
    // 0 means one worker per host, same as leaving it out.
    let jobs = sub_m
        .value_of("JOBS")
        .map(|s| s.parse::<usize>().unwrap())
        .filter(|&jobs| jobs > 0);

    let cfg = RunConfig {
        user,
        host_prefix: sub_m.value_of("PREFIX").unwrap().into(),
        first_host,
        last_host,
        jobs,
        source_dir: sub_m.value_of("SOURCE").unwrap().into(),
        results_root: sub_m.value_of("RESULTS").unwrap().into(),
    };
    cfg.validate()?;

    Ok(cfg)
}

/// The prebuilt binary given with `--binary`, if any; otherwise `default`.
pub fn parse_build(sub_m: &ArgMatches<'_>, default: Build) -> Build {
    match sub_m.value_of("BINARY") {
        Some(path) => Build::Prebuilt {
            path: PathBuf::from(path),
        },
        None => default,
    }
}
