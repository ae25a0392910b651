//! Fetch result files left on the hosts by an earlier run, without building or running anything.

use clap::{clap_app, Arg};

use crate::{cli, collect, paths::BENCH_BINARY, remote::SshRemote};

pub fn cli_options() -> clap::App<'static, 'static> {
    let app = clap_app! { fetch =>
        (about: "Fetch result files from every host into a new timestamped directory.")
        (@setting DisableVersion)
    }
    .arg(
        Arg::with_name("PATTERN")
            .long("pattern")
            .takes_value(true)
            .default_value("*.csv")
            .help("Glob, relative to the remote home directory, of the files to fetch"),
    )
    .arg(
        Arg::with_name("NAME")
            .long("name")
            .takes_value(true)
            .default_value(BENCH_BINARY)
            .help("Prefix of the results directory name"),
    );

    cli::add_cli_options(app)
}

pub fn run(sub_m: &clap::ArgMatches<'_>) -> Result<(), failure::Error> {
    let cfg = cli::parse_cli_options(sub_m)?;
    let pattern = sub_m.value_of("PATTERN").unwrap();
    let name = sub_m.value_of("NAME").unwrap();

    let pool = cfg.host_pool();
    let run_dir = collect::create_run_dir(&cfg.results_root, name)?;

    let mut timers = vec![];
    time!(
        timers,
        "Collect",
        collect::collect(&SshRemote, &cfg, &pool, pattern, &run_dir)?
    );

    println!("{}", crate::timings_str(timers.as_slice()));
    println!("RESULTS: {}", run_dir.display());

    Ok(())
}
