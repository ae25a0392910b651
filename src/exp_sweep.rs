//! Run the standalone benchmark over the partition sweep: `seq` and `par` once each, then `par2`
//! for every partition count, each on its own block of hosts. Collects the CSVs.

use clap::clap_app;

use crate::{
    build::Build,
    cli::{self, is_f64, is_usize, is_usize_list, parse_usize_list},
    driver::{run_experiment, Experiment},
    paths::{BENCH_BINARY, BENCH_ENTRY},
    remote::SshRemote,
    sweep::{PartitionSweep, Sweep},
    RunnerError,
};

pub fn cli_options() -> clap::App<'static, 'static> {
    let app = clap_app! { sweep =>
        (about: "Build the benchmark, run the partition sweep across the hosts, and collect the \
                 CSVs.")
        (@setting DisableVersion)
        (@arg GAMMA: --gamma +takes_value {is_f64}
         "The gamma parameter [default: 2.0]")
        (@arg COUNT: --count +takes_value {is_usize}
         "How many times each measurement is repeated [default: 10]")
        (@arg BLOCK: --block +takes_value {is_usize}
         "How many hosts run each sweep point [default: 2]")
        (@arg PARTITIONS: --partitions +takes_value {is_usize_list}
         "Comma-separated partition counts for par2 [default: 2,4,...,4096]")
        (@arg KEYS: --keys +takes_value {is_usize}
         "Use this many keys instead of the benchmark's built-in range")
        (@arg ENTRY: --entry +takes_value
         "The Go file to build [default: ./main.go]")
        (@arg SWEEP: --sweep +takes_value conflicts_with[GAMMA COUNT BLOCK PARTITIONS KEYS]
         "Read the sweep definition from this JSON file instead")
    };

    cli::add_cli_options(app)
}

/// The sweep described by the command line.
fn parse_sweep(sub_m: &clap::ArgMatches<'_>) -> Result<Sweep, failure::Error> {
    if let Some(path) = sub_m.value_of("SWEEP") {
        return match Sweep::from_file(std::path::Path::new(path))? {
            sweep @ Sweep::Partitions(_) => Ok(sweep),
            Sweep::GoTest(_) => Err(RunnerError::Config(format!(
                "{} is a go_test sweep; run it with `bbrunner gotest`",
                path
            ))
            .into()),
        };
    }

    let mut sweep = PartitionSweep::default();
    if let Some(gamma) = sub_m.value_of("GAMMA") {
        sweep.gamma = gamma.parse::<f64>().unwrap();
    }
    if let Some(count) = sub_m.value_of("COUNT") {
        sweep.count = count.parse::<usize>().unwrap();
    }
    if let Some(block) = sub_m.value_of("BLOCK") {
        sweep.block = block.parse::<usize>().unwrap();
    }
    if let Some(partitions) = sub_m.value_of("PARTITIONS") {
        sweep.partitions = parse_usize_list(partitions)?;
    }
    if let Some(keys) = sub_m.value_of("KEYS") {
        sweep.keys = Some(keys.parse::<usize>().unwrap());
    }

    Ok(Sweep::Partitions(sweep))
}

pub fn run(sub_m: &clap::ArgMatches<'_>) -> Result<(), failure::Error> {
    let cfg = cli::parse_cli_options(sub_m)?;

    let build = cli::parse_build(
        sub_m,
        Build::GoBuild {
            entry: sub_m.value_of("ENTRY").unwrap_or(BENCH_ENTRY).into(),
            output: BENCH_BINARY.into(),
        },
    );

    let exp = Experiment {
        build,
        sweep: parse_sweep(sub_m)?,
        results_glob: "*.csv".into(),
    };

    run_experiment(&SshRemote, &cfg, &exp)?;

    Ok(())
}
