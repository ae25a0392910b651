//! Compile the package's Go test binary and run its benchmarks across the hosts: the first `split`
//! hosts construct tables, the rest run lookups. Collects the text output.

use clap::clap_app;

use crate::{
    build::Build,
    cli::{self, is_usize},
    driver::{run_experiment, Experiment},
    paths::GOTEST_BINARY,
    remote::SshRemote,
    sweep::{GoTestSweep, Sweep},
};

pub fn cli_options() -> clap::App<'static, 'static> {
    let app = clap_app! { gotest =>
        (about: "Build the Go test binary, run its benchmarks across the hosts, and collect the \
                 output.")
        (@setting DisableVersion)
        (@arg SPLIT: --split +takes_value {is_usize}
         "How many hosts run the construction benchmark; the rest run lookups [default: 15]")
    };

    cli::add_cli_options(app)
}

fn parse_sweep(sub_m: &clap::ArgMatches<'_>) -> GoTestSweep {
    let mut sweep = GoTestSweep::default();
    if let Some(split) = sub_m.value_of("SPLIT") {
        sweep.split = split.parse::<usize>().unwrap();
    }
    sweep
}

pub fn run(sub_m: &clap::ArgMatches<'_>) -> Result<(), failure::Error> {
    let cfg = cli::parse_cli_options(sub_m)?;

    let exp = Experiment {
        build: cli::parse_build(
            sub_m,
            Build::GoTest {
                output: GOTEST_BINARY.into(),
            },
        ),
        sweep: Sweep::GoTest(parse_sweep(sub_m)),
        results_glob: "*.txt".into(),
    };

    run_experiment(&SshRemote, &cfg, &exp)?;

    Ok(())
}
