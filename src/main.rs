//! This program builds the bbhash benchmarks, runs them across a pool of hosts, collects the
//! results, and turns them into plots. Which routine is chosen by passing different command line
//! arguments. Certain routines require extra arguments.

fn run() -> Result<(), failure::Error> {
    let matches = clap::App::new("bbrunner")
        .about(
            "This program builds the bbhash benchmarks, runs them across a pool of hosts, \
             collects the results, and turns them into plots. Which routine is chosen by passing \
             different command line arguments. Certain routines require extra arguments.",
        )
        .subcommand(bbrunner::exp_sweep::cli_options())
        .subcommand(bbrunner::exp_gotest::cli_options())
        .subcommand(bbrunner::exp_fetch::cli_options())
        .subcommand(bbrunner::exp_plot::cli_options())
        .setting(clap::AppSettings::SubcommandRequiredElseHelp)
        .setting(clap::AppSettings::DisableVersion)
        .get_matches();

    match matches.subcommand() {
        ("sweep", Some(sub_m)) => bbrunner::exp_sweep::run(sub_m),
        ("gotest", Some(sub_m)) => bbrunner::exp_gotest::run(sub_m),
        ("fetch", Some(sub_m)) => bbrunner::exp_fetch::run(sub_m),

        ("plot", Some(sub_m)) => bbrunner::exp_plot::run(sub_m),

        _ => {
            unreachable!();
        }
    }
}

fn main() {
    use console::style;

    env_logger::init();

    // Backtraces cost nothing noticeable next to minutes of remote benchmarking.
    std::env::set_var("RUST_BACKTRACE", "1");

    if let Err(err) = run() {
        const BANNER: &str = r#"== bbrunner failed ========================================================================
If a remote batch failed, every failing host is listed below. Rerun with RUST_LOG=debug to see each remote command.
Run directories and plot files written before the failure are left as they are; `bbrunner fetch`
can pull results that were produced on the hosts but never collected.
"#;

        println!("{}", style(BANNER).red().bold());

        if err.downcast_ref::<spurs::SshError>().is_some() {
            println!("The failure came from the SSH connection or a remote command.");
        }

        println!("{}\n\n{}", err.as_fail(), err.backtrace());

        std::process::exit(101);
    }
}
