//! The benchmark driver: build, distribute, run, collect.

use std::path::{Path, PathBuf};

use log::info;

use serde::Serialize;

use crate::{
    build::Build,
    collect,
    config::RunConfig,
    fanout::fan_out,
    paths::{PARAMS_FILE, TIMINGS_FILE},
    remote::{Invocation, Remote},
    sweep::{HostPool, Sweep, Task},
    Login,
};

/// One benchmark experiment: what to build, how to sweep, and what to bring back.
#[derive(Clone, Debug, Serialize)]
pub struct Experiment {
    pub build: Build,
    pub sweep: Sweep,
    /// Glob for the result files the benchmark leaves in its working directory.
    pub results_glob: String,
}

/// What gets written to `params.json` in the run directory.
#[derive(Serialize)]
struct Params<'a> {
    config: &'a RunConfig,
    experiment: &'a Experiment,
    hosts: &'a HostPool,
    tasks: &'a [Task],
}

/// Copy `artifact` to every host of the pool.
pub fn distribute<R: Remote>(
    remote: &R,
    cfg: &RunConfig,
    pool: &HostPool,
    artifact: &Path,
) -> Result<(), failure::Error> {
    fan_out(cfg.jobs, "distribute", pool.hosts(), |host| {
        remote.copy(
            &Login {
                hostname: host,
                username: &cfg.user,
            },
            artifact,
        )
    })?
    .into_result()
}

/// Run every task's invocation of `program` on its host.
pub fn run_tasks<R: Remote>(
    remote: &R,
    cfg: &RunConfig,
    program: &str,
    tasks: &[Task],
) -> Result<(), failure::Error> {
    fan_out(cfg.jobs, "run", tasks, |task| {
        remote.run(
            &Login {
                hostname: &task.host,
                username: &cfg.user,
            },
            &Invocation {
                program: program.to_owned(),
                args: task.args.clone(),
            },
        )
    })?
    .into_result()
}

/// Run the whole experiment and return the run directory holding the collected results.
///
/// The sweep is mapped onto the host pool before anything else happens, so a pool that is too
/// small is reported before the build. Any failure aborts the remaining phases.
pub fn run_experiment<R: Remote>(
    remote: &R,
    cfg: &RunConfig,
    exp: &Experiment,
) -> Result<PathBuf, failure::Error> {
    cfg.validate()?;

    let pool = cfg.host_pool();
    let tasks = exp.sweep.tasks(&pool)?;
    let program = exp.build.binary_name()?;

    info!(
        "{} tasks of {} over {} hosts",
        tasks.len(),
        program,
        pool.len()
    );

    let mut timers = vec![];

    let artifact = time!(timers, "Build", exp.build.build(&cfg.source_dir)?);
    time!(timers, "Distribute", distribute(remote, cfg, &pool, &artifact)?);
    time!(timers, "Run", run_tasks(remote, cfg, &program, &tasks)?);

    let run_dir = collect::create_run_dir(&cfg.results_root, &program)?;
    time!(
        timers,
        "Collect",
        collect::collect(remote, cfg, &pool, &exp.results_glob, &run_dir)?
    );

    let params = Params {
        config: cfg,
        experiment: exp,
        hosts: &pool,
        tasks: &tasks,
    };
    std::fs::write(
        run_dir.join(PARAMS_FILE),
        serde_json::to_string_pretty(&params)?,
    )?;

    let timings = crate::timings_str(timers.as_slice());
    std::fs::write(run_dir.join(TIMINGS_FILE), &timings)?;
    println!("{}", timings);

    println!("RESULTS: {}", run_dir.display());

    Ok(run_dir)
}
