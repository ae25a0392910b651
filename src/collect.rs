//! Pulling result files back from the hosts.

use std::path::{Path, PathBuf};

use failure::ResultExt;

use log::info;

use crate::{
    config::RunConfig,
    fanout::fan_out,
    paths::TIMESTAMP_FORMAT,
    remote::Remote,
    sweep::HostPool,
    Login,
};

/// The name of a run directory: `<prefix>_<local timestamp>`.
pub fn run_dir_name(prefix: &str, now: chrono::DateTime<chrono::Local>) -> String {
    format!("{}_{}", prefix, now.format(TIMESTAMP_FORMAT))
}

/// Create a fresh run directory under `root`, named after `prefix` and the current time.
pub fn create_run_dir(root: &Path, prefix: &str) -> Result<PathBuf, failure::Error> {
    let dir = root.join(run_dir_name(prefix, chrono::Local::now()));
    std::fs::create_dir_all(&dir)
        .with_context(|_| format!("creating run directory {}", dir.display()))?;
    Ok(dir)
}

/// Fetch every file matching `pattern` from each host of `pool` into `<run_dir>/<host>/`.
///
/// A subdirectory is created for every host, even one that turns out to have no matching files.
/// Hosts are fetched from concurrently; each writes only into its own subdirectory.
pub fn collect<R: Remote>(
    remote: &R,
    cfg: &RunConfig,
    pool: &HostPool,
    pattern: &str,
    run_dir: &Path,
) -> Result<(), failure::Error> {
    for host in pool.hosts() {
        std::fs::create_dir_all(run_dir.join(host))?;
    }

    info!("Fetching {} into {}", pattern, run_dir.display());

    fan_out(cfg.jobs, "fetch", pool.hosts(), |host| {
        let login = Login {
            hostname: host,
            username: &cfg.user,
        };
        let n = remote.fetch_glob(&login, pattern, &run_dir.join(host))?;
        info!("{}: fetched {} files", host, n);
        Ok(())
    })?
    .into_result()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{config::test_config, remote::mock::MockRemote};

    #[test]
    fn run_dir_is_timestamped_to_the_second() {
        let now = chrono::Local.ymd(2023, 9, 15).and_hms(21, 49, 14);
        assert_eq!(
            run_dir_name("bbhashbench", now),
            "bbhashbench_2023-09-15_21-49-14"
        );
    }

    #[test]
    fn files_land_under_their_host() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_config(tmp.path());
        let pool = HostPool::numbered("bbchain", 2..5);

        let mut remote = MockRemote::default();
        remote.files.insert(
            "bbchain3".into(),
            vec![("bbhash-seq-gamma-2.0-partitions-1.csv".into(), "x".into())],
        );

        let run_dir = create_run_dir(tmp.path(), "bbhashbench").unwrap();
        collect(&remote, &cfg, &pool, "*.csv", &run_dir).unwrap();

        for host in pool.hosts() {
            assert!(run_dir.join(host).is_dir());
        }
        assert!(run_dir
            .join("bbchain3")
            .join("bbhash-seq-gamma-2.0-partitions-1.csv")
            .is_file());
        assert_eq!(std::fs::read_dir(run_dir.join("bbchain2")).unwrap().count(), 0);
    }

    #[test]
    fn fetch_failure_names_the_host() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_config(tmp.path());
        let pool = HostPool::numbered("bbchain", 2..5);
        let remote = MockRemote::failing_on(&["bbchain4"]);

        let err = collect(&remote, &cfg, &pool, "*.txt", tmp.path()).unwrap_err();
        assert!(err.to_string().contains("bbchain4: connection refused"));
        // The other hosts were still fetched from.
        assert_eq!(remote.calls().len(), 3);
    }
}
