//! A library of routines for running the bbhash benchmarks across a cluster and turning the
//! results into plots.
//!
//! The flow of a benchmark run is: build the benchmark locally, copy it to every host in the
//! pool, run one sweep point per block of hosts, and pull the result files back into a
//! timestamped directory. The `plot` routines then aggregate those files into summary CSVs and
//! pgfplots documents.

// Must be imported first because the other submodules use the macros defined therein.
#[macro_use]
mod macros;

pub mod aggregate;
pub mod build;
pub mod cli;
pub mod collect;
pub mod config;
pub mod driver;
pub mod error;
pub mod fanout;
pub mod plot;
pub mod remote;
pub mod sweep;

pub mod exp_fetch;
pub mod exp_gotest;
pub mod exp_plot;
pub mod exp_sweep;

pub use error::RunnerError;

/// Information needed to log into a remote machine.
#[derive(Clone, Debug)]
pub struct Login<'u, 'h> {
    /// A human-readable address for the host (e.g. `bbchain2`).
    pub hostname: &'h str,
    /// The username to log in as.
    pub username: &'u str,
}

impl Login<'_, '_> {
    /// The `user@host` form used by `scp` and `ssh`.
    pub fn user_at_host(&self) -> String {
        format!("{}@{}", self.username, self.hostname)
    }

    /// The socket address the SSH library connects to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.hostname, paths::SSH_PORT)
    }
}

/// Common paths and fixed names.
pub mod paths {
    /// The directory on each remote into which the benchmark is copied and from which results are
    /// fetched. Benchmarks write their results to their working directory, which is this one.
    pub const REMOTE_DIR: &str = "~";

    /// The port for SSH connections.
    pub const SSH_PORT: u16 = 22;

    /// The OS and architecture the benchmark is cross-compiled for.
    pub const TARGET_GOOS: &str = "linux";
    pub const TARGET_GOARCH: &str = "amd64";

    /// The default naming scheme for the host pool: `bbchain2` ... `bbchain29`.
    pub const DEFAULT_HOST_PREFIX: &str = "bbchain";
    pub const DEFAULT_FIRST_HOST: usize = 2;
    pub const DEFAULT_LAST_HOST: usize = 30;

    /// The entry point and output name for the standalone benchmark.
    pub const BENCH_ENTRY: &str = "./main.go";
    pub const BENCH_BINARY: &str = "bbhashbench";

    /// The output name for the `go test` benchmark binary.
    pub const GOTEST_BINARY: &str = "bbhash.test";

    /// Files written into every run directory.
    pub const PARAMS_FILE: &str = "params.json";
    pub const TIMINGS_FILE: &str = "timings.txt";

    /// Format of the timestamp suffix on run directories.
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

    /// The name of the generated LaTeX index.
    pub const INDEX_FILE: &str = "main.tex";
}

/// Given an array of timings, generate a human-readable string.
pub fn timings_str(timings: &[(&str, std::time::Duration)]) -> String {
    let mut s = String::new();
    for (label, d) in timings.iter() {
        s.push_str(&format!("{}: {:?}\n", label, d));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_addresses() {
        let login = Login {
            hostname: "bbchain4",
            username: "alice",
        };
        assert_eq!(login.user_at_host(), "alice@bbchain4");
        assert_eq!(login.socket_addr(), "bbchain4:22");
    }

    #[test]
    fn timings_are_one_per_line() {
        let s = timings_str(&[
            ("Build", std::time::Duration::from_secs(1)),
            ("Run", std::time::Duration::from_millis(5)),
        ]);
        assert_eq!(s, "Build: 1s\nRun: 5ms\n");
    }
}
