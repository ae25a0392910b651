//! The failures that `bbrunner` knows how to name. Everything else (I/O, SSH, CSV) travels as a
//! plain `failure::Error`.

use failure_derive::Fail;

#[derive(Debug, Fail)]
pub enum RunnerError {
    /// A required configuration value is missing or invalid. Raised before any work begins.
    #[fail(display = "configuration error: {}", _0)]
    Config(String),

    /// The local build of the benchmark artifact failed.
    #[fail(display = "build failed: `{}` exited with {:?}", command, code)]
    Build { command: String, code: Option<i32> },

    /// The sweep needs more hosts than the pool has.
    #[fail(
        display = "host pool exhausted: the sweep needs {} hosts but only {} are available",
        needed, available
    )]
    HostPoolExhausted { needed: usize, available: usize },

    /// Some tasks of a fan-out batch failed. `details` has one `host: error` line per failure.
    #[fail(display = "{} of {} remote tasks failed:\n{}", failed, total, details)]
    FanOut {
        failed: usize,
        total: usize,
        details: String,
    },

    /// A file name does not follow `bbhash-<method>-gamma-<g>-partitions-<p>`.
    #[fail(display = "unexpected filename format: {}", _0)]
    FilenameFormat(String),

    /// A results file lacks a column the aggregator needs.
    #[fail(display = "{}: missing column `{}`", file, column)]
    MissingColumn { file: String, column: String },

    /// A results file has a cell that does not parse.
    #[fail(display = "{}: bad value {:?} in column `{}`", file, value, column)]
    BadValue {
        file: String,
        column: String,
        value: String,
    },
}
