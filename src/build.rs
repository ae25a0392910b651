//! Building the benchmark artifact locally.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;

use serde::{Deserialize, Serialize};

use crate::{
    error::RunnerError,
    paths::{TARGET_GOARCH, TARGET_GOOS},
};

/// How to obtain the binary that is copied to the hosts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Build {
    /// `go build -o <output> <entry>`, cross-compiled for the hosts.
    GoBuild { entry: String, output: String },

    /// `go test -c -o <output> ./`, cross-compiled for the hosts.
    GoTest { output: String },

    /// An artifact that was built elsewhere.
    Prebuilt { path: PathBuf },
}

impl Build {
    /// The file name of the artifact, which is also the program name on the remotes.
    pub fn binary_name(&self) -> Result<String, failure::Error> {
        let path: &Path = match self {
            Build::GoBuild { output, .. } | Build::GoTest { output } => Path::new(output),
            Build::Prebuilt { path } => path,
        };

        path.file_name()
            .and_then(|name| name.to_str())
            .map(str::to_owned)
            .ok_or_else(|| failure::format_err!("Artifact has no file name: {}", path.display()))
    }

    /// The build command to run, if any.
    fn command(&self, source_dir: &Path) -> Option<Command> {
        let mut cmd = Command::new("go");
        match self {
            Build::GoBuild { entry, output } => {
                cmd.args(&["build", "-o", output.as_str(), entry.as_str()]);
            }
            Build::GoTest { output } => {
                cmd.args(&["test", "-c", "-o", output.as_str(), "./"]);
            }
            Build::Prebuilt { .. } => return None,
        }
        cmd.current_dir(source_dir)
            .env("GOOS", TARGET_GOOS)
            .env("GOARCH", TARGET_GOARCH);
        Some(cmd)
    }

    /// Build the artifact in `source_dir` and return its path. A failed build is fatal.
    pub fn build(&self, source_dir: &Path) -> Result<PathBuf, failure::Error> {
        let path = match self {
            Build::GoBuild { output, .. } | Build::GoTest { output } => source_dir.join(output),
            Build::Prebuilt { path } => path.clone(),
        };

        if let Some(mut cmd) = self.command(source_dir) {
            info!("Building {:?}", cmd);

            let status = cmd.status()?;
            if !status.success() {
                return Err(RunnerError::Build {
                    command: format!("{:?}", cmd),
                    code: status.code(),
                }
                .into());
            }
        }

        if !path.is_file() {
            failure::bail!("Artifact not found: {}", path.display());
        }

        Ok(path)
    }
}
