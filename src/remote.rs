//! Primitives for acting on a single remote host: copy a file to it, run a command on it, and
//! fetch files from it.

use std::path::Path;
use std::process::Command;

use log::{debug, warn};

use spurs::{cmd, Execute, SshShell};

use crate::{paths::REMOTE_DIR, Login};

/// A program and its arguments, to be run from `REMOTE_DIR` on a remote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// The name of the binary, relative to `REMOTE_DIR`.
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// The single command line sent over SSH.
    pub fn command_line(&self) -> String {
        let mut line = format!("./{}", self.program);
        for arg in self.args.iter() {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// The operations the driver needs from a remote-access channel. Implementations must be usable
/// from several worker threads at once; each call addresses exactly one host.
pub trait Remote: Sync {
    /// Copy `local` into `REMOTE_DIR` on the host. Any running instance of a program with the same
    /// name is killed first, since a running binary cannot be overwritten.
    fn copy(&self, login: &Login<'_, '_>, local: &Path) -> Result<(), failure::Error>;

    /// Run `invocation` on the host, failing if it exits non-zero. Any prior instance of the
    /// program is killed first, and that step never fails the run.
    fn run(&self, login: &Login<'_, '_>, invocation: &Invocation) -> Result<(), failure::Error>;

    /// Fetch every file in `REMOTE_DIR` matching `pattern` (e.g. `*.csv`) into `dest`. Returns
    /// the number of files fetched. A pattern that matches nothing is not an error.
    fn fetch_glob(
        &self,
        login: &Login<'_, '_>,
        pattern: &str,
        dest: &Path,
    ) -> Result<usize, failure::Error>;
}

/// A `pkill -f` pattern for `program` that cannot match the shell running the `pkill` itself.
fn pkill_pattern(program: &str) -> String {
    let mut chars = program.chars();
    match chars.next() {
        Some(first) => format!("'[{}]{}'", first, chars.as_str()),
        None => String::new(),
    }
}

/// Kill any running instance of `program`. Errors from `pkill` (e.g. nothing was running) are
/// ignored; only connection errors are returned.
fn kill_prior_instance(shell: &SshShell, program: &str) -> Result<(), failure::Error> {
    shell.run(cmd!("pkill -f {}", pkill_pattern(program)).allow_error())?;
    Ok(())
}

/// Run `cmd` locally, failing with the given description if it exits non-zero.
fn run_local(mut cmd: Command, what: &str) -> Result<(), failure::Error> {
    debug!("{:?}", cmd);

    let status = cmd.status()?;

    if !status.success() {
        failure::bail!("{} failed. Exit code: {:?}", what, status.code());
    }

    Ok(())
}

/// The real remote-access channel: commands go through an SSH session using the default key, and
/// files move with `scp`.
#[derive(Clone, Debug, Default)]
pub struct SshRemote;

impl SshRemote {
    fn connect(login: &Login<'_, '_>) -> Result<SshShell, failure::Error> {
        Ok(SshShell::with_default_key(
            login.username,
            login.socket_addr(),
        )?)
    }
}

impl Remote for SshRemote {
    fn copy(&self, login: &Login<'_, '_>, local: &Path) -> Result<(), failure::Error> {
        let program = local
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| failure::format_err!("Not a file: {}", local.display()))?;

        let shell = Self::connect(login)?;
        kill_prior_instance(&shell, program)?;

        let mut cmd = Command::new("scp");
        cmd.arg(local.as_os_str())
            .arg(format!("{}:{}/", login.user_at_host(), REMOTE_DIR));

        run_local(cmd, &format!("scp to {}", login.hostname))
    }

    fn run(&self, login: &Login<'_, '_>, invocation: &Invocation) -> Result<(), failure::Error> {
        let shell = Self::connect(login)?;
        kill_prior_instance(&shell, &invocation.program)?;

        debug!("{}: {}", login.hostname, invocation.command_line());
        shell.run(cmd!("{}", invocation.command_line()).cwd(REMOTE_DIR))?;

        Ok(())
    }

    fn fetch_glob(
        &self,
        login: &Login<'_, '_>,
        pattern: &str,
        dest: &Path,
    ) -> Result<usize, failure::Error> {
        // `scp` fails on a glob with no matches, so list the matches first.
        let shell = Self::connect(login)?;
        let listing = shell
            .run(
                cmd!("ls -1 {} 2>/dev/null", pattern)
                    .cwd(REMOTE_DIR)
                    .use_bash()
                    .allow_error(),
            )?
            .stdout;
        let matches = listing.lines().filter(|l| !l.trim().is_empty()).count();

        if matches == 0 {
            warn!("{}: no files match {}", login.hostname, pattern);
            return Ok(0);
        }

        let mut cmd = Command::new("scp");
        cmd.arg(format!(
            "{}:{}",
            login.user_at_host(),
            dir!(REMOTE_DIR, pattern)
        ))
        .arg(dest.as_os_str());

        run_local(cmd, &format!("scp from {}", login.hostname))?;

        Ok(matches)
    }
}
