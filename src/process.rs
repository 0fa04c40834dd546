//! External process invocation
//!
//! The archiver and the OS copy utility are run through [`ProcessRunner`] so
//! that callers and tests can substitute their own implementation. Calls are
//! synchronous and have no timeout: a hung child hangs the caller.

use crate::exceptions::{Result, SfxError};
use log::{debug, trace};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A program invocation: executable, arguments and optional working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Appended after `args` without any quoting on Windows (`cmd` command lines)
    pub raw_args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
}

impl ProcessCommand {
    pub fn new<P: AsRef<Path>>(program: P) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            raw_args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg<S: Into<OsString>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Argument passed through verbatim on Windows; a regular argument elsewhere
    pub fn raw_arg<S: Into<OsString>>(mut self, arg: S) -> Self {
        self.raw_args.push(arg.into());
        self
    }

    pub fn current_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Short program name for messages
    pub fn display_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in self.args.iter().chain(&self.raw_args) {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured exit code and output of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `-1` when the process was terminated by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit into [`SfxError::ProcessFailed`]
    pub fn check(self, program: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(SfxError::ProcessFailed {
                program: program.to_string(),
                code: self.exit_code,
                stderr: self.stderr,
            })
        }
    }
}

/// Runs a command to completion and captures its output
pub trait ProcessRunner: fmt::Debug {
    /// Run `command`, blocking until it exits
    ///
    /// Returns `Err` only when the process could not be started; a non-zero
    /// exit code is reported through [`ProcessOutput::exit_code`].
    fn run(&self, command: &ProcessCommand) -> Result<ProcessOutput>;
}

/// [`ProcessRunner`] backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &ProcessCommand) -> Result<ProcessOutput> {
        debug!("▶️  Running: {command}");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        for raw in &command.raw_args {
            #[cfg(windows)]
            {
                use std::os::windows::process::CommandExt;
                cmd.raw_arg(raw);
            }
            #[cfg(not(windows))]
            cmd.arg(raw);
        }
        if let Some(ref dir) = command.current_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| {
            SfxError::Generic(format!(
                "Failed to start {}: {e}",
                command.program.display()
            ))
        })?;

        let result = ProcessOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        trace!(
            "⏹️  {} exited with {} (stdout {} bytes, stderr {} bytes)",
            command.display_name(),
            result.exit_code,
            result.stdout.len(),
            result.stderr.len()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = ProcessCommand::new("/opt/tools/7za.exe")
            .arg("a")
            .args(["-t7z", "-mx5"])
            .current_dir("/tmp");

        assert_eq!(cmd.args.len(), 3);
        assert_eq!(cmd.display_name(), "7za.exe");
        assert_eq!(cmd.current_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(cmd.to_string(), "/opt/tools/7za.exe a -t7z -mx5");

        let cmd = ProcessCommand::new("cmd.exe")
            .args(["/d", "/s", "/c"])
            .raw_arg("\"copy /b /y \"a\" \"b\"\"");
        assert_eq!(cmd.raw_args.len(), 1);
        assert_eq!(cmd.to_string(), "cmd.exe /d /s /c \"copy /b /y \"a\" \"b\"\"");
    }

    #[test]
    fn test_check_non_zero_exit() {
        let output = ProcessOutput {
            exit_code: 2,
            stdout: String::new(),
            stderr: "bad archive".into(),
        };
        let err = output.check("7za").unwrap_err();
        assert!(matches!(err, SfxError::ProcessFailed { code: 2, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_exit_code() {
        let output = SystemRunner
            .run(&ProcessCommand::new("sh").args(["-c", "echo oops >&2; exit 3"]))
            .unwrap();
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stderr.trim(), "oops");
    }
}
