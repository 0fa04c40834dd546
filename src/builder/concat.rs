//! Binary concatenation of staged release parts
//!
//! Two interchangeable strategies produce `part0 ++ part1 ++ ...` at a target
//! path. [`CopyCommandStrategy`] hands the work to the OS copy utility through
//! a [`ProcessRunner`]; [`StreamStrategy`] streams the parts in-process.
//! [`concatenate_with`] walks an ordered strategy list until one succeeds.

use crate::exceptions::{Result, SfxError};
use anyhow::Context;
use crate::process::{ProcessCommand, ProcessRunner};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// One way of writing `parts` back to back into `target`
pub trait ConcatStrategy: fmt::Debug {
    fn name(&self) -> &'static str;

    /// Write the concatenation of `parts` to `target`, replacing it
    fn concatenate(&self, parts: &[PathBuf], target: &Path) -> Result<()>;
}

/// Which strategies a release build may use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AssemblyMethod {
    /// Copy utility first, then in-process streaming
    #[default]
    Auto,
    /// OS copy utility only
    CopyCommand,
    /// In-process streaming only
    Stream,
}

impl AssemblyMethod {
    pub fn name(self) -> &'static str {
        match self {
            AssemblyMethod::Auto => "auto",
            AssemblyMethod::CopyCommand => "copy",
            AssemblyMethod::Stream => "stream",
        }
    }
}

impl fmt::Display for AssemblyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssemblyMethod {
    type Err = SfxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(AssemblyMethod::Auto),
            "copy" | "copy-command" | "command" => Ok(AssemblyMethod::CopyCommand),
            "stream" => Ok(AssemblyMethod::Stream),
            other => Err(SfxError::invalid_argument(format!(
                "Unknown assembly method '{other}' (expected auto, copy or stream)"
            ))),
        }
    }
}

impl TryFrom<String> for AssemblyMethod {
    type Error = SfxError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AssemblyMethod> for String {
    fn from(value: AssemblyMethod) -> Self {
        value.name().to_string()
    }
}

/// Concatenation through `copy /b` on Windows and `cat` elsewhere
#[derive(Debug)]
pub struct CopyCommandStrategy<'a> {
    runner: &'a dyn ProcessRunner,
}

impl<'a> CopyCommandStrategy<'a> {
    pub fn new(runner: &'a dyn ProcessRunner) -> Self {
        Self { runner }
    }

    /// `cmd /d /s /c "copy /b /y "a"+"b"+"c" "target""`
    #[cfg(windows)]
    fn build_command(&self, parts: &[PathBuf], target: &Path) -> Result<ProcessCommand> {
        let shell = std::env::var_os("COMSPEC")
            .map(PathBuf::from)
            .or_else(|| which::which("cmd.exe").ok())
            .ok_or_else(|| SfxError::missing("Command interpreter (cmd.exe) not found"))?;

        Ok(ProcessCommand::new(shell)
            .args(["/d", "/s", "/c"])
            .raw_arg(copy_command_line(parts, target)?))
    }

    /// `sh -c 'cat -- "$1" "$2" ... > "$N"' sh part... target`
    #[cfg(not(windows))]
    fn build_command(&self, parts: &[PathBuf], target: &Path) -> Result<ProcessCommand> {
        let shell = which::which("sh").unwrap_or_else(|_| PathBuf::from("/bin/sh"));
        let inputs: Vec<String> = (1..=parts.len()).map(|i| format!("\"${i}\"")).collect();
        let script = format!(
            "cat -- {} > \"${}\"",
            inputs.join(" "),
            parts.len() + 1
        );

        Ok(ProcessCommand::new(shell)
            .arg("-c")
            .arg(script)
            .arg("sh")
            .args(parts.iter().map(|p| p.as_os_str().to_os_string()))
            .arg(target.as_os_str()))
    }
}

impl ConcatStrategy for CopyCommandStrategy<'_> {
    fn name(&self) -> &'static str {
        "copy-command"
    }

    fn concatenate(&self, parts: &[PathBuf], target: &Path) -> Result<()> {
        if parts.is_empty() {
            return Err(SfxError::invalid_argument("Nothing to concatenate"));
        }
        let parts = parts
            .iter()
            .map(std::path::absolute)
            .collect::<io::Result<Vec<_>>>()?;
        let target = std::path::absolute(target)?;
        let command = self.build_command(&parts, &target)?;
        let output = self.runner.run(&command)?;
        output.check(&command.display_name())?;
        Ok(())
    }
}

/// Command line for `cmd /s /c`, every operand quoted
///
/// With `/s` cmd strips only the outer quotes, so spaces and parentheses in
/// paths survive. `%` would still be expanded and `"` cannot be quoted.
#[cfg(any(windows, test))]
fn copy_command_line(parts: &[PathBuf], target: &Path) -> Result<String> {
    let quote = |path: &Path| {
        let text = path.to_string_lossy();
        if text.contains(['"', '%']) {
            return Err(SfxError::invalid_argument(format!(
                "'{text}' cannot be passed to copy /b"
            )));
        }
        Ok(format!("\"{text}\""))
    };

    let sources = parts
        .iter()
        .map(|part| quote(part))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("\"copy /b /y {} {}\"", sources.join("+"), quote(target)?))
}

/// In-process concatenation with `io::copy`
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamStrategy;

impl ConcatStrategy for StreamStrategy {
    fn name(&self) -> &'static str {
        "stream"
    }

    fn concatenate(&self, parts: &[PathBuf], target: &Path) -> Result<()> {
        let mut out = File::create(target)
            .with_context(|| format!("Failed to create {}", target.display()))?;
        for part in parts {
            let mut input =
                File::open(part).with_context(|| format!("Failed to open {}", part.display()))?;
            let bytes_copied = io::copy(&mut input, &mut out)?;
            debug!("📝 Appended {} ({bytes_copied} bytes)", part.display());
        }
        out.flush()?;
        Ok(())
    }
}

/// Strategy list for `method`; only `Auto` has more than one entry
pub fn strategies_for(
    method: AssemblyMethod,
    runner: &dyn ProcessRunner,
) -> Vec<Box<dyn ConcatStrategy + '_>> {
    match method {
        AssemblyMethod::Auto => vec![
            Box::new(CopyCommandStrategy::new(runner)),
            Box::new(StreamStrategy),
        ],
        AssemblyMethod::CopyCommand => vec![Box::new(CopyCommandStrategy::new(runner))],
        AssemblyMethod::Stream => vec![Box::new(StreamStrategy)],
    }
}

/// Try each strategy in order and return the name of the one that worked
///
/// A strategy counts as successful only if it returns `Ok` and `target` is a
/// file afterwards. Leftovers from a failed attempt are removed before the
/// next strategy runs. When every strategy fails the last error is returned.
pub fn concatenate_with(
    strategies: &[Box<dyn ConcatStrategy + '_>],
    parts: &[PathBuf],
    target: &Path,
) -> Result<&'static str> {
    let mut last_error = None;

    for strategy in strategies {
        remove_partial(target)?;
        debug!("🔗 Concatenating with {} strategy", strategy.name());

        let error = match strategy.concatenate(parts, target) {
            Ok(()) if target.is_file() => {
                info!("🔗 Assembled {} ({})", target.display(), strategy.name());
                return Ok(strategy.name());
            }
            Ok(()) => SfxError::postcondition(format!(
                "{} strategy reported success but {} does not exist",
                strategy.name(),
                target.display()
            )),
            Err(e) => e,
        };

        warn!("⚠️ {} strategy failed: {error}", strategy.name());
        if let Err(e) = remove_partial(target) {
            debug!("Could not remove partial output {}: {e}", target.display());
        }
        last_error = Some(error);
    }

    Err(last_error.unwrap_or_else(|| SfxError::invalid_argument("No assembly strategy given")))
}

fn remove_partial(target: &Path) -> Result<()> {
    if target.is_file() {
        fs::remove_file(target)?;
    }
    Ok(())
}
