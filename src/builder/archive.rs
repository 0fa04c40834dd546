//! 7z archive creation through the external archiver

use super::defaults::{
    ARCHIVE_EXTENSION, DEFAULT_ARCHIVER, DEFAULT_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL,
};
use crate::exceptions::{Result, SfxError};
use crate::install::{InstallationLocator, verify_binary};
use crate::process::{ProcessCommand, ProcessRunner};
use crate::utils::format_size;
use crate::workspace::{TempWorkspace, attributes::clear_readonly};
use log::{debug, info, trace};
use std::fs;
use std::path::{Path, PathBuf};

/// Parameters of an archive build
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    /// Directory whose contents become the archive members
    pub input_dir: PathBuf,
    /// Archiver executable; defaults to the bundled 7za
    pub archiver: Option<PathBuf>,
    /// Archive base name, `.7z` is appended
    pub output_name: String,
    /// Output directory; defaults to the scratch workspace
    pub output_dir: Option<PathBuf>,
    /// 0 (store) to 9 (ultra)
    pub compression_level: u8,
}

impl ArchiveRequest {
    pub fn new<P: AsRef<Path>, S: Into<String>>(input_dir: P, output_name: S) -> Self {
        Self {
            input_dir: input_dir.as_ref().to_path_buf(),
            archiver: None,
            output_name: output_name.into(),
            output_dir: None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    pub fn with_archiver<P: AsRef<Path>>(mut self, archiver: P) -> Self {
        self.archiver = Some(archiver.as_ref().to_path_buf());
        self
    }

    pub fn with_output_dir<P: AsRef<Path>>(mut self, output_dir: P) -> Self {
        self.output_dir = Some(output_dir.as_ref().to_path_buf());
        self
    }

    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = level;
        self
    }

    /// Parameter checks that need no filesystem access
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(SfxError::invalid_argument(format!(
                "Compression level must be between 0 and {MAX_COMPRESSION_LEVEL}, got {}",
                self.compression_level
            )));
        }
        validate_artifact_name(&self.output_name, "Archive name")?;
        if self.input_dir.as_os_str().is_empty() {
            return Err(SfxError::precondition("Input directory is required"));
        }
        Ok(())
    }
}

/// Reject empty names and names that would escape their directory
pub(crate) fn validate_artifact_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SfxError::precondition(format!("{what} is required")));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(SfxError::invalid_argument(format!(
            "{what} must be a plain file name, got '{name}'"
        )));
    }
    Ok(())
}

/// Compress the contents of `request.input_dir` into `{output_dir}/{name}.7z`
pub fn create_data_bundle(
    request: &ArchiveRequest,
    locator: &InstallationLocator,
    runner: &dyn ProcessRunner,
) -> Result<(String, PathBuf)> {
    request.validate()?;

    let input_dir = &request.input_dir;
    if !input_dir.is_dir() {
        return Err(SfxError::precondition(format!(
            "Input directory not found: {}",
            input_dir.display()
        )));
    }

    let root = locator.resolve_root()?;

    let archiver_path = request
        .archiver
        .clone()
        .unwrap_or_else(|| root.join(DEFAULT_ARCHIVER));
    let archiver = verify_binary(&archiver_path)?;

    let output_dir = match request.output_dir {
        Some(ref dir) => {
            if !dir.exists() {
                debug!("📁 Creating archive output directory: {}", dir.display());
                fs::create_dir_all(dir)?;
            }
            dir.clone()
        }
        None => TempWorkspace::new(&root).require()?.to_path_buf(),
    };

    let archive_path =
        output_dir.join(format!("{}.{ARCHIVE_EXTENSION}", request.output_name));
    if archive_path.exists() {
        debug!("🗑️ Removing previous archive: {}", archive_path.display());
        clear_readonly(&archive_path)?;
        fs::remove_file(&archive_path)?;
    }

    let command = ProcessCommand::new(&archiver)
        .args([
            "a".to_string(),
            "-t7z".to_string(),
            format!("-mx{}", request.compression_level),
        ])
        .arg(archive_path.as_os_str())
        .arg(input_dir.join("*").as_os_str());

    info!(
        "🗜️ Building {} (level {}) from {}",
        archive_path.display(),
        request.compression_level,
        input_dir.display()
    );
    let output = runner.run(&command)?;
    trace!("Archiver stdout:\n{}", output.stdout);
    output.check(&command.display_name())?;

    if !archive_path.is_file() {
        return Err(SfxError::postcondition(format!(
            "Archiver exited successfully but {} was not created",
            archive_path.display()
        )));
    }

    let size = fs::metadata(&archive_path)?.len();
    info!("✅ Archive created: {} ({})", archive_path.display(), format_size(size));
    Ok((
        format!(
            "Archive created: {} ({})",
            archive_path.display(),
            format_size(size)
        ),
        archive_path,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::{INSTALL_KEY, INSTALL_NAMESPACE, MemoryStore};
    use crate::process::ProcessOutput;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Records commands; optionally writes the archive named by the 4th argument
    #[derive(Debug, Default)]
    struct FakeArchiver {
        calls: RefCell<Vec<ProcessCommand>>,
        exit_code: i32,
        stderr: String,
        write_archive: bool,
    }

    impl ProcessRunner for FakeArchiver {
        fn run(&self, command: &ProcessCommand) -> Result<ProcessOutput> {
            self.calls.borrow_mut().push(command.clone());
            if self.write_archive {
                fs::write(&command.args[3], b"7z\xbc\xaf\x27\x1c payload")?;
            }
            Ok(ProcessOutput {
                exit_code: self.exit_code,
                stdout: String::new(),
                stderr: self.stderr.clone(),
            })
        }
    }

    struct Fixture {
        _temp_dir: TempDir,
        root: PathBuf,
        input: PathBuf,
        locator: InstallationLocator,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("install");
        fs::create_dir_all(root.join("include/7zip")).unwrap();
        fs::write(root.join(DEFAULT_ARCHIVER), b"MZ").unwrap();
        TempWorkspace::new(&root).create().unwrap();

        let input = temp_dir.path().join("payload");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("app.exe"), b"MZ app").unwrap();

        let locator = InstallationLocator::new(Box::new(MemoryStore::new().with(
            INSTALL_NAMESPACE,
            INSTALL_KEY,
            &*root.to_string_lossy(),
        )));
        Fixture {
            _temp_dir: temp_dir,
            root,
            input,
            locator,
        }
    }

    #[test]
    fn test_builds_into_workspace_with_expected_arguments() {
        let fx = fixture();
        let runner = FakeArchiver {
            write_archive: true,
            ..Default::default()
        };

        let request = ArchiveRequest::new(&fx.input, "App").with_compression_level(9);
        let (message, archive) = create_data_bundle(&request, &fx.locator, &runner).unwrap();

        assert_eq!(archive, fx.root.join("tmpdata/App.7z"));
        assert!(archive.is_file());
        assert!(message.contains("bytes"));

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        let args: Vec<String> = calls[0]
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(&args[..3], &["a", "-t7z", "-mx9"]);
        assert_eq!(args[3], archive.to_string_lossy());
        assert_eq!(args[4], fx.input.join("*").to_string_lossy());
    }

    #[test]
    fn test_level_out_of_range_rejected_before_spawn() {
        let fx = fixture();
        let runner = FakeArchiver::default();

        let request = ArchiveRequest::new(&fx.input, "App").with_compression_level(10);
        let err = create_data_bundle(&request, &fx.locator, &runner).unwrap_err();

        assert!(matches!(err, SfxError::InvalidArgument(_)));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_non_zero_exit_surfaces_stderr() {
        let fx = fixture();
        let runner = FakeArchiver {
            exit_code: 2,
            stderr: "ERROR: disk full".into(),
            ..Default::default()
        };

        let err = create_data_bundle(&ArchiveRequest::new(&fx.input, "App"), &fx.locator, &runner)
            .unwrap_err();
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_zero_exit_without_file_is_failure() {
        let fx = fixture();
        let runner = FakeArchiver::default();

        let err = create_data_bundle(&ArchiveRequest::new(&fx.input, "App"), &fx.locator, &runner)
            .unwrap_err();
        assert!(matches!(err, SfxError::Postcondition(_)));
    }

    #[test]
    fn test_previous_archive_is_replaced() {
        let fx = fixture();
        let stale = fx.root.join("tmpdata/App.7z");
        fs::write(&stale, "stale").unwrap();
        // The runner does not write: a leftover file must not count as success
        let runner = FakeArchiver::default();

        let result =
            create_data_bundle(&ArchiveRequest::new(&fx.input, "App"), &fx.locator, &runner);
        assert!(result.is_err());
        assert!(!stale.exists());
    }

    #[test]
    fn test_explicit_output_dir_is_created() {
        let fx = fixture();
        let runner = FakeArchiver {
            write_archive: true,
            ..Default::default()
        };
        let out = fx.root.join("out/archives");

        let request = ArchiveRequest::new(&fx.input, "Data").with_output_dir(&out);
        let (_, archive) = create_data_bundle(&request, &fx.locator, &runner).unwrap();
        assert_eq!(archive, out.join("Data.7z"));
    }

    #[test]
    fn test_missing_archiver_fails_before_spawn() {
        let fx = fixture();
        fs::remove_file(fx.root.join(DEFAULT_ARCHIVER)).unwrap();
        let runner = FakeArchiver::default();

        let err = create_data_bundle(&ArchiveRequest::new(&fx.input, "App"), &fx.locator, &runner)
            .unwrap_err();
        assert!(matches!(err, SfxError::MissingDependency(_)));
        assert!(runner.calls.borrow().is_empty());
    }
}
