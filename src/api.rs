//! High-level API for sfxkit operations
//!
//! [`Toolkit`] exposes every build step as a [`StatusResult`]-returning call;
//! [`build_release`] chains them into a complete release build driven by a
//! [`ReleaseManifest`].

use crate::builder::defaults::{DEFAULT_COMPRESSION_LEVEL, PAYLOAD_DIR};
use crate::builder::{
    self, ArchiveRequest, AssemblyMethod, ChecksumAlgorithm, ReleaseRequest, SfxVariant,
};
use crate::exceptions::{Result, SfxError};
use crate::install::{InstallationLocator, verify_binary};
use crate::process::{ProcessRunner, SystemRunner};
use crate::status::StatusResult;
use crate::utils::is_env_true;
use crate::workspace::TempWorkspace;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment flag that keeps the workspace after a successful build
pub const KEEP_WORKSPACE_ENV: &str = "SFXKIT_KEEP_WORKSPACE";

/// Entry point for all build operations
///
/// All operations of one installation share its scratch workspace without
/// locking: only one build may be in flight per installation root.
#[derive(Debug)]
pub struct Toolkit {
    locator: InstallationLocator,
    runner: Box<dyn ProcessRunner>,
}

impl Toolkit {
    pub fn new(locator: InstallationLocator, runner: Box<dyn ProcessRunner>) -> Self {
        Self { locator, runner }
    }

    /// Toolkit using the default store chain and real processes
    pub fn system() -> Self {
        Self::new(InstallationLocator::system(), Box::new(SystemRunner))
    }

    pub fn locator(&self) -> &InstallationLocator {
        &self.locator
    }

    pub fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    fn workspace(&self) -> Result<TempWorkspace> {
        Ok(TempWorkspace::new(self.locator.resolve_root()?))
    }

    /// Resolve the installation root
    pub fn locate(&self) -> StatusResult<PathBuf> {
        self.locator.resolve()
    }

    /// Check that `path` is an existing executable
    pub fn verify_binary(&self, path: &Path) -> StatusResult<PathBuf> {
        StatusResult::from_result(
            verify_binary(path).map(|p| (format!("Binary verified: {}", p.display()), p)),
        )
    }

    /// Create the hidden scratch workspace (idempotent)
    pub fn create_hidden_temp_data(&self) -> StatusResult<PathBuf> {
        StatusResult::from_result(self.workspace().and_then(|ws| ws.create()))
    }

    /// Empty the scratch workspace, keeping the directory
    pub fn clean_hidden_temp_data(&self) -> StatusResult<PathBuf> {
        StatusResult::from_result(self.workspace().and_then(|ws| ws.clean()))
    }

    /// Remove the scratch workspace entirely
    pub fn remove_hidden_temp_data(&self) -> StatusResult<()> {
        StatusResult::from_result(self.workspace().and_then(|ws| ws.destroy()))
    }

    /// Copy the contents of `source` into `dest`
    pub fn prepare_data_bundle(&self, source: &Path, dest: &Path) -> StatusResult<PathBuf> {
        StatusResult::from_result(builder::prepare_data_bundle(source, dest))
    }

    /// Compress a directory into a `.7z` archive with the external archiver
    pub fn create_data_bundle(&self, request: &ArchiveRequest) -> StatusResult<PathBuf> {
        StatusResult::from_result(builder::create_data_bundle(
            request,
            &self.locator,
            self.runner.as_ref(),
        ))
    }

    /// Stage the stub module for `variant`
    pub fn prepare_sfx(&self, variant: SfxVariant) -> StatusResult<PathBuf> {
        StatusResult::from_result(builder::prepare_sfx(variant, &self.locator))
    }

    /// Stage the config template for `variant` as `config.txt`
    pub fn prepare_cfg(&self, variant: SfxVariant) -> StatusResult<PathBuf> {
        StatusResult::from_result(builder::prepare_cfg(variant, &self.locator))
    }

    /// Write a checksum report for `input`
    pub fn create_checksum(
        &self,
        input: &Path,
        algorithm: ChecksumAlgorithm,
        output_dir: Option<&Path>,
    ) -> StatusResult<PathBuf> {
        StatusResult::from_result(builder::create_checksum(input, algorithm, output_dir))
    }

    /// Assemble the release executable from the staged workspace
    pub fn create_release(&self, request: &ReleaseRequest) -> StatusResult<PathBuf> {
        StatusResult::from_result(builder::create_release(
            request,
            &self.locator,
            self.runner.as_ref(),
        ))
    }
}

fn default_compression_level() -> u8 {
    DEFAULT_COMPRESSION_LEVEL
}

fn default_variant() -> SfxVariant {
    SfxVariant::GuiMode
}

/// Description of a complete release build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseManifest {
    pub name: String,
    pub version: String,
    /// Directory whose contents become the payload
    pub source: PathBuf,
    #[serde(default = "default_variant")]
    pub variant: SfxVariant,
    #[serde(default = "default_compression_level")]
    pub compression_level: u8,
    #[serde(default)]
    pub method: AssemblyMethod,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub archiver: Option<PathBuf>,
    /// Write a checksum report with this algorithm
    #[serde(default)]
    pub checksum: Option<ChecksumAlgorithm>,
    #[serde(default)]
    pub keep_workspace: bool,
}

impl ReleaseManifest {
    /// Load a manifest from a JSON file
    ///
    /// Relative paths are resolved against the manifest's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SfxError::invalid_config(format!("Cannot read manifest {}: {e}", path.display()))
        })?;
        let mut manifest: ReleaseManifest = serde_json::from_str(&content).map_err(|e| {
            SfxError::invalid_config(format!("Invalid manifest {}: {e}", path.display()))
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        manifest.source = base.join(&manifest.source);
        manifest.output_path = manifest.output_path.map(|p| base.join(p));
        manifest.archiver = manifest.archiver.map(|p| base.join(p));
        Ok(manifest)
    }

    fn archive_request(&self, input_dir: &Path) -> ArchiveRequest {
        let request = ArchiveRequest::new(input_dir, self.name.as_str())
            .with_compression_level(self.compression_level);
        match self.archiver {
            Some(ref archiver) => request.with_archiver(archiver),
            None => request,
        }
    }

    fn release_request(&self) -> ReleaseRequest {
        let mut request =
            ReleaseRequest::new(self.name.as_str(), self.version.as_str()).with_method(self.method);
        if let Some(ref output_path) = self.output_path {
            request = request.with_output_path(output_path);
        }
        if let Some(algorithm) = self.checksum {
            request = request.with_checksum(algorithm);
        }
        request
    }
}

/// Run a complete release build
///
/// The workspace is emptied before staging so leftovers of an earlier build
/// cannot leak into this one. On success it is cleaned again unless the
/// manifest or `SFXKIT_KEEP_WORKSPACE` asks to keep it; a failed build leaves
/// it untouched for inspection.
pub fn build_release(toolkit: &Toolkit, manifest: &ReleaseManifest) -> StatusResult<PathBuf> {
    StatusResult::from_result(run_build(toolkit, manifest))
}

fn run_build(toolkit: &Toolkit, manifest: &ReleaseManifest) -> Result<(String, PathBuf)> {
    info!(
        "🦀 Building {} {} ({})",
        manifest.name, manifest.version, manifest.variant
    );
    let locator = toolkit.locator();
    let runner = toolkit.runner();

    let workspace = toolkit.workspace()?;
    workspace.create()?;
    workspace.clean()?;

    let (_, payload) =
        builder::prepare_data_bundle(&manifest.source, &workspace.join(PAYLOAD_DIR))?;
    builder::create_data_bundle(&manifest.archive_request(&payload), locator, runner)?;
    builder::prepare_sfx(manifest.variant, locator)?;
    builder::prepare_cfg(manifest.variant, locator)?;

    let (mut message, exe) =
        builder::create_release(&manifest.release_request(), locator, runner)?;

    if manifest.keep_workspace || is_env_true(KEEP_WORKSPACE_ENV) {
        info!("📁 Keeping workspace {}", workspace.path().display());
    } else if let Err(e) = workspace.clean() {
        warn!("⚠️ Workspace cleanup after build failed: {e}");
        message.push_str(&format!("; workspace cleanup failed: {e}"));
    }

    Ok((message, exe))
}
