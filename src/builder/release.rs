//! Release assembly: `stub ++ config.txt ++ {name}.7z` into `{name}.exe`

use super::archive::validate_artifact_name;
use super::checksums::{ChecksumAlgorithm, create_checksum};
use super::concat::{AssemblyMethod, concatenate_with, strategies_for};
use super::defaults::{
    ARCHIVE_EXTENSION, CONFIG_FILE, RELEASE_DIR, RELEASE_EXTENSION, STUB_SCAN_ORDER,
};
use crate::exceptions::{Result, SfxError};
use crate::install::InstallationLocator;
use crate::process::ProcessRunner;
use crate::utils::format_size;
use crate::workspace::{TempWorkspace, attributes::clear_readonly};
use anyhow::Context;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Parameters of a release build
#[derive(Debug, Clone)]
pub struct ReleaseRequest {
    /// Base name shared by the staged archive and the output executable
    pub name: String,
    pub version: String,
    pub method: AssemblyMethod,
    /// Output directory; defaults to `{root}/release/{name}-{version}`
    pub output_path: Option<PathBuf>,
    pub make_checksum: bool,
    pub checksum_algorithm: ChecksumAlgorithm,
}

impl ReleaseRequest {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, version: V) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            method: AssemblyMethod::default(),
            output_path: None,
            make_checksum: false,
            checksum_algorithm: ChecksumAlgorithm::default(),
        }
    }

    pub fn with_method(mut self, method: AssemblyMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_output_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_checksum(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.make_checksum = true;
        self.checksum_algorithm = algorithm;
        self
    }
}

/// First stub present in the workspace, in [`STUB_SCAN_ORDER`]
pub fn select_stub(workspace: &Path) -> Option<PathBuf> {
    STUB_SCAN_ORDER
        .iter()
        .map(|name| workspace.join(name))
        .find(|path| path.is_file())
}

/// Build the self-extracting executable from the staged workspace
///
/// Every check on staged inputs happens before the output directory is
/// touched or any process runs. A failing checksum step does not fail the
/// build; it is reported in the message only.
pub fn create_release(
    request: &ReleaseRequest,
    locator: &InstallationLocator,
    runner: &dyn ProcessRunner,
) -> Result<(String, PathBuf)> {
    validate_artifact_name(&request.name, "Release name")?;
    if request.version.trim().is_empty() {
        return Err(SfxError::precondition("Release version is required"));
    }

    let root = locator.resolve_root()?;
    let workspace = TempWorkspace::new(&root);
    let ws = workspace.require()?;

    let archive = ws.join(format!("{}.{ARCHIVE_EXTENSION}", request.name));
    if !archive.is_file() {
        return Err(SfxError::precondition(format!(
            "Staged archive not found: {}",
            archive.display()
        )));
    }

    let config = ws.join(CONFIG_FILE);
    if !config.is_file() {
        return Err(SfxError::precondition(format!(
            "Staged config not found: {}",
            config.display()
        )));
    }

    let stub = select_stub(ws).ok_or_else(|| {
        SfxError::precondition(format!(
            "No SFX module staged in {} (expected one of {})",
            ws.display(),
            STUB_SCAN_ORDER.join(", ")
        ))
    })?;
    debug!("🧩 Using SFX module {}", stub.display());

    let output_dir = match request.output_path {
        Some(ref path) => std::path::absolute(path)?,
        None => root
            .join(RELEASE_DIR)
            .join(format!("{}-{}", request.name, request.version)),
    };
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let target = output_dir.join(format!("{}.{RELEASE_EXTENSION}", request.name));
    if target.exists() {
        debug!("🗑️ Removing previous release: {}", target.display());
        clear_readonly(&target)?;
        fs::remove_file(&target)
            .with_context(|| format!("Failed to remove previous release {}", target.display()))?;
    }

    let parts = [stub, config, archive];
    let strategies = strategies_for(request.method, runner);
    let used = concatenate_with(&strategies, &parts, &target)?;

    if !target.is_file() {
        return Err(SfxError::postcondition(format!(
            "Release executable was not created: {}",
            target.display()
        )));
    }

    let size = fs::metadata(&target)?.len();
    let mut message = format!(
        "Release created: {} ({}, {used})",
        target.display(),
        format_size(size)
    );

    if request.make_checksum {
        match create_checksum(&target, request.checksum_algorithm, Some(&output_dir)) {
            Ok((_, report)) => {
                message.push_str(&format!(
                    "; {} checksum: {}",
                    request.checksum_algorithm,
                    report.display()
                ));
            }
            Err(e) => {
                warn!("⚠️ Checksum generation failed for {}: {e}", target.display());
                message.push_str(&format!("; checksum generation failed: {e}"));
            }
        }
    }

    info!("🎉 {message}");
    Ok((message, target))
}
