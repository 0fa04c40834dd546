//! Checksum reports for release artifacts
//!
//! Report format (three lines):
//! ```text
//! C:\sfxkit\release\App-v1.0.0\App.exe
//! SHA256 CHECKSUM: 9F86D081884C7D659A2FEAA0C55AD015A3BF4F1B2B0B822CD15D6C15B0F00A08
//! Monday 19.10.2026 14:03:12
//! ```

use super::defaults::{CHECKSUM_CHUNK_SIZE, CHECKSUM_REPORT_SUFFIX, CHECKSUM_TIMESTAMP_FORMAT};
use crate::exceptions::{Result, SfxError};
use crate::utils::canonical_path;
use chrono::Local;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Supported checksum algorithms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    /// Label used in the report, e.g. `SHA256`
    pub fn label(self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha256 => "SHA256",
            ChecksumAlgorithm::Sha512 => "SHA512",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumAlgorithm::Sha256 => write!(f, "SHA-256"),
            ChecksumAlgorithm::Sha512 => write!(f, "SHA-512"),
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = SfxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            "sha512" => Ok(ChecksumAlgorithm::Sha512),
            other => Err(SfxError::invalid_argument(format!(
                "Unknown checksum algorithm: {other} (expected SHA256 or SHA512)"
            ))),
        }
    }
}

/// Calculate an uppercase hex digest using streaming I/O
pub fn calculate_checksum<R: Read>(
    mut reader: R,
    algorithm: ChecksumAlgorithm,
) -> std::io::Result<String> {
    let mut buffer = vec![0u8; CHECKSUM_CHUNK_SIZE];

    match algorithm {
        ChecksumAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
            Ok(hex::encode_upper(hasher.finalize()))
        }
        ChecksumAlgorithm::Sha512 => {
            let mut hasher = Sha512::new();
            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
            Ok(hex::encode_upper(hasher.finalize()))
        }
    }
}

/// Report path for `input` inside `output_dir`: `{stem}.checksum.txt`
pub fn report_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "checksum".to_string());
    output_dir.join(format!("{stem}{CHECKSUM_REPORT_SUFFIX}"))
}

/// Hash `input` and write its checksum report
///
/// The report goes next to the input unless `output_dir` names an existing
/// directory; a missing `output_dir` falls back to the input's directory.
pub fn create_checksum(
    input: &Path,
    algorithm: ChecksumAlgorithm,
    output_dir: Option<&Path>,
) -> Result<(String, PathBuf)> {
    if input.as_os_str().is_empty() {
        return Err(SfxError::precondition("Input file is required"));
    }
    if !input.exists() {
        return Err(SfxError::precondition(format!(
            "Input file not found: {}",
            input.display()
        )));
    }
    if !input.is_file() {
        return Err(SfxError::precondition(format!(
            "Input is not a file: {}",
            input.display()
        )));
    }

    let input = canonical_path(input)?;
    let input_dir = input
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| SfxError::precondition("Input file has no parent directory"))?;

    let target_dir = match output_dir {
        Some(dir) if dir.is_dir() => dir.to_path_buf(),
        Some(dir) => {
            debug!(
                "Output directory {} does not exist, writing report next to the input",
                dir.display()
            );
            input_dir
        }
        None => input_dir,
    };

    let digest = calculate_checksum(File::open(&input)?, algorithm)?;
    let timestamp = Local::now().format(CHECKSUM_TIMESTAMP_FORMAT);
    let report = format!(
        "{}\n{} CHECKSUM: {digest}\n{timestamp}\n",
        input.display(),
        algorithm.label()
    );

    let report_file = report_path(&input, &target_dir);
    fs::write(&report_file, report)?;

    info!("🔐 {algorithm} checksum written to {}", report_file.display());
    Ok((
        format!(
            "{algorithm} checksum written to {}",
            report_file.display()
        ),
        report_file,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_known_digest() {
        let digest = calculate_checksum(&b"test"[..], ChecksumAlgorithm::Sha256).unwrap();
        assert_eq!(
            digest,
            "9F86D081884C7D659A2FEAA0C55AD015A3BF4F1B2B0B822CD15D6C15B0F00A08"
        );

        let digest = calculate_checksum(&b""[..], ChecksumAlgorithm::Sha512).unwrap();
        assert_eq!(digest.len(), 128);
        assert!(digest.starts_with("CF83E1357EEFB8BD"));
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!(
            "SHA-512".parse::<ChecksumAlgorithm>().unwrap(),
            ChecksumAlgorithm::Sha512
        );
        assert_eq!(
            "sha256".parse::<ChecksumAlgorithm>().unwrap(),
            ChecksumAlgorithm::Sha256
        );
        assert!("md5".parse::<ChecksumAlgorithm>().is_err());
    }

    #[test]
    fn test_report_format() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("App.exe");
        fs::write(&input, b"test").unwrap();

        let (_, report) = create_checksum(&input, ChecksumAlgorithm::Sha256, None).unwrap();
        assert_eq!(report.file_name().unwrap(), "App.checksum.txt");

        let content = fs::read_to_string(&report).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], canonical_path(&input).unwrap().to_string_lossy());
        assert!(!lines[0].starts_with(r"\\?\"));
        assert_eq!(
            lines[1],
            "SHA256 CHECKSUM: 9F86D081884C7D659A2FEAA0C55AD015A3BF4F1B2B0B822CD15D6C15B0F00A08"
        );
        // "{Weekday} {DD.MM.YYYY} {HH:mm:ss}"
        let parts: Vec<&str> = lines[2].split(' ').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].ends_with("day"));
        assert_eq!(parts[1].len(), 10);
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn test_digest_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("data.bin");
        fs::write(&input, vec![7u8; 100_000]).unwrap();

        let (_, first) = create_checksum(&input, ChecksumAlgorithm::Sha512, None).unwrap();
        let first_digest = fs::read_to_string(&first).unwrap().lines().nth(1).unwrap().to_string();
        let (_, second) = create_checksum(&input, ChecksumAlgorithm::Sha512, None).unwrap();
        let second_digest = fs::read_to_string(&second).unwrap().lines().nth(1).unwrap().to_string();

        assert_eq!(first, second);
        assert_eq!(first_digest, second_digest);
        assert!(first_digest.starts_with("SHA512 CHECKSUM: "));
    }

    #[test]
    fn test_missing_output_dir_falls_back_to_input_dir() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("App.exe");
        fs::write(&input, b"x").unwrap();

        let (_, report) = create_checksum(
            &input,
            ChecksumAlgorithm::Sha256,
            Some(&temp_dir.path().join("missing")),
        )
        .unwrap();
        assert_eq!(
            report,
            canonical_path(temp_dir.path()).unwrap().join("App.checksum.txt")
        );
    }

    #[test]
    fn test_explicit_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("App.exe");
        fs::write(&input, b"x").unwrap();
        let out = temp_dir.path().join("reports");
        fs::create_dir(&out).unwrap();

        let (_, report) =
            create_checksum(&input, ChecksumAlgorithm::Sha256, Some(&out)).unwrap();
        assert_eq!(report, out.join("App.checksum.txt"));
    }

    #[test]
    fn test_directory_input_fails() {
        let temp_dir = TempDir::new().unwrap();
        assert!(create_checksum(temp_dir.path(), ChecksumAlgorithm::Sha256, None).is_err());
    }
}
