// Centralized layout names and default values

// =================================
// Installation layout
// =================================
pub const SFX_SOURCE_DIR: &str = "include/sfx"; // Stubs and config templates
pub const DEFAULT_ARCHIVER: &str = "include/7zip/7za.exe"; // Bundled 7-Zip console
pub const RELEASE_DIR: &str = "release"; // {root}/release/{name}-{version}

// =================================
// Staged artifact names
// =================================
pub const CONFIG_FILE: &str = "config.txt";
pub const ARCHIVE_EXTENSION: &str = "7z";
pub const RELEASE_EXTENSION: &str = "exe";
pub const PAYLOAD_DIR: &str = "payload"; // Staging subdirectory used by the pipeline

/// Stub file names in selection order; the first one present is used
pub const STUB_SCAN_ORDER: [&str; 4] = ["7z.sfx", "7zCon.sfx", "7zS2.sfx", "7zSD.sfx"];

// =================================
// Archiver defaults
// =================================
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 5;
pub const MAX_COMPRESSION_LEVEL: u8 = 9;

// =================================
// Checksum report
// =================================
pub const CHECKSUM_REPORT_SUFFIX: &str = ".checksum.txt";
pub const CHECKSUM_TIMESTAMP_FORMAT: &str = "%A %d.%m.%Y %H:%M:%S";
pub const CHECKSUM_CHUNK_SIZE: usize = 8 * 1024 * 1024; // 8MB streaming buffer
