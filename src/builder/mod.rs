//! Release build steps
//!
//! Each step works on the scratch workspace of the resolved installation
//! root and returns `Result<(message, payload)>`; [`crate::api::Toolkit`]
//! turns these into [`crate::status::StatusResult`]s.

pub mod archive;
pub mod checksums;
pub mod concat;
pub mod data_bundle;
pub mod defaults;
pub mod release;
pub mod sfx;

pub use archive::{ArchiveRequest, create_data_bundle};
pub use checksums::{ChecksumAlgorithm, calculate_checksum, create_checksum};
pub use concat::{
    AssemblyMethod, ConcatStrategy, CopyCommandStrategy, StreamStrategy, concatenate_with,
    strategies_for,
};
pub use data_bundle::prepare_data_bundle;
pub use release::{ReleaseRequest, create_release, select_stub};
pub use sfx::{SfxVariant, prepare_cfg, prepare_sfx};
