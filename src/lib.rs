//! sfxkit - self-extracting release builder
//!
//! This crate stages a payload into a hidden scratch workspace, compresses it
//! with the bundled 7-Zip archiver and concatenates an SFX stub, its config
//! and the archive into a single release executable.

// Enforce strict code quality and reliability
#![deny(
    // Safety
    unsafe_code,

    // Future compatibility
    future_incompatible,

    // Rust 2018 idioms
    rust_2018_idioms,
)]
#![warn(
    // Correctness
    missing_debug_implementations,
    unreachable_pub,

    // Error handling best practices
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::unimplemented,
    clippy::todo,

    // Performance
    clippy::inefficient_to_string,
    clippy::large_enum_variant,

    // Code clarity and maintainability
    clippy::cognitive_complexity,
    clippy::type_complexity,

    // Best practices
    clippy::clone_on_ref_ptr,
    clippy::wildcard_imports,
    clippy::enum_glob_use,
    clippy::if_not_else,
    clippy::needless_continue,
    clippy::explicit_iter_loop,
    clippy::explicit_into_iter_loop,
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod api;
pub mod builder;
pub mod exceptions;
pub mod exit_codes;
pub mod install;
pub mod logger;
pub mod process;
pub mod status;
pub mod utils;
pub mod version;
pub mod workspace;

// Re-export main API types
pub use api::{ReleaseManifest, Toolkit, build_release};
pub use builder::{
    ArchiveRequest, AssemblyMethod, ChecksumAlgorithm, ReleaseRequest, SfxVariant,
};
pub use exceptions::{Result, SfxError};
pub use install::InstallationLocator;
pub use process::{ProcessCommand, ProcessOutput, ProcessRunner, SystemRunner};
pub use status::{StatusCode, StatusResult};
pub use workspace::TempWorkspace;
