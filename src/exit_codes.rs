//! Standard exit codes for sfxkit binaries
//!
//! Failed status results carry an error kind that maps onto one of these,
//! so scripts driving the builder can tell failure categories apart.

/// Successful execution
pub const EXIT_SUCCESS: i32 = 0;

/// Generic error (avoid using - be more specific)
pub const EXIT_ERROR: i32 = 1;

/// Panic or unrecoverable error
pub const EXIT_PANIC: i32 = 101;

/// Required input missing, empty or of the wrong kind
pub const EXIT_PRECONDITION_ERROR: i32 = 102;

/// External archiver or copy utility exited non-zero
pub const EXIT_PROCESS_ERROR: i32 = 104;

/// Invalid command-line arguments or parameter out of range
pub const EXIT_INVALID_ARGS: i32 = 105;

/// I/O error (file not found, permission denied, disk error)
pub const EXIT_IO_ERROR: i32 = 106;

/// Expected file state did not hold after an operation reported success
pub const EXIT_VERIFICATION_ERROR: i32 = 107;

/// Configuration error (invalid manifest, unreadable store)
pub const EXIT_CONFIG_ERROR: i32 = 109;

/// Dependency error (installation root, bundled binary or staged artifact missing)
pub const EXIT_DEPENDENCY_ERROR: i32 = 110;
