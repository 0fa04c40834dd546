//! Scratch workspace management

pub mod attributes;
pub mod directories;

pub use attributes::{clear_readonly_recursive, is_hidden_system, set_hidden_system};
pub use directories::{TempWorkspace, WORKSPACE_DIR};
