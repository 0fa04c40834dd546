//! Installation root lookup and bundled binary checks

pub mod locator;
pub mod stores;
pub mod verifier;

pub use locator::{INSTALL_KEY, INSTALL_NAMESPACE, InstallationLocator};
pub use stores::{
    ChainStore, EnvStore, HOME_ENV, JsonFileStore, LocationStore, MemoryStore, default_store,
};
#[cfg(windows)]
pub use stores::RegistryStore;
pub use verifier::verify_binary;
