//! Key-value stores that persist the installation location

use crate::exceptions::{Result, SfxError};
use crate::utils::get_config_dir;
use log::{debug, trace};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the installation root
pub const HOME_ENV: &str = "SFXKIT_HOME";

/// Environment variable pointing at the JSON store file
pub const CONFIG_ENV: &str = "SFXKIT_CONFIG";

/// File name of the JSON store inside the config directory
pub const DEFAULT_STORE_FILE: &str = "install.json";

/// Read-only string lookup keyed by `(namespace, key)`
pub trait LocationStore: fmt::Debug {
    /// `Ok(None)` when the key is absent; `Err` only when the store itself is unreadable
    fn lookup(&self, namespace: &str, key: &str) -> Result<Option<String>>;

    /// Human-readable description used in messages
    fn describe(&self) -> String;
}

/// Store answering every lookup with one environment variable
#[derive(Debug, Clone)]
pub struct EnvStore {
    var: String,
}

impl EnvStore {
    pub fn new<S: Into<String>>(var: S) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvStore {
    fn default() -> Self {
        Self::new(HOME_ENV)
    }
}

impl LocationStore for EnvStore {
    fn lookup(&self, _namespace: &str, _key: &str) -> Result<Option<String>> {
        Ok(env::var(&self.var).ok())
    }

    fn describe(&self) -> String {
        format!("environment variable {}", self.var)
    }
}

/// JSON file of the shape `{ "<namespace>": { "<key>": "<value>" } }`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `$SFXKIT_CONFIG`, else `install.json` in the user config directory
    pub fn default_path() -> PathBuf {
        env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| get_config_dir().join(DEFAULT_STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocationStore for JsonFileStore {
    fn lookup(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        if !self.path.is_file() {
            trace!("No location store file at {:?}", self.path);
            return Ok(None);
        }

        let data = fs::read_to_string(&self.path)?;
        let document: serde_json::Value = serde_json::from_str(&data).map_err(|e| {
            SfxError::invalid_config(format!("Failed to parse {}: {e}", self.path.display()))
        })?;

        Ok(document
            .get(namespace)
            .and_then(|ns| ns.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }

    fn describe(&self) -> String {
        format!("config file {}", self.path.display())
    }
}

/// Fixed in-memory map, for embedders and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<(String, String), String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<S: Into<String>>(mut self, namespace: S, key: S, value: S) -> Self {
        self.values
            .insert((namespace.into(), key.into()), value.into());
        self
    }
}

impl LocationStore for MemoryStore {
    fn lookup(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn describe(&self) -> String {
        "in-memory store".to_string()
    }
}

/// Ordered list of stores; the first one holding the key wins
#[derive(Debug, Default)]
pub struct ChainStore {
    stores: Vec<Box<dyn LocationStore>>,
}

impl ChainStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, store: Box<dyn LocationStore>) -> Self {
        self.stores.push(store);
        self
    }
}

impl LocationStore for ChainStore {
    fn lookup(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        for store in &self.stores {
            if let Some(value) = store.lookup(namespace, key)? {
                debug!("🔑 {namespace}\\{key} found in {}", store.describe());
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.stores.iter().map(|s| s.describe()).collect();
        parts.join(", ")
    }
}

/// Windows registry, `HKLM` first and then `HKCU`
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryStore;

#[cfg(windows)]
impl RegistryStore {
    #[allow(unsafe_code)] // Required for Windows API FFI calls
    fn read_string(
        root: windows::Win32::System::Registry::HKEY,
        subkey: &str,
        value: &str,
    ) -> Result<Option<String>> {
        use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_SUCCESS};
        use windows::Win32::System::Registry::{RRF_RT_REG_SZ, RegGetValueW};
        use windows::core::PCWSTR;

        let wide_subkey: Vec<u16> = subkey.encode_utf16().chain(std::iter::once(0)).collect();
        let wide_value: Vec<u16> = value.encode_utf16().chain(std::iter::once(0)).collect();
        // REG_EXPAND_SZ values are expanded and returned as REG_SZ
        let flags = RRF_RT_REG_SZ;

        let mut size: u32 = 0;
        let status = unsafe {
            RegGetValueW(
                root,
                PCWSTR(wide_subkey.as_ptr()),
                PCWSTR(wide_value.as_ptr()),
                flags,
                None,
                None,
                Some(&mut size),
            )
        };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        if status != ERROR_SUCCESS {
            return Err(SfxError::invalid_config(format!(
                "Registry query for {subkey}\\{value} failed with code {}",
                status.0
            )));
        }

        let mut buffer = vec![0u16; size as usize / 2 + 1];
        let status = unsafe {
            RegGetValueW(
                root,
                PCWSTR(wide_subkey.as_ptr()),
                PCWSTR(wide_value.as_ptr()),
                flags,
                None,
                Some(buffer.as_mut_ptr() as *mut std::ffi::c_void),
                Some(&mut size),
            )
        };
        if status != ERROR_SUCCESS {
            return Err(SfxError::invalid_config(format!(
                "Registry read of {subkey}\\{value} failed with code {}",
                status.0
            )));
        }

        let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
        Ok(Some(String::from_utf16_lossy(&buffer[..len])))
    }
}

#[cfg(windows)]
impl LocationStore for RegistryStore {
    fn lookup(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        use windows::Win32::System::Registry::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE};

        if let Some(value) = Self::read_string(HKEY_LOCAL_MACHINE, namespace, key)? {
            return Ok(Some(value));
        }
        Self::read_string(HKEY_CURRENT_USER, namespace, key)
    }

    fn describe(&self) -> String {
        "Windows registry".to_string()
    }
}

/// Platform default: `SFXKIT_HOME`, then the registry (Windows), then the JSON file
pub fn default_store() -> Box<dyn LocationStore> {
    let chain = ChainStore::new().push(Box::new(EnvStore::default()));

    #[cfg(windows)]
    let chain = chain.push(Box::new(RegistryStore));

    Box::new(chain.push(Box::new(JsonFileStore::new(JsonFileStore::default_path()))))
}
