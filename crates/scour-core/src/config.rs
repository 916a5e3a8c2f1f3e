use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const GIB: u64 = 1024 * MIB;

/// When overwritten data is forced to stable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPolicy {
    /// One flush + fsync after the last pass. A crash mid-wipe may leave
    /// an intermediate pass unflushed.
    #[default]
    FinalPass,
    /// fsync after every pass.
    EveryPass,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScourConfig {
    pub passes: u32,
    pub rename: bool,
    pub rename_passes: u32,
    pub chunk_size: usize,
    pub sync_policy: SyncPolicy,
    pub journal_file_size: u64,
    pub journal_fallback_files: u64,
    pub flood_rename_passes: u32,
    pub storage_file_size: u64,
    pub storage_chunk_size: usize,
}

impl Default for ScourConfig {
    fn default() -> Self {
        Self {
            passes: 3,
            rename: true,
            rename_passes: 3,
            chunk_size: MIB as usize,
            sync_policy: SyncPolicy::FinalPass,
            journal_file_size: KIB,
            journal_fallback_files: 100_000,
            flood_rename_passes: 3,
            storage_file_size: 100 * MIB,
            storage_chunk_size: 10 * MIB as usize,
        }
    }
}

impl ScourConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.passes == 0 {
            return Err(Error::Other("passes must be at least 1".to_string()));
        }
        if self.rename && self.rename_passes == 0 {
            return Err(Error::Other(
                "rename_passes must be at least 1 when renaming is enabled".to_string(),
            ));
        }
        if self.chunk_size == 0 || self.storage_chunk_size == 0 {
            return Err(Error::Other("chunk sizes must be non-zero".to_string()));
        }
        if self.journal_file_size == 0 || self.storage_file_size == 0 {
            return Err(Error::Other("flood file sizes must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Load `Scour.{toml,yaml,json,...}` from the working directory if present,
/// then `SCOUR_*` environment variables on top.
pub fn load_configuration() -> Result<ScourConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Scour").required(false))
        .add_source(Environment::with_prefix("SCOUR"))
        .build()?;
    builder.try_deserialize::<ScourConfig>()
}
