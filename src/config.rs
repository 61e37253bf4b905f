use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::loader;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompanySearchConfig {
    pub database: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub tier: TierConfig,
    #[serde(default)]
    pub ogd: OgdConfig,
}

/// data.gov.in resource used by `load` when no file is given.
/// The API key is read from `--api-key` or `OGD_API_KEY`, never from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OgdConfig {
    pub api_base: String,
    pub resource_id: String,
    pub max_records: usize,
    pub pause_ms: u64,
}

impl Default for OgdConfig {
    fn default() -> Self {
        Self {
            api_base: loader::DEFAULT_OGD_API_BASE.to_string(),
            resource_id: loader::DEFAULT_RESOURCE_ID.to_string(),
            max_records: loader::DEFAULT_MAX_RECORDS,
            pause_ms: loader::DEFAULT_PAUSE.as_millis() as u64,
        }
    }
}

/// Capacity metadata reported by the stats route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    pub name: String,
    pub storage_limit: String,
    pub reads_per_day: u64,
    pub writes_per_day: u64,
    pub max_companies: u64,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            name: "free".to_string(),
            storage_limit: "5 GB".to_string(),
            reads_per_day: 5_000_000,
            writes_per_day: 100_000,
            max_companies: 2_000_000,
        }
    }
}

impl CompanySearchConfig {
    /// Database path: explicit flag, then config file, then the default
    pub fn database_path(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.database.as_ref().map(PathBuf::from))
            .unwrap_or_else(default_database_path)
    }

    pub fn bind_addr(&self, host: Option<String>, port: Option<u16>) -> anyhow::Result<SocketAddr> {
        let host = host
            .or_else(|| self.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = port.or(self.port).unwrap_or(DEFAULT_PORT);
        let addr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address {}:{}: {}", host, port, e))?;
        Ok(addr)
    }

    pub fn batch_size(&self, flag: Option<usize>) -> usize {
        flag.or(self.batch_size)
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_BATCH_SIZE)
    }

    /// Paging limits for a remote sync
    pub fn sync_options(&self, batch_size: Option<usize>, max_records: Option<usize>) -> loader::SyncOptions {
        loader::SyncOptions {
            batch_size: self.batch_size(batch_size),
            max_records: max_records.unwrap_or(self.ogd.max_records),
            pause: std::time::Duration::from_millis(self.ogd.pause_ms),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("companysearch.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("companysearch.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<CompanySearchConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: CompanySearchConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &CompanySearchConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file() {
        let config = CompanySearchConfig {
            database: Some("from-file.db".into()),
            port: Some(9000),
            ..Default::default()
        };
        assert_eq!(config.database_path(None), PathBuf::from("from-file.db"));
        assert_eq!(config.database_path(Some("flag.db".into())), PathBuf::from("flag.db"));

        let addr = config.bind_addr(None, None).unwrap();
        assert_eq!(addr.port(), 9000);
        let addr = config.bind_addr(Some("0.0.0.0".into()), Some(1234)).unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:1234");

        assert_eq!(config.batch_size(Some(0)), DEFAULT_BATCH_SIZE);
        assert_eq!(config.batch_size(Some(50)), 50);
    }

    #[test]
    fn test_partial_tier_table_keeps_defaults() {
        let config: CompanySearchConfig = toml::from_str(
            r#"
            database = "data/companies.db"

            [tier]
            name = "paid"
            "#,
        )
        .unwrap();
        assert_eq!(config.tier.name, "paid");
        assert_eq!(config.tier.reads_per_day, TierConfig::default().reads_per_day);
        assert_eq!(config.ogd, OgdConfig::default());
    }

    #[test]
    fn test_sync_options_layering() {
        let config: CompanySearchConfig = toml::from_str(
            r#"
            batch_size = 250

            [ogd]
            max_records = 1000
            pause_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.ogd.api_base, loader::DEFAULT_OGD_API_BASE);

        let options = config.sync_options(None, None);
        assert_eq!(options.batch_size, 250);
        assert_eq!(options.max_records, 1000);
        assert!(options.pause.is_zero());

        assert_eq!(config.sync_options(Some(10), Some(20)).max_records, 20);
    }

    #[test]
    fn test_write_config_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("companysearch.toml");
        let config = CompanySearchConfig::default();

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.tier, TierConfig::default());
        assert!(load_config(Some(&dir.path().join("missing.toml"))).unwrap().is_none());
    }
}
