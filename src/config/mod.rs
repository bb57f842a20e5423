use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod defaults;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub genius: GeniusConfig,
    pub http: HttpConfig,
    pub scrape: ScrapeConfig,
    pub cache: CacheConfig,
    /// Seed table of well-known artists: normalized name -> provider artist id.
    pub artists: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeniusConfig {
    pub api_base: String,
    /// Falls back to `GENIUS_ACCESS_TOKEN` / `--token` when unset.
    pub access_token: Option<String>,
    pub catalog_page_size: u32,
    pub catalog_max_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Upper bound for a whole lookup, across every request it makes.
    pub deadline_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Fixed,
    Linear,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Optional fetch proxy, e.g. `http://proxy.example/?api_key={key}&url={url}`.
    pub proxy_template: Option<String>,
    /// Falls back to `SCRAPER_API_KEY` when unset.
    pub proxy_key: Option<String>,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub backoff: BackoffKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Entry limit for the in-memory cache.
    pub capacity: usize,
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        defaults::defaults()
    }
}

impl Default for GeniusConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.genius.com".to_string(),
            access_token: None,
            catalog_page_size: 50,
            catalog_max_pages: 3,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 8,
            user_agent: concat!("verse/", env!("CARGO_PKG_VERSION")).to_string(),
            deadline_secs: 25,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            proxy_template: None,
            proxy_key: None,
            max_attempts: 3,
            backoff_ms: 1000,
            backoff: BackoffKind::Linear,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from("dev", "verse", "verse");
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("verse"));
        Self {
            backend: CacheBackend::Memory,
            capacity: 1024,
            path: data_dir.join("cache.sqlite3"),
        }
    }
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    write_config(cfg, &path)
}

fn write_config(cfg: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    // The file may hold an access token.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "verse", "verse").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = defaults::defaults();
        write_config(&cfg, &path).context("write default config")?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = load(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.genius.catalog_page_size, 50);
        assert_eq!(cfg.artists.get("yeat"), Some(&2193783));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[scrape]
backoff = "fixed"
max_attempts = 2

[artists]
"metro boomin" = 1128
"#,
        )
        .unwrap();

        let cfg = load(Some(&path)).unwrap();
        assert_eq!(cfg.scrape.backoff, BackoffKind::Fixed);
        assert_eq!(cfg.scrape.max_attempts, 2);
        assert_eq!(cfg.scrape.backoff_ms, 1000);
        assert_eq!(cfg.http.timeout_secs, 8);
        assert_eq!(cfg.artists.len(), 1);
        assert_eq!(cfg.artists.get("metro boomin"), Some(&1128));
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.cache.backend = CacheBackend::Sqlite;
        cfg.genius.catalog_max_pages = 5;

        save(&cfg, Some(&path)).unwrap();
        let loaded = load(Some(&path)).unwrap();
        assert_eq!(loaded.cache.backend, CacheBackend::Sqlite);
        assert_eq!(loaded.genius.catalog_max_pages, 5);
    }
}
