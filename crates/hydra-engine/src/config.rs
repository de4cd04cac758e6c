use std::time::Duration;

use hydra_cache::{LocalCacheConfig, RedisConfig};
use hydra_core::Variant;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HydraConfig {
    /// Process-local cache (L1)
    #[serde(default)]
    pub local_cache: LocalCacheConfig,
    /// Redis distributed cache (L2)
    #[serde(default)]
    pub redis: RedisConfig,
    /// TTLs and hydration behaviour
    #[serde(default)]
    pub hydration: HydrationSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HydraConfig {
    pub fn validate(&self) -> Result<(), String> {
        let local = &self.local_cache;
        if local.enabled && local.max_cost == 0 {
            return Err("local_cache.max_cost must be > 0".into());
        }
        if local.enabled && local.max_tracked_keys == 0 {
            return Err("local_cache.max_tracked_keys must be > 0".into());
        }

        if self.redis.enabled {
            if self.redis.url.is_empty() {
                return Err("redis.enabled=true requires redis.url".into());
            }
            if self.redis.pool_size == 0 {
                return Err("redis.pool_size must be > 0".into());
            }
        }

        let h = &self.hydration;
        for (name, secs) in [
            ("account_local_ttl_secs", h.account_local_ttl_secs),
            ("account_distributed_ttl_secs", h.account_distributed_ttl_secs),
            ("image_local_ttl_secs", h.image_local_ttl_secs),
            ("image_distributed_ttl_secs", h.image_distributed_ttl_secs),
        ] {
            if secs == 0 {
                return Err(format!("hydration.{name} must be > 0"));
            }
        }
        if h.account_local_ttl_secs > h.account_distributed_ttl_secs {
            return Err(
                "hydration.account_local_ttl_secs must be <= account_distributed_ttl_secs".into(),
            );
        }
        if h.image_local_ttl_secs > h.image_distributed_ttl_secs {
            return Err(
                "hydration.image_local_ttl_secs must be <= image_distributed_ttl_secs".into(),
            );
        }
        if h.repair_timeout_ms == 0 {
            return Err("hydration.repair_timeout_ms must be > 0".into());
        }
        if h.expiry_sweep_interval_ms == 0 {
            return Err("hydration.expiry_sweep_interval_ms must be > 0".into());
        }

        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }
}

/// Local and distributed TTL pair for one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierTtls {
    pub local: Duration,
    pub distributed: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrationSettings {
    #[serde(default = "default_account_local_ttl_secs")]
    pub account_local_ttl_secs: u64,
    #[serde(default = "default_account_distributed_ttl_secs")]
    pub account_distributed_ttl_secs: u64,
    #[serde(default = "default_image_local_ttl_secs")]
    pub image_local_ttl_secs: u64,
    #[serde(default = "default_image_distributed_ttl_secs")]
    pub image_distributed_ttl_secs: u64,
    /// Rendition used for images embedded in accounts
    #[serde(default)]
    pub account_image_variant: Variant,
    /// Upper bound for one stale-reference repair call
    #[serde(default = "default_repair_timeout_ms")]
    pub repair_timeout_ms: u64,
    /// Period of the sweep that drops expired in-process distributed entries
    #[serde(default = "default_expiry_sweep_interval_ms")]
    pub expiry_sweep_interval_ms: u64,
}

fn default_account_local_ttl_secs() -> u64 {
    10
}

fn default_account_distributed_ttl_secs() -> u64 {
    600 // 10 minutes
}

fn default_image_local_ttl_secs() -> u64 {
    10
}

fn default_image_distributed_ttl_secs() -> u64 {
    1800 // 30 minutes
}

fn default_repair_timeout_ms() -> u64 {
    10_000
}

fn default_expiry_sweep_interval_ms() -> u64 {
    60_000
}

impl Default for HydrationSettings {
    fn default() -> Self {
        Self {
            account_local_ttl_secs: default_account_local_ttl_secs(),
            account_distributed_ttl_secs: default_account_distributed_ttl_secs(),
            image_local_ttl_secs: default_image_local_ttl_secs(),
            image_distributed_ttl_secs: default_image_distributed_ttl_secs(),
            account_image_variant: Variant::default(),
            repair_timeout_ms: default_repair_timeout_ms(),
            expiry_sweep_interval_ms: default_expiry_sweep_interval_ms(),
        }
    }
}

impl HydrationSettings {
    pub fn account_ttls(&self) -> TierTtls {
        TierTtls {
            local: Duration::from_secs(self.account_local_ttl_secs),
            distributed: Duration::from_secs(self.account_distributed_ttl_secs),
        }
    }

    pub fn image_ttls(&self) -> TierTtls {
        TierTtls {
            local: Duration::from_secs(self.image_local_ttl_secs),
            distributed: Duration::from_secs(self.image_distributed_ttl_secs),
        }
    }

    pub fn repair_timeout(&self) -> Duration {
        Duration::from_millis(self.repair_timeout_ms)
    }

    pub fn expiry_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.expiry_sweep_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::HydraConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Load configuration from an optional TOML file plus environment overrides.
    ///
    /// Without a path, `hydra.toml` in the working directory is used when present.
    /// Environment variables override file values, e.g.
    /// `HYDRA__REDIS__ENABLED=true` or `HYDRA__HYDRATION__ACCOUNT_IMAGE_VARIANT=small`.
    pub fn load_config(path: Option<&str>) -> Result<HydraConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or("hydra.toml"));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        builder = builder.add_source(
            Environment::with_prefix("HYDRA")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: HydraConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
