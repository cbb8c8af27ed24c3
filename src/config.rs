//! Game configuration
//!
//! Settings live in `config.toml`, looked up at `$XKARENA_CONFIG` or
//! `<config_dir>/xkarena/config.toml`. Every field has a default, so a missing
//! default file is fine; a file named through the environment must exist.
//!
//! The shooter additionally needs a rounds file:
//!
//! ```toml
//! [[rounds]]
//! enemy_color = [255, 0, 0]
//!
//! [[rounds]]
//! enemy_color = [0, 0, 255]
//! enemy_count = 12
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::device::{StreamSettings, REPORT_LEN, XK12_JOYSTICK_PRODUCT_ID, XKEYS_VENDOR_ID};
use crate::sim::{Arena, AxisLayout, Round, Variant, WorldSettings};

pub const CONFIG_ENV_VAR: &str = "XKARENA_CONFIG";
const CONFIG_DIR: &str = "xkarena";
const CONFIG_FILE: &str = "config.toml";
const ROUNDS_FILE: &str = "rounds.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file {0} does not exist")]
    Missing(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Rounds file {0} defines no rounds")]
    NoRounds(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    pub read_timeout_ms: i32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vendor_id: XKEYS_VENDOR_ID,
            product_id: XK12_JOYSTICK_PRODUCT_ID,
            read_timeout_ms: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub variant: Variant,
    pub tick_rate_hz: f64,
    /// Fixed RNG seed; entropy when absent
    pub seed: Option<u64>,
    pub device: DeviceConfig,
    pub arena: Arena,
    /// Overrides the variant's default axis layout
    pub axes: Option<AxisLayout>,
    pub world: WorldSettings,
    /// Relative paths resolve against the config file's directory
    pub rounds_file: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            tick_rate_hz: 60.0,
            seed: None,
            device: DeviceConfig::default(),
            arena: Arena::default(),
            axes: None,
            world: WorldSettings::default(),
            rounds_file: None,
        }
    }
}

impl GameConfig {
    pub fn axis_layout(&self) -> AxisLayout {
        self.axes.unwrap_or_else(|| self.variant.default_layout())
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            read_timeout_ms: self.device.read_timeout_ms,
            report_len: REPORT_LEN,
        }
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => {
                info!("Using fixed RNG seed {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_rate_hz.is_finite() || self.tick_rate_hz <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tick_rate_hz must be positive, got {}",
                self.tick_rate_hz
            )));
        }
        require_positive("arena.width", self.arena.width)?;
        require_positive("arena.height", self.arena.height)?;
        if self.device.read_timeout_ms < 0 {
            return Err(ConfigError::Invalid(
                "device.read_timeout_ms must not be negative".to_string(),
            ));
        }

        let world = &self.world;
        for (name, value) in [
            ("world.player_start_size", world.player_start_size),
            ("world.food_size", world.food_size),
            ("world.enemy_min_size", world.enemy_min_size),
            ("world.enemy_max_size", world.enemy_max_size),
            ("world.bullet_size", world.bullet_size),
            ("world.asteroid_size", world.asteroid_size),
            ("world.zoom_target", world.zoom_target),
        ] {
            require_positive(name, value)?;
        }
        for (name, value) in [
            ("world.player_speed", world.player_speed),
            ("world.acceleration", world.acceleration),
            ("world.deadzone", world.deadzone),
            ("world.growth_per_value", world.growth_per_value),
            ("world.player_spawn_margin", world.player_spawn_margin),
            ("world.food_speed", world.food_speed),
            ("world.enemy_step", world.enemy_step),
            ("world.converted_speed", world.converted_speed),
            ("world.bullet_speed", world.bullet_speed),
        ] {
            require_non_negative(name, value)?;
        }
        if !(0.0..=1.0).contains(&world.deceleration) {
            return Err(ConfigError::Invalid(format!(
                "world.deceleration must be within [0, 1], got {}",
                world.deceleration
            )));
        }

        if world.enemy_min_size > world.enemy_max_size {
            return Err(ConfigError::Invalid(format!(
                "enemy_min_size {} exceeds enemy_max_size {}",
                world.enemy_min_size, world.enemy_max_size
            )));
        }
        if world.asteroid_min_speed > world.asteroid_max_speed {
            return Err(ConfigError::Invalid(format!(
                "asteroid_min_speed {} exceeds asteroid_max_speed {}",
                world.asteroid_min_speed, world.asteroid_max_speed
            )));
        }
        Ok(())
    }
}

/// Finite and greater than zero; NaN fails both.
fn require_positive(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be a positive number, got {}",
            name, value
        )))
    }
}

fn require_non_negative(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be a finite number of at least 0, got {}",
            name, value
        )))
    }
}

/// A parsed config plus the file it came from, if any
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: GameConfig,
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// `rounds_file` if set, otherwise `rounds.toml` next to the config file
    pub fn rounds_path(&self) -> PathBuf {
        let base = self
            .path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        match &self.config.rounds_file {
            Some(file) if file.is_absolute() => file.clone(),
            Some(file) => base.join(file),
            None => base.join(ROUNDS_FILE),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Loads from `$XKARENA_CONFIG` or the default location.
pub async fn load_config() -> Result<LoadedConfig, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        info!("Loading config from {} ({})", path.display(), CONFIG_ENV_VAR);
        return load_config_from(&path, true).await;
    }

    match default_config_path() {
        Some(path) => load_config_from(&path, false).await,
        None => {
            warn!("Could not determine config directory, using defaults");
            Ok(LoadedConfig {
                config: GameConfig::default(),
                path: None,
            })
        }
    }
}

/// Loads `path`. When it does not exist, `required` decides between an error
/// and the defaults.
pub async fn load_config_from(path: &Path, required: bool) -> Result<LoadedConfig, ConfigError> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

    if !exists {
        if required {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        warn!("Config file {} does not exist, using defaults", path.display());
        return Ok(LoadedConfig {
            config: GameConfig::default(),
            path: Some(path.to_path_buf()),
        });
    }

    let content = read_file(path).await?;
    let config: GameConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;

    debug!("Loaded config: {:?}", config);
    info!("Config loaded from {}", path.display());
    Ok(LoadedConfig {
        config,
        path: Some(path.to_path_buf()),
    })
}

#[derive(Debug, Deserialize)]
struct RoundsFile {
    #[serde(default)]
    rounds: Vec<Round>,
}

/// Reads the rounds file. An empty list is an error.
pub async fn load_rounds(path: &Path) -> Result<Vec<Round>, ConfigError> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
    if !exists {
        return Err(ConfigError::Missing(path.to_path_buf()));
    }

    let content = read_file(path).await?;
    let file: RoundsFile = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    if file.rounds.is_empty() {
        return Err(ConfigError::NoRounds(path.to_path_buf()));
    }

    info!("Loaded {} rounds from {}", file.rounds.len(), path.display());
    Ok(file.rounds)
}

async fn read_file(path: &Path) -> Result<String, ConfigError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })
}
