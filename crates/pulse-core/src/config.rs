//! Engine configuration
//!
//! Tuning constants for the effect chain (ramp durations, filter targets,
//! reverb character) plus generic YAML load/save helpers. Every field has a
//! sensible default so the engine works without any config file present.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::SAMPLE_RATE;

/// Ramp timing for effect toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RampConfig {
    /// Duration of the enable/disable ramp for gain-style effects (seconds)
    pub toggle_seconds: f64,
    /// Duration of the pan return-to-center ramp when 8D is disabled (seconds)
    pub pan_release_seconds: f64,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            toggle_seconds: 0.4,
            pan_release_seconds: 0.25,
        }
    }
}

/// Retro / AM-radio filter tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetroConfig {
    /// Filter cutoff when the effect is engaged (Hz)
    pub cutoff_hz: f32,
    /// Filter Q when the effect is engaged
    pub q: f32,
    /// Pass-through cutoff when the effect is off (Hz)
    pub neutral_cutoff_hz: f32,
    /// Pass-through Q when the effect is off
    pub neutral_q: f32,
}

impl Default for RetroConfig {
    fn default() -> Self {
        Self {
            cutoff_hz: 1200.0,
            q: 0.5,
            neutral_cutoff_hz: 18000.0,
            neutral_q: 0.707,
        }
    }
}

/// Convolution reverb character
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbConfig {
    /// Impulse response length (seconds)
    pub impulse_seconds: f64,
    /// Impulse decay exponent (higher = faster decay)
    pub impulse_decay: f64,
    /// Wet-path gain when slowed+reverb is engaged
    pub wet_level: f32,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            impulse_seconds: 2.5,
            impulse_decay: 2.0,
            wet_level: 0.4,
        }
    }
}

/// Spatial widener tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Side-channel gain when widening is engaged (1.0 = unchanged image)
    pub side_gain: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self { side_gain: 1.9 }
    }
}

/// Lo-fi wave shaper tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoFiConfig {
    /// Number of points in the precomputed transfer curve
    pub curve_resolution: usize,
    /// Quantization steps for the bitcrush curve
    pub quantize_steps: u32,
    /// Shaper wet mix when engaged
    pub mix: f32,
}

impl Default for LoFiConfig {
    fn default() -> Self {
        Self {
            curve_resolution: 1024,
            quantize_steps: 24,
            mix: 0.8,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Graph sample rate (Hz)
    pub sample_rate: u32,
    /// Default 8D rotation period when the caller does not supply one (seconds)
    pub default_rotation_period: f64,
    pub ramp: RampConfig,
    pub retro: RetroConfig,
    pub reverb: ReverbConfig,
    pub spatial: SpatialConfig,
    pub lo_fi: LoFiConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            default_rotation_period: 5.0,
            ramp: RampConfig::default(),
            retro: RetroConfig::default(),
            reverb: ReverbConfig::default(),
            spatial: SpatialConfig::default(),
            lo_fi: LoFiConfig::default(),
        }
    }
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns default config.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("load_config: {:?} doesn't exist, using defaults", path);
        return T::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<T>(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("load_config: failed to parse {:?}: {}, using defaults", path, e);
                T::default()
            }
        },
        Err(e) => {
            log::warn!("load_config: failed to read {:?}: {}, using defaults", path, e);
            T::default()
        }
    }
}

/// Save configuration to a YAML file
///
/// Creates parent directories if they don't exist.
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, SAMPLE_RATE);
        assert!(config.reverb.wet_level > 0.0 && config.reverb.wet_level < 1.0);
        assert!(config.retro.cutoff_hz < config.retro.neutral_cutoff_hz);
        assert!(config.ramp.toggle_seconds > 0.0);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config: EngineConfig = load_config(Path::new("/nonexistent/path/pulse.yaml"));
        assert_eq!(config.sample_rate, EngineConfig::default().sample_rate);
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");

        let mut config = EngineConfig::default();
        config.reverb.wet_level = 0.25;
        config.default_rotation_period = 8.0;

        save_config(&config, &path).unwrap();
        let loaded: EngineConfig = load_config(&path);

        assert_eq!(loaded.reverb.wet_level, 0.25);
        assert_eq!(loaded.default_rotation_period, 8.0);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.yaml");
        std::fs::write(&path, "sample_rate: 44100\n").unwrap();

        let loaded: EngineConfig = load_config(&path);
        assert_eq!(loaded.sample_rate, 44100);
        assert_eq!(loaded.retro.q, RetroConfig::default().q);
    }
}
