//! Effect-toggle state
//!
//! The UI stores keep per-effect toggles; the control layer consumes them
//! as one cohesive snapshot so "apply all enabled effects" is a pure
//! function of state with no ordering ambiguity between toggles that
//! change together.

use serde::{Deserialize, Serialize};

/// 8D rotation speed presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationSpeed {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl RotationSpeed {
    /// One full left-to-right rotation period in seconds
    pub fn period_seconds(&self) -> f64 {
        match self {
            RotationSpeed::Slow => 10.0,
            RotationSpeed::Medium => 5.0,
            RotationSpeed::Fast => 2.5,
        }
    }
}

/// 8D rotation toggle plus its speed parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EightDSettings {
    pub enabled: bool,
    pub speed: RotationSpeed,
}

/// One snapshot of every effect toggle
///
/// Multiple effects may be enabled at once; application pushes each
/// effect's contribution to its own nodes, so none overwrites another.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    /// Stereo widening
    pub spatial: bool,
    pub eight_d: EightDSettings,
    /// Slowed + reverb (0.85x rate, pitch uncorrected, wet reverb)
    pub slowed_reverb: bool,
    /// Narrow-band AM-radio tone
    pub retro: bool,
    /// Bitcrush shaper
    pub lo_fi: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_periods_are_ordered() {
        assert!(RotationSpeed::Slow.period_seconds() > RotationSpeed::Medium.period_seconds());
        assert!(RotationSpeed::Medium.period_seconds() > RotationSpeed::Fast.period_seconds());
    }

    #[test]
    fn test_default_snapshot_is_all_off() {
        let settings = EffectSettings::default();
        assert!(!settings.spatial);
        assert!(!settings.eight_d.enabled);
        assert!(!settings.slowed_reverb);
        assert!(!settings.retro);
        assert!(!settings.lo_fi);
    }

    #[test]
    fn test_snapshot_yaml_roundtrip() {
        let settings = EffectSettings {
            spatial: true,
            eight_d: EightDSettings {
                enabled: true,
                speed: RotationSpeed::Fast,
            },
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&settings).unwrap();
        let back: EffectSettings = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, settings);
    }
}
