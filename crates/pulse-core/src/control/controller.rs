//! Effect application hooks
//!
//! Bridges toggle state to the engine and the media element. Element-side
//! properties (playback rate, pitch preservation) reset whenever the
//! element's source changes, so the duration-change hook re-asserts both
//! the native properties and the graph parameters.

use crate::engine::{AudioEngine, SharedMediaElement};

use super::settings::EffectSettings;

/// Playback rate while slowed + reverb is active
pub const SLOWED_PLAYBACK_RATE: f64 = 0.85;

/// Applies effect snapshots and re-applies them across track changes
pub struct EffectController {
    settings: EffectSettings,
    slowed_active: bool,
    /// Rate to restore when slowed + reverb turns off, captured once at
    /// the disabled-to-enabled edge
    rate_before_slowdown: Option<f64>,
}

impl Default for EffectController {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectController {
    pub fn new() -> Self {
        Self {
            settings: EffectSettings::default(),
            slowed_active: false,
            rate_before_slowdown: None,
        }
    }

    /// Last applied snapshot
    pub fn settings(&self) -> &EffectSettings {
        &self.settings
    }

    /// Apply a full effect snapshot
    ///
    /// Each effect writes only its own nodes, so enabling several at once
    /// composes without one overwriting another. Re-applying an unchanged
    /// snapshot is harmless: ramps retarget the value they already hold.
    pub fn apply(
        &mut self,
        engine: &mut AudioEngine,
        element: &SharedMediaElement,
        settings: EffectSettings,
    ) {
        engine.set_spatial_mode(settings.spatial);
        engine.set_8d_audio_mode(
            settings.eight_d.enabled,
            Some(settings.eight_d.speed.period_seconds()),
        );
        engine.set_retro_mode(settings.retro);
        engine.set_lo_fi_mode(settings.lo_fi);
        self.apply_slowed_reverb(engine, element, settings.slowed_reverb);
        self.settings = settings;
    }

    fn apply_slowed_reverb(
        &mut self,
        engine: &mut AudioEngine,
        element: &SharedMediaElement,
        enabled: bool,
    ) {
        if enabled {
            if !self.slowed_active {
                // Capture the restore rate at the enable edge. A rate that
                // already sits at the slowed value is a stale leftover from
                // an interrupted session, not a listener preference.
                let prior = element
                    .lock()
                    .map(|el| el.playback_rate())
                    .unwrap_or(1.0);
                self.rate_before_slowdown =
                    Some(if (prior - SLOWED_PLAYBACK_RATE).abs() < 1e-9 {
                        1.0
                    } else {
                        prior
                    });
                self.slowed_active = true;
            }
            if let Ok(mut el) = element.lock() {
                el.set_playback_rate(SLOWED_PLAYBACK_RATE);
                el.set_preserves_pitch(false);
            }
            engine.set_slowed_reverb_mode(true);
        } else if self.slowed_active {
            engine.set_slowed_reverb_mode(false);
            let restore = self.rate_before_slowdown.take().unwrap_or(1.0);
            if let Ok(mut el) = element.lock() {
                el.set_preserves_pitch(true);
                el.set_playback_rate(restore);
            }
            self.slowed_active = false;
        } else {
            engine.set_slowed_reverb_mode(false);
        }
    }

    /// Playback-start hook
    ///
    /// Initializes the engine against the element (idempotent), resumes a
    /// suspended context and pushes the current snapshot.
    pub fn on_play(&mut self, engine: &mut AudioEngine, element: &SharedMediaElement) {
        engine.initialize(element);
        engine.resume();
        let settings = self.settings;
        self.apply(engine, element, settings);
    }

    /// Track-change hook
    ///
    /// Loading a new source resets the element's rate and pitch flags, so
    /// the current snapshot must be pushed again. The slowed-rate memory is
    /// untouched: no enable edge was crossed.
    pub fn on_duration_change(&mut self, engine: &mut AudioEngine, element: &SharedMediaElement) {
        log::debug!("duration change, re-applying effect snapshot");
        let settings = self.settings;
        self.apply(engine, element, settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::control::settings::{EightDSettings, RotationSpeed};
    use crate::engine::MediaElement;

    fn test_parts() -> (AudioEngine, SharedMediaElement) {
        let config = EngineConfig {
            sample_rate: 8000,
            ..Default::default()
        };
        let mut engine = AudioEngine::new(config);
        let element = MediaElement::shared();
        engine.initialize(&element);
        engine.resume();
        (engine, element)
    }

    #[test]
    fn test_slowed_reverb_restores_prior_rate() {
        let (mut engine, element) = test_parts();
        let mut controller = EffectController::new();
        element.lock().unwrap().set_playback_rate(1.25);

        controller.apply(
            &mut engine,
            &element,
            EffectSettings {
                slowed_reverb: true,
                ..Default::default()
            },
        );
        {
            let el = element.lock().unwrap();
            assert!((el.playback_rate() - SLOWED_PLAYBACK_RATE).abs() < 1e-9);
            assert!(!el.preserves_pitch());
        }

        controller.apply(&mut engine, &element, EffectSettings::default());
        let el = element.lock().unwrap();
        assert!((el.playback_rate() - 1.25).abs() < 1e-9);
        assert!(el.preserves_pitch());
    }

    #[test]
    fn test_stale_slowed_rate_restores_to_unity() {
        let (mut engine, element) = test_parts();
        let mut controller = EffectController::new();
        element
            .lock()
            .unwrap()
            .set_playback_rate(SLOWED_PLAYBACK_RATE);

        controller.apply(
            &mut engine,
            &element,
            EffectSettings {
                slowed_reverb: true,
                ..Default::default()
            },
        );
        controller.apply(&mut engine, &element, EffectSettings::default());
        assert!((element.lock().unwrap().playback_rate() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_change_reasserts_slowed_state() {
        let (mut engine, element) = test_parts();
        let mut controller = EffectController::new();
        controller.apply(
            &mut engine,
            &element,
            EffectSettings {
                slowed_reverb: true,
                ..Default::default()
            },
        );

        // Loading a new track resets the element's native properties.
        element.lock().unwrap().set_src("next.mp3");
        {
            let el = element.lock().unwrap();
            assert!((el.playback_rate() - 1.0).abs() < 1e-9);
            assert!(el.preserves_pitch());
        }

        controller.on_duration_change(&mut engine, &element);
        let el = element.lock().unwrap();
        assert!((el.playback_rate() - SLOWED_PLAYBACK_RATE).abs() < 1e-9);
        assert!(!el.preserves_pitch());
    }

    #[test]
    fn test_rate_memory_survives_reapply() {
        let (mut engine, element) = test_parts();
        let mut controller = EffectController::new();
        element.lock().unwrap().set_playback_rate(1.5);

        let slowed = EffectSettings {
            slowed_reverb: true,
            ..Default::default()
        };
        controller.apply(&mut engine, &element, slowed);
        // Re-applying while already slowed must not overwrite the memory
        // with the slowed rate itself.
        controller.apply(&mut engine, &element, slowed);
        controller.apply(&mut engine, &element, EffectSettings::default());
        assert!((element.lock().unwrap().playback_rate() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_apply_pushes_rotation_speed() {
        let (mut engine, element) = test_parts();
        let mut controller = EffectController::new();
        controller.apply(
            &mut engine,
            &element,
            EffectSettings {
                eight_d: EightDSettings {
                    enabled: true,
                    speed: RotationSpeed::Fast,
                },
                ..Default::default()
            },
        );
        let chain = engine.chain().unwrap();
        let expected = 1.0 / RotationSpeed::Fast.period_seconds();
        assert!((chain.rotation_lfo.frequency() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_on_play_initializes_and_applies() {
        let config = EngineConfig {
            sample_rate: 8000,
            ..Default::default()
        };
        let mut engine = AudioEngine::new(config);
        let element = MediaElement::shared();
        let mut controller = EffectController::new();
        controller.apply(
            &mut engine,
            &element,
            EffectSettings {
                spatial: true,
                ..Default::default()
            },
        );

        assert!(!engine.is_initialized());
        controller.on_play(&mut engine, &element);
        assert!(engine.is_initialized());
    }
}
