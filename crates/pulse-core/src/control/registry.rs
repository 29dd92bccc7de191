//! Playback coordination between player surfaces
//!
//! Two surfaces can produce sound: the main player and the wave
//! (visualizer) player. Only one may be audible at a time. The registry
//! holds handles the main player donates at mount time; the wave surface
//! silences the main one through them before it starts. The main surface
//! observes [`PlayerRegistry::active_player`] to yield the other way.

use crate::engine::SharedMediaElement;
use crate::types::PlayerSurface;

type PauseHook = Box<dyn FnMut() + Send>;

/// Cross-surface playback coordinator
#[derive(Default)]
pub struct PlayerRegistry {
    active: Option<PlayerSurface>,
    main_element: Option<SharedMediaElement>,
    main_pause_hook: Option<PauseHook>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface that currently owns audio output, if any
    pub fn active_player(&self) -> Option<PlayerSurface> {
        self.active
    }

    pub fn set_active_player(&mut self, surface: Option<PlayerSurface>) {
        if self.active != surface {
            log::debug!(
                "active player: {}",
                surface.map_or("none", |s| s.name())
            );
        }
        self.active = surface;
    }

    /// Main player donates its element handle at mount time
    pub fn register_main_element(&mut self, element: SharedMediaElement) {
        self.main_element = Some(element);
    }

    /// Main player donates a callback that pauses it and updates its UI
    pub fn register_main_pause_hook<F>(&mut self, hook: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.main_pause_hook = Some(Box::new(hook));
    }

    /// Drop donated handles when the main player unmounts
    pub fn clear_main_registrations(&mut self) {
        self.main_element = None;
        self.main_pause_hook = None;
    }

    /// Silence the main player through whatever handles are registered
    ///
    /// The hook and the element pause independently; a page without a
    /// mounted main player has neither and this is a no-op.
    pub fn stop_main_player(&mut self) {
        if let Some(hook) = &mut self.main_pause_hook {
            hook();
        }
        if let Some(element) = &self.main_element {
            if let Ok(mut el) = element.lock() {
                el.pause();
            }
        }
    }

    /// Claim audio output for a surface, silencing the other
    pub fn begin_playback(&mut self, surface: PlayerSurface) {
        if surface == PlayerSurface::Wave {
            self.stop_main_player();
        }
        self.set_active_player(Some(surface));
    }
}
