//! Media element model
//!
//! The engine processes audio for exactly one bound media element at a
//! time. This type models the element-side state the engine and the effect
//! hooks care about: playback rate, pitch preservation, paused state, and
//! the track source. The element is typically reused across tracks; only
//! its `src` changes, which is why the engine initializes once per session
//! rather than once per track.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Shared handle to a media element
///
/// The coordination registry and the engine both hold handles; the host UI
/// owns the element itself.
pub type SharedMediaElement = Arc<Mutex<MediaElement>>;

/// State of one playback element
#[derive(Debug)]
pub struct MediaElement {
    id: u64,
    src: Option<String>,
    paused: bool,
    playback_rate: f64,
    preserves_pitch: bool,
    duration: Option<f64>,
}

impl MediaElement {
    /// Create a new element with no source, paused, at normal rate
    pub fn new() -> Self {
        Self {
            id: NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed),
            src: None,
            paused: true,
            playback_rate: 1.0,
            preserves_pitch: true,
            duration: None,
        }
    }

    /// Create a new element wrapped in a shared handle
    pub fn shared() -> SharedMediaElement {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Stable identity of this element instance
    ///
    /// The engine keys its source-node guard on this: one source node per
    /// element, ever.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn play(&mut self) {
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    /// Set the playback rate, clamped to the range real elements accept
    pub fn set_playback_rate(&mut self, rate: f64) {
        self.playback_rate = rate.clamp(0.0625, 16.0);
    }

    /// Whether pitch is corrected when the rate deviates from 1.0
    ///
    /// The host's resampler honors this; the slowed+reverb effect turns
    /// it off so the rate drop also drops pitch.
    pub fn preserves_pitch(&self) -> bool {
        self.preserves_pitch
    }

    pub fn set_preserves_pitch(&mut self, preserve: bool) {
        self.preserves_pitch = preserve;
    }

    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    /// Swap the track source
    ///
    /// Real elements reset rate-related native properties when the source
    /// changes; mirrored here so the effect hooks have something real to
    /// re-assert on `durationchange`.
    pub fn set_src(&mut self, src: impl Into<String>) {
        self.src = Some(src.into());
        self.duration = None;
        self.playback_rate = 1.0;
        self.preserves_pitch = true;
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Record the duration once the new track's metadata is known
    pub fn set_duration(&mut self, seconds: f64) {
        self.duration = Some(seconds);
    }
}

impl Default for MediaElement {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elements_have_unique_ids() {
        let a = MediaElement::new();
        let b = MediaElement::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_src_change_resets_native_properties() {
        let mut el = MediaElement::new();
        el.set_playback_rate(0.85);
        el.set_preserves_pitch(false);

        el.set_src("track-2.mp3");

        assert_eq!(el.playback_rate(), 1.0);
        assert!(el.preserves_pitch());
        assert_eq!(el.src(), Some("track-2.mp3"));
    }

    #[test]
    fn test_rate_is_clamped() {
        let mut el = MediaElement::new();
        el.set_playback_rate(100.0);
        assert_eq!(el.playback_rate(), 16.0);
        el.set_playback_rate(0.0);
        assert_eq!(el.playback_rate(), 0.0625);
    }
}
