//! Graph context - sample clock and lifecycle state
//!
//! The context owns the clock that all parameter ramps are scheduled
//! against. Time is derived from processed frames, never from wall-clock
//! time, so ramps stay aligned with the rendered signal.

/// Lifecycle state of a graph context
///
/// A context is created suspended (autoplay policy: nothing renders until
/// a user gesture resumes it) and closing it is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextState {
    #[default]
    Suspended,
    Running,
    Closed,
}

/// Processing-graph host: sample rate plus a monotonic sample clock
#[derive(Debug)]
pub struct GraphContext {
    sample_rate: u32,
    state: ContextState,
    /// Frames rendered so far
    frames: u64,
}

impl GraphContext {
    /// Create a new suspended context at the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            state: ContextState::Suspended,
            frames: 0,
        }
    }

    /// The context sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Current time in seconds (frames rendered / sample rate)
    #[inline]
    pub fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    /// Duration of one frame in seconds
    #[inline]
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.sample_rate as f64
    }

    /// Resume a suspended context
    ///
    /// No-op when already running. A closed context stays closed; the call
    /// is skipped silently so a stale resume from an event handler can
    /// never break playback.
    pub fn resume(&mut self) {
        match self.state {
            ContextState::Suspended => self.state = ContextState::Running,
            ContextState::Running => {}
            ContextState::Closed => {
                log::debug!("resume: context already closed, ignoring");
            }
        }
    }

    /// Suspend a running context
    pub fn suspend(&mut self) {
        if self.state == ContextState::Running {
            self.state = ContextState::Suspended;
        }
    }

    /// Close the context permanently
    pub fn close(&mut self) {
        self.state = ContextState::Closed;
    }

    /// Whether parameter scheduling is still allowed
    #[inline]
    pub fn accepts_scheduling(&self) -> bool {
        self.state != ContextState::Closed
    }

    /// Advance the sample clock by `frames` rendered frames
    pub fn advance(&mut self, frames: usize) {
        self.frames += frames as u64;
    }
}
