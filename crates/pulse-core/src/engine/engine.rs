//! The audio engine - owns the graph bound to the playing media element
//!
//! One engine instance owns one graph context, one source binding, and the
//! fixed effect chain:
//!
//! ```text
//! source -> biquad filter -> 8D panner -> spatial width -> dry ---+--> shaper -> master -> out
//!                                             \-> convolver -> wet gain -+
//! ```
//!
//! The chain order is fixed at initialization. Effects engage and
//! disengage by ramping node parameters; connections are never re-routed
//! while audio runs, so toggles cannot click. Engines are constructed
//! explicitly and injected into the control layer; tests build isolated
//! instances.

use crate::config::EngineConfig;
use crate::graph::node::{
    bitcrush_curve, BiquadFilterNode, ConvolverNode, GainNode, OscillatorNode, StereoPannerNode,
    WaveShaperNode,
};
use crate::graph::{impulse, AudioParam, ContextState, GraphContext, RampCurve};
use crate::types::StereoBuffer;

use super::error::{EngineError, EngineResult};
use super::media::SharedMediaElement;

/// Shortest accepted 8D rotation period (seconds)
const MIN_ROTATION_PERIOD: f64 = 0.25;

/// Source binding for the currently bound media element
///
/// A source may be created only once per element; the engine guards
/// re-initialization on this record, not on the public flag.
#[derive(Debug)]
struct MediaSourceNode {
    element_id: u64,
}

/// The fixed node chain, built once at initialization
pub struct EffectChain {
    pub pre_filter: BiquadFilterNode,
    pub panner: StereoPannerNode,
    /// LFO driving the 8D rotation
    pub rotation_lfo: OscillatorNode,
    /// 8D modulation depth; ramped 0..1 so the sweep fades in and the pan
    /// returns to center on disable without a discontinuity
    pub rotation_depth: AudioParam,
    /// Side-channel gain of the mid/side width stage (1.0 = untouched image)
    pub side_gain: AudioParam,
    pub convolver: ConvolverNode,
    pub wet_gain: GainNode,
    pub shaper: WaveShaperNode,
    pub master_gain: GainNode,
}

/// The audio engine
pub struct AudioEngine {
    config: EngineConfig,
    context: Option<GraphContext>,
    source: Option<MediaSourceNode>,
    chain: Option<EffectChain>,
    element: Option<SharedMediaElement>,
    initialized: bool,
    eight_d_enabled: bool,
    /// Lifetime count of source bindings created (initialization guard
    /// diagnostics)
    source_nodes_created: u32,
    wet_scratch: StereoBuffer,
}

impl AudioEngine {
    /// Create an engine; the graph itself is built lazily by [`initialize`]
    ///
    /// [`initialize`]: AudioEngine::initialize
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            context: None,
            source: None,
            chain: None,
            element: None,
            initialized: false,
            eight_d_enabled: false,
            source_nodes_created: 0,
            wet_scratch: StereoBuffer::default(),
        }
    }

    /// Whether the graph is up and effects can apply
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current context state, if a context exists
    pub fn context_state(&self) -> Option<ContextState> {
        self.context.as_ref().map(|c| c.state())
    }

    /// Current context time in seconds (0.0 before initialization)
    pub fn current_time(&self) -> f64 {
        self.context.as_ref().map_or(0.0, |c| c.current_time())
    }

    /// Read access to the chain for diagnostics and tests
    pub fn chain(&self) -> Option<&EffectChain> {
        self.chain.as_ref()
    }

    /// Lifetime number of source bindings created
    pub fn source_node_count(&self) -> u32 {
        self.source_nodes_created
    }

    /// Initialize the graph for the given element. Idempotent.
    ///
    /// Safe to call on every `play` event: when the element is already
    /// bound this is a no-op, guarded by the engine's own source record
    /// rather than the public flag (a second source for the same element
    /// would be unrecoverable). Binding a *different* element swaps the
    /// source and clears node state; the chain itself is kept.
    ///
    /// On failure the engine logs and stays uninitialized; every effect
    /// method then no-ops and the element keeps playing unprocessed audio.
    pub fn initialize(&mut self, element: &SharedMediaElement) {
        if let Err(e) = self.try_initialize(element) {
            log::warn!("initialize: {}, effects stay disabled", e);
        }
    }

    /// Fallible initialization; see [`initialize`]
    ///
    /// [`initialize`]: AudioEngine::initialize
    pub fn try_initialize(&mut self, element: &SharedMediaElement) -> EngineResult<()> {
        if let Some(ctx) = &self.context {
            if ctx.state() == ContextState::Closed {
                return Err(EngineError::ContextClosed);
            }
        }

        let element_id = element
            .lock()
            .map_err(|_| EngineError::ElementUnavailable("lock poisoned".into()))?
            .id();

        if let Some(source) = &self.source {
            if source.element_id == element_id {
                // Bound already; this is the common per-play-event path.
                self.initialized = true;
                return Ok(());
            }
            log::info!(
                "initialize: rebinding source from element {} to {}",
                source.element_id,
                element_id
            );
            if let Some(chain) = &mut self.chain {
                chain.pre_filter.reset();
                chain.convolver.reset();
            }
        }

        if self.context.is_none() {
            if self.config.sample_rate == 0 {
                return Err(EngineError::ContextCreation(
                    "runtime has no audio support".into(),
                ));
            }
            self.context = Some(GraphContext::new(self.config.sample_rate));
        }

        if self.chain.is_none() {
            self.chain = Some(self.build_chain());
        }

        self.source = Some(MediaSourceNode { element_id });
        self.source_nodes_created += 1;
        self.element = Some(element.clone());
        self.initialized = true;
        log::info!("audio engine initialized for element {}", element_id);
        Ok(())
    }

    fn build_chain(&self) -> EffectChain {
        let sample_rate = self.config.sample_rate;
        let impulse = impulse::generate(
            sample_rate,
            self.config.reverb.impulse_seconds,
            self.config.reverb.impulse_decay,
        );
        EffectChain {
            pre_filter: BiquadFilterNode::new(
                sample_rate,
                self.config.retro.neutral_cutoff_hz,
                self.config.retro.neutral_q,
            ),
            panner: StereoPannerNode::new(),
            rotation_lfo: OscillatorNode::new(0.0),
            rotation_depth: AudioParam::new("panner.rotation_depth", 0.0, 0.0, 1.0),
            side_gain: AudioParam::new("spatial.side_gain", 1.0, 0.0, 4.0),
            convolver: ConvolverNode::new(&impulse),
            wet_gain: GainNode::new("reverb.wet", 0.0),
            shaper: WaveShaperNode::new(),
            master_gain: GainNode::new("master.gain", 1.0),
        }
    }

    /// Resume the context (user-gesture path)
    pub fn resume(&mut self) {
        if let Some(ctx) = &mut self.context {
            ctx.resume();
        }
    }

    /// Suspend the context
    pub fn suspend(&mut self) {
        if let Some(ctx) = &mut self.context {
            ctx.suspend();
        }
    }

    /// Close the context permanently; all further scheduling is skipped
    pub fn close(&mut self) {
        if let Some(ctx) = &mut self.context {
            ctx.close();
        }
        self.initialized = false;
    }

    /// Guard shared by every effect toggle: initialized, context present,
    /// and context not closed. Returns the context time ramps schedule
    /// against.
    fn schedule_time(&self) -> Option<f64> {
        if !self.initialized {
            log::debug!("effect toggle before initialization, ignoring");
            return None;
        }
        let ctx = self.context.as_ref()?;
        if !ctx.accepts_scheduling() {
            log::debug!("effect toggle on closed context, ignoring");
            return None;
        }
        Some(ctx.current_time())
    }

    /// Toggle the 8D rotation
    ///
    /// When enabling, the LFO is tuned to one full left-to-right sweep per
    /// `rotation_period_seconds` (engine default when `None`) and the
    /// modulation depth ramps in. When disabling, the depth ramps to zero
    /// over a short fixed release, returning the pan to center without a
    /// click. The panner node is reused; the graph is never torn down.
    pub fn set_8d_audio_mode(&mut self, enabled: bool, rotation_period_seconds: Option<f64>) {
        let Some(now) = self.schedule_time() else { return };
        let Some(chain) = self.chain.as_mut() else { return };

        if enabled {
            let period = rotation_period_seconds
                .unwrap_or(self.config.default_rotation_period)
                .max(MIN_ROTATION_PERIOD);
            chain.rotation_lfo.set_frequency(now, 1.0 / period);
            if !self.eight_d_enabled {
                // Fresh sweep starts from center
                chain.rotation_lfo.reset_phase(now);
            }
            chain.rotation_depth.ramp_to(
                now,
                1.0,
                self.config.ramp.toggle_seconds,
                RampCurve::Linear,
            );
            self.eight_d_enabled = true;
        } else {
            chain.rotation_depth.ramp_to(
                now,
                0.0,
                self.config.ramp.pan_release_seconds,
                RampCurve::Linear,
            );
            self.eight_d_enabled = false;
        }
    }

    /// Toggle the retro / AM-radio tone
    ///
    /// Two exponential ramps per toggle (frequency and Q): frequency
    /// perception is logarithmic, so a linear sweep would seem to move
    /// only near its end.
    pub fn set_retro_mode(&mut self, enabled: bool) {
        let Some(now) = self.schedule_time() else { return };
        let Some(chain) = self.chain.as_mut() else { return };

        let (frequency, q) = if enabled {
            (self.config.retro.cutoff_hz, self.config.retro.q)
        } else {
            (
                self.config.retro.neutral_cutoff_hz,
                self.config.retro.neutral_q,
            )
        };
        chain
            .pre_filter
            .ramp_tuning(now, frequency, q, self.config.ramp.toggle_seconds);
    }

    /// Toggle stereo widening
    ///
    /// Rides the mid/side width stage, not the 8D panner, so the two
    /// effects compose: 8D can rotate a widened signal.
    pub fn set_spatial_mode(&mut self, enabled: bool) {
        let Some(now) = self.schedule_time() else { return };
        let Some(chain) = self.chain.as_mut() else { return };

        let target = if enabled {
            self.config.spatial.side_gain
        } else {
            1.0
        };
        chain.side_gain.ramp_to(
            now,
            target,
            self.config.ramp.toggle_seconds,
            RampCurve::Exponential,
        );
    }

    /// Engage or release the reverb wet path
    ///
    /// The convolver stays connected either way; only the wet gain ramps
    /// between silence and the configured level. The 0.85x playback rate
    /// and the pitch flag are element properties owned by the calling
    /// hook, not by the graph.
    pub fn set_slowed_reverb_mode(&mut self, enabled: bool) {
        let Some(now) = self.schedule_time() else { return };
        let Some(chain) = self.chain.as_mut() else { return };

        let target = if enabled {
            self.config.reverb.wet_level
        } else {
            0.0
        };
        chain.wet_gain.gain.ramp_to(
            now,
            target,
            self.config.ramp.toggle_seconds,
            RampCurve::Exponential,
        );
    }

    /// Toggle the lo-fi bitcrush shaper
    pub fn set_lo_fi_mode(&mut self, enabled: bool) {
        let Some(now) = self.schedule_time() else { return };
        let Some(chain) = self.chain.as_mut() else { return };

        if enabled {
            if !chain.shaper.has_curve() {
                chain.shaper.set_curve(bitcrush_curve(
                    self.config.lo_fi.curve_resolution,
                    self.config.lo_fi.quantize_steps,
                ));
            }
            chain.shaper.mix.ramp_to(
                now,
                self.config.lo_fi.mix,
                self.config.ramp.toggle_seconds,
                RampCurve::Linear,
            );
        } else {
            chain.shaper.mix.ramp_to(
                now,
                0.0,
                self.config.ramp.toggle_seconds,
                RampCurve::Linear,
            );
        }
    }

    /// Set the bound element's pitch-preservation flag
    pub fn set_preserves_pitch(&self, preserve: bool) {
        let Some(element) = &self.element else {
            log::debug!("set_preserves_pitch: no element bound, ignoring");
            return;
        };
        if let Ok(mut el) = element.lock() {
            el.set_preserves_pitch(preserve);
        }
    }

    /// Render one buffer through the chain in place
    ///
    /// Passthrough when the engine is uninitialized or the context is not
    /// running (degraded mode: the element's own audio is unaffected by
    /// graph state). Ramps evaluate against the context clock, which
    /// advances by exactly the rendered frames.
    pub fn process(&mut self, buffer: &mut StereoBuffer) {
        if !self.initialized {
            return;
        }
        let Some(ctx) = self.context.as_mut() else { return };
        if ctx.state() != ContextState::Running {
            return;
        }
        let Some(chain) = self.chain.as_mut() else { return };

        let now = ctx.current_time();
        let dt = ctx.frame_duration();
        let len = buffer.len();
        let end = now + len as f64 * dt;

        // 1. Pre-filter (retro tone)
        chain.pre_filter.process(buffer, now, dt);

        // 2. 8D rotation
        let rotating = self.eight_d_enabled
            || chain.rotation_depth.value() > 0.0
            || chain.rotation_depth.is_ramping(now);
        if rotating {
            let lfo = &chain.rotation_lfo;
            let depth = &chain.rotation_depth;
            chain
                .panner
                .process_modulated(buffer, now, dt, |t| lfo.sample_at(t) * depth.value_at(t));
        } else {
            chain.panner.process(buffer, now, dt);
        }
        chain.rotation_depth.advance_to(end);

        // 3. Spatial width (mid/side)
        let widening = chain.side_gain.value() != 1.0
            || chain.side_gain.is_ramping(now)
            || chain.side_gain.is_ramping(end);
        if widening {
            for (i, sample) in buffer.iter_mut().enumerate() {
                let t = now + i as f64 * dt;
                let gain = chain.side_gain.value_at(t);
                let mid = (sample.left + sample.right) * 0.5;
                let side = (sample.left - sample.right) * 0.5 * gain;
                sample.left = mid + side;
                sample.right = mid - side;
            }
        }
        chain.side_gain.advance_to(end);

        // 4. Reverb wet path, summed against the untouched dry signal
        if self.wet_scratch.len() != len {
            self.wet_scratch = StereoBuffer::silence(len);
        }
        chain.convolver.process(buffer, &mut self.wet_scratch);
        chain.wet_gain.process(&mut self.wet_scratch, now, dt);
        for (out, wet) in buffer.iter_mut().zip(self.wet_scratch.iter()) {
            *out += *wet;
        }

        // 5. Lo-fi shaper
        chain.shaper.process(buffer, now, dt);

        // 6. Master gain
        chain.master_gain.process(buffer, now, dt);

        ctx.advance(len);
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
