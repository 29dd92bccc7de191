//! Convolution reverb node
//!
//! Uniformly partitioned frequency-domain convolution of a stereo impulse
//! response. The impulse is cut into fixed-size partitions whose spectra
//! are multiplied against a frequency-domain delay line of input blocks,
//! so cost stays flat regardless of impulse length. Output lags the input
//! by one partition; for a reverb tail that is inaudible.
//!
//! The node renders the wet signal only. The engine mixes it against the
//! dry path through a separate gain, so the convolver stays connected at
//! all times and only the wet gain is ramped.

use std::collections::VecDeque;
use std::sync::Arc;

use realfft::{num_complex::Complex32, ComplexToReal, RealFftPlanner, RealToComplex};

use crate::graph::impulse::ImpulseResponse;
use crate::types::{Sample, StereoBuffer};

/// Partition length in frames
const PARTITION: usize = 1024;

/// Streaming state for one channel
struct ChannelState {
    /// Input frames waiting to fill the next partition
    fifo: Vec<Sample>,
    /// Spectra of recent input blocks, newest at the front
    delay_line: VecDeque<Vec<Complex32>>,
    /// Overlap-add tail from the previous block
    overlap: Vec<Sample>,
    /// Rendered frames not yet consumed
    ready: VecDeque<Sample>,
}

impl ChannelState {
    fn new(partitions: usize, bins: usize) -> Self {
        Self {
            fifo: Vec::with_capacity(PARTITION),
            delay_line: (0..partitions).map(|_| vec![Complex32::default(); bins]).collect(),
            overlap: vec![0.0; PARTITION],
            // Pre-filled with one partition of silence so the output lag
            // is always exactly one partition, independent of how the
            // caller chunks its buffers.
            ready: std::iter::repeat(0.0).take(PARTITION).collect(),
        }
    }
}

/// Partitioned-convolution reverb
pub struct ConvolverNode {
    fft: Arc<dyn RealToComplex<f32>>,
    ifft: Arc<dyn ComplexToReal<f32>>,
    /// Per-channel impulse partition spectra
    ir_spectra: [Vec<Vec<Complex32>>; 2],
    channels: [ChannelState; 2],
    // Scratch buffers reused across blocks
    time_scratch: Vec<Sample>,
    spectrum_scratch: Vec<Complex32>,
    accumulator: Vec<Complex32>,
}

impl ConvolverNode {
    /// Create a convolver for the given impulse response
    pub fn new(impulse: &ImpulseResponse) -> Self {
        let fft_size = PARTITION * 2;
        let bins = fft_size / 2 + 1;
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let ifft = planner.plan_fft_inverse(fft_size);

        let mut node = Self {
            fft,
            ifft,
            ir_spectra: [Vec::new(), Vec::new()],
            channels: std::array::from_fn(|_| ChannelState::new(1, bins)),
            time_scratch: vec![0.0; fft_size],
            spectrum_scratch: vec![Complex32::default(); bins],
            accumulator: vec![Complex32::default(); bins],
        };
        node.set_impulse(impulse);
        node
    }

    /// Install a new impulse response, resetting streaming state
    pub fn set_impulse(&mut self, impulse: &ImpulseResponse) {
        let bins = self.bins();
        for (ch, samples) in [&impulse.left, &impulse.right].into_iter().enumerate() {
            let mut spectra = Vec::new();
            for chunk in samples.chunks(PARTITION) {
                self.time_scratch.fill(0.0);
                self.time_scratch[..chunk.len()].copy_from_slice(chunk);
                let mut spectrum = vec![Complex32::default(); bins];
                if let Err(e) = self.fft.process(&mut self.time_scratch, &mut spectrum) {
                    log::warn!("convolver: impulse FFT failed: {}", e);
                    spectrum.fill(Complex32::default());
                }
                spectra.push(spectrum);
            }
            if spectra.is_empty() {
                spectra.push(vec![Complex32::default(); bins]);
            }
            self.ir_spectra[ch] = spectra;
        }

        let partitions = self.ir_spectra[0].len().max(self.ir_spectra[1].len());
        self.channels = std::array::from_fn(|_| ChannelState::new(partitions, bins));
    }

    #[inline]
    fn bins(&self) -> usize {
        PARTITION + 1
    }

    /// Output lag introduced by block processing, in frames
    pub fn latency_frames(&self) -> usize {
        PARTITION
    }

    /// Clear streaming state, keeping the impulse
    pub fn reset(&mut self) {
        let bins = self.bins();
        let partitions = self.ir_spectra[0].len().max(1);
        self.channels = std::array::from_fn(|_| ChannelState::new(partitions, bins));
    }

    /// Render the wet signal for `input` into `output`
    ///
    /// Both buffers must be the same length. Output frames that are not yet
    /// available (inside the first partition of lag) are silence.
    pub fn process(&mut self, input: &StereoBuffer, output: &mut StereoBuffer) {
        debug_assert_eq!(input.len(), output.len());
        let fft_size = PARTITION * 2;

        for ch in 0..2 {
            // Feed input
            for sample in input.iter() {
                let v = if ch == 0 { sample.left } else { sample.right };
                self.channels[ch].fifo.push(v);

                if self.channels[ch].fifo.len() == PARTITION {
                    // Block ready: FFT it into the delay line
                    self.time_scratch.fill(0.0);
                    self.time_scratch[..PARTITION].copy_from_slice(&self.channels[ch].fifo);
                    self.channels[ch].fifo.clear();

                    if let Err(e) = self
                        .fft
                        .process(&mut self.time_scratch, &mut self.spectrum_scratch)
                    {
                        log::warn!("convolver: block FFT failed: {}", e);
                        continue;
                    }
                    let state = &mut self.channels[ch];
                    let mut spectrum = state.delay_line.pop_back().unwrap_or_default();
                    spectrum.copy_from_slice(&self.spectrum_scratch);
                    state.delay_line.push_front(spectrum);

                    // Multiply-accumulate against the impulse partitions
                    self.accumulator.fill(Complex32::default());
                    for (block, ir) in state.delay_line.iter().zip(self.ir_spectra[ch].iter()) {
                        for (acc, (x, h)) in
                            self.accumulator.iter_mut().zip(block.iter().zip(ir.iter()))
                        {
                            *acc += x * h;
                        }
                    }
                    // DC and Nyquist bins of a real convolution are real;
                    // zero the rounding residue the inverse FFT rejects.
                    self.accumulator[0].im = 0.0;
                    let last = self.accumulator.len() - 1;
                    self.accumulator[last].im = 0.0;

                    if let Err(e) = self
                        .ifft
                        .process(&mut self.accumulator, &mut self.time_scratch)
                    {
                        log::warn!("convolver: inverse FFT failed: {}", e);
                        continue;
                    }

                    let scale = 1.0 / fft_size as f32;
                    for j in 0..PARTITION {
                        let value = self.time_scratch[j] * scale + state.overlap[j];
                        state.ready.push_back(value);
                        state.overlap[j] = self.time_scratch[PARTITION + j] * scale;
                    }
                }
            }
        }

        // Drain rendered frames; silence while the pipeline fills
        for sample in output.iter_mut() {
            sample.left = self.channels[0].ready.pop_front().unwrap_or(0.0);
            sample.right = self.channels[1].ready.pop_front().unwrap_or(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::impulse;
    use crate::types::StereoSample;

    fn unit_impulse() -> ImpulseResponse {
        ImpulseResponse {
            left: vec![1.0],
            right: vec![1.0],
        }
    }

    #[test]
    fn test_unit_impulse_is_delayed_identity() {
        let mut conv = ConvolverNode::new(&unit_impulse());

        let mut input = StereoBuffer::silence(PARTITION * 2);
        input[0] = StereoSample::new(1.0, 0.5);
        let mut output = StereoBuffer::silence(PARTITION * 2);

        conv.process(&input, &mut output);

        // Wet output is the input delayed by one partition
        let lag = conv.latency_frames();
        assert!((output[lag].left - 1.0).abs() < 1e-3);
        assert!((output[lag].right - 0.5).abs() < 1e-3);

        // Everything else is near-silent
        let residue: f32 = output
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != lag)
            .map(|(_, s)| s.peak())
            .fold(0.0, f32::max);
        assert!(residue < 1e-3, "residue {}", residue);
    }

    #[test]
    fn test_latency_is_one_partition_even_for_whole_block_calls() {
        let mut conv = ConvolverNode::new(&unit_impulse());

        // A call that delivers exactly one partition completes a block
        // immediately; the drained output must still all be lag silence.
        let mut input = StereoBuffer::silence(PARTITION);
        input[0] = StereoSample::new(1.0, 1.0);
        let mut output = StereoBuffer::silence(PARTITION);
        conv.process(&input, &mut output);
        assert!(output.peak() < 1e-6, "first partition must be silent, peak {}", output.peak());

        // The rendered block arrives at the head of the next call
        let silence = StereoBuffer::silence(PARTITION);
        let mut next = StereoBuffer::silence(PARTITION);
        conv.process(&silence, &mut next);
        assert!((next[0].left - 1.0).abs() < 1e-3, "got {}", next[0].left);
    }

    #[test]
    fn test_noise_impulse_produces_tail() {
        let ir = impulse::generate(48000, 0.25, 2.0);
        let mut conv = ConvolverNode::new(&ir);

        let mut input = StereoBuffer::silence(PARTITION * 8);
        input[0] = StereoSample::new(1.0, 1.0);
        let mut output = StereoBuffer::silence(PARTITION * 8);

        conv.process(&input, &mut output);

        // Energy should persist well past the direct sound
        let tail: f32 = output
            .iter()
            .skip(PARTITION * 2)
            .map(|s| s.left.abs())
            .sum();
        assert!(tail > 0.0, "expected a reverb tail");
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let ir = impulse::generate(48000, 0.05, 1.0);

        let mut input = StereoBuffer::silence(PARTITION * 4);
        for (i, s) in input.iter_mut().enumerate() {
            let v = ((i as f32 * 0.05).sin() * 0.5) as Sample;
            *s = StereoSample::new(v, v);
        }

        let mut one_shot = ConvolverNode::new(&ir);
        let mut full = StereoBuffer::silence(PARTITION * 4);
        one_shot.process(&input, &mut full);

        // Same input delivered in uneven chunks
        let mut streaming = ConvolverNode::new(&ir);
        let mut chunked = StereoBuffer::silence(PARTITION * 4);
        let mut offset = 0;
        for chunk_len in [100, 900, 1024, 500, PARTITION * 4 - 2524] {
            let mut in_chunk = StereoBuffer::silence(chunk_len);
            let mut out_chunk = StereoBuffer::silence(chunk_len);
            for j in 0..chunk_len {
                in_chunk[j] = input[offset + j];
            }
            streaming.process(&in_chunk, &mut out_chunk);
            for j in 0..chunk_len {
                chunked[offset + j] = out_chunk[j];
            }
            offset += chunk_len;
        }

        for i in 0..full.len() {
            assert!(
                (full[i].left - chunked[i].left).abs() < 1e-4,
                "mismatch at {}: {} vs {}",
                i,
                full[i].left,
                chunked[i].left
            );
        }
    }

    #[test]
    fn test_reset_clears_tail() {
        let ir = impulse::generate(48000, 0.1, 1.0);
        let mut conv = ConvolverNode::new(&ir);

        let mut input = StereoBuffer::silence(PARTITION * 2);
        for s in input.iter_mut() {
            *s = StereoSample::new(1.0, 1.0);
        }
        let mut output = StereoBuffer::silence(PARTITION * 2);
        conv.process(&input, &mut output);

        conv.reset();

        let silence_in = StereoBuffer::silence(PARTITION * 2);
        let mut silence_out = StereoBuffer::silence(PARTITION * 2);
        conv.process(&silence_in, &mut silence_out);

        assert!(silence_out.peak() < 1e-6, "tail must not survive reset");
    }
}
