//! Windowed frame scheduling
//!
//! Walks the input signal at a fixed hop and exposes, for every frame, the analysis
//! slice (window-sized, centered on the frame pointer) and the synthesis-centered slice
//! used by the residual and overlap-add stages.
//!
//! Frame pointers run from `max(Ns/2, hM1)` up to and including `L - max(Ns/2, hM1)`,
//! so a signal of length `L` yields `floor((L - 2 * max(Ns/2, hM1)) / H) + 1` frames, or
//! none when it is shorter than `2 * max(Ns/2, hM1)`.

/// Position of one frame in the input signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePosition {
    /// Frame number, starting at zero
    pub index: usize,
    /// Frame pointer `pin`
    pub pin: usize,
    /// First sample of the analysis slice (`pin - hM1`)
    pub analysis_start: usize,
    /// First sample of the synthesis slice; may be negative for short windows
    pub synthesis_start: isize,
}

/// Iterates analysis frames over a signal of known length
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    half_window_round: usize,
    half_window_floor: usize,
    half_synthesis: usize,
    hop_size: usize,
    first_pin: usize,
    last_pin: Option<usize>,
}

impl FrameScheduler {
    /// Create a scheduler
    ///
    /// # Arguments
    ///
    /// * `signal_len` - Number of input samples `L`
    /// * `window_len` - Analysis window length `M`
    /// * `synthesis_size` - Synthesis FFT size `Ns`
    /// * `hop_size` - Hop size `H` (must be > 0)
    pub fn new(
        signal_len: usize,
        window_len: usize,
        synthesis_size: usize,
        hop_size: usize,
    ) -> Self {
        let half_window_round = (window_len + 1) / 2;
        let half_window_floor = window_len / 2;
        let half_synthesis = synthesis_size / 2;
        let margin = half_synthesis.max(half_window_round);
        let last_pin = signal_len.checked_sub(margin).filter(|&last| last >= margin);

        log::debug!(
            "Frame scheduler: L={}, M={}, Ns={}, H={}, pin range [{}, {:?}]",
            signal_len,
            window_len,
            synthesis_size,
            hop_size,
            margin,
            last_pin
        );

        Self {
            half_window_round,
            half_window_floor,
            half_synthesis,
            hop_size: hop_size.max(1),
            first_pin: margin,
            last_pin,
        }
    }

    /// Number of frames this scheduler yields
    pub fn num_frames(&self) -> usize {
        match self.last_pin {
            Some(last) => (last - self.first_pin) / self.hop_size + 1,
            None => 0,
        }
    }

    /// Frame position for frame number `index`, if it exists
    pub fn position(&self, index: usize) -> Option<FramePosition> {
        if index >= self.num_frames() {
            return None;
        }
        let pin = self.first_pin + index * self.hop_size;
        // Center sample of the analysis slice; for odd windows this is `pin - 1`.
        let center = pin - self.half_window_round + self.half_window_floor;
        Some(FramePosition {
            index,
            pin,
            analysis_start: pin - self.half_window_round,
            synthesis_start: center as isize - self.half_synthesis as isize,
        })
    }

    /// Iterate over all frame positions
    pub fn positions(&self) -> impl Iterator<Item = FramePosition> + '_ {
        (0..self.num_frames()).filter_map(move |i| self.position(i))
    }

    /// Analysis window length handled by this scheduler
    pub fn window_len(&self) -> usize {
        self.half_window_round + self.half_window_floor
    }
}

/// Copy `len` samples starting at `start`, zero-filling anything outside the signal
pub fn padded_slice(signal: &[f32], start: isize, len: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; len];
    for (i, value) in out.iter_mut().enumerate() {
        let idx = start + i as isize;
        if idx >= 0 && (idx as usize) < signal.len() {
            *value = signal[idx as usize];
        }
    }
    out
}
