//! Recognition scheduling policy.
//!
//! Consulted after every buffer append, the scheduler owns the trade-off
//! between latency and recognizer cost: run a partial pass now, close the
//! utterance with a final pass, or wait for more audio.

use crate::audio::buffer::{AudioRingBuffer, duration_to_samples};
use crate::audio::vad::SilenceDetector;
use crate::defaults;
use std::time::Duration;

/// Configuration for the recognition scheduler.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Amount of newly arrived audio (ms) that provokes a partial pass.
    pub trigger_interval_ms: u32,
    /// Ceiling on a single recognition window, in seconds.
    pub max_window_secs: u32,
    /// Emit partial results. Disabled in single-shot mode.
    pub emit_partials: bool,
    /// Close utterances on trailing silence. Disabled in single-shot mode.
    pub detect_boundaries: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            trigger_interval_ms: defaults::TRIGGER_INTERVAL_MS,
            max_window_secs: defaults::MAX_WINDOW_SECS,
            emit_partials: true,
            detect_boundaries: true,
        }
    }
}

impl SchedulerConfig {
    /// A configuration that only ever reacts to an explicit stop: no partial
    /// passes, no silence boundaries.
    pub fn single_shot() -> Self {
        Self {
            emit_partials: false,
            detect_boundaries: false,
            ..Default::default()
        }
    }
}

/// Decision returned after each append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Not enough new audio; wait.
    NoAction,
    /// Run a partial recognition pass over a snapshot window.
    TriggerPartial,
    /// Utterance boundary reached: run a final pass and commit.
    TriggerFinal,
}

/// Per-session scheduler deciding when the recognizer runs.
#[derive(Debug)]
pub struct RecognitionScheduler {
    config: SchedulerConfig,
    detector: SilenceDetector,
    sample_rate: u32,
    /// Samples appended since the last trigger (any kind).
    since_trigger: usize,
}

impl RecognitionScheduler {
    /// Creates a scheduler with the given policy and silence detector.
    pub fn new(config: SchedulerConfig, detector: SilenceDetector, sample_rate: u32) -> Self {
        Self {
            config,
            detector,
            sample_rate,
            since_trigger: 0,
        }
    }

    /// Ceiling on recognition window duration.
    pub fn max_window(&self) -> Duration {
        Duration::from_secs(self.config.max_window_secs as u64)
    }

    /// Duration of new audio accumulated since the last trigger.
    pub fn since_trigger(&self) -> Duration {
        crate::audio::buffer::samples_to_duration(self.since_trigger, self.sample_rate)
    }

    /// Called after every buffer append; decides whether a recognition pass
    /// is due.
    ///
    /// Policy order:
    /// 1. Trailing silence past the minimum, with non-silent audio buffered,
    ///    closes the utterance.
    /// 2. Enough unconsumed audio since the last trigger provokes a partial
    ///    pass, unless the whole window is silence (not worth a pass).
    /// 3. Otherwise wait.
    pub fn on_audio_appended(
        &mut self,
        buffer: &AudioRingBuffer,
        appended_samples: usize,
    ) -> Decision {
        self.since_trigger += appended_samples;

        let window = buffer.snapshot_window(self.max_window());
        if window.is_empty() {
            return Decision::NoAction;
        }

        let report = self.detector.analyze(window.samples(), self.sample_rate);

        if self.config.detect_boundaries
            && !report.is_silence
            && report.trailing_silence >= self.detector.min_silence()
        {
            self.reset();
            return Decision::TriggerFinal;
        }

        if self.config.emit_partials && self.since_trigger >= self.interval_samples() {
            if report.is_silence {
                // Pure silence: skip the pass entirely.
                return Decision::NoAction;
            }
            self.reset();
            return Decision::TriggerPartial;
        }

        Decision::NoAction
    }

    /// Clears the new-audio counter. Called on every trigger and after a
    /// forced final (explicit stop).
    pub fn reset(&mut self) {
        self.since_trigger = 0;
    }

    fn interval_samples(&self) -> usize {
        duration_to_samples(
            Duration::from_millis(self.config.trigger_interval_ms as u64),
            self.sample_rate,
        )
    }
}
