//! Per-connection session state machine.
//!
//! Owns one accumulation buffer and one scheduler, routes audio and control
//! events through them, and emits one ordered, well-formed sequence of
//! protocol events per session. All errors except connection loss are
//! recovered locally and surfaced as diagnostic `error` events.

use crate::audio::buffer::{AudioChunk, AudioRingBuffer, RecognitionWindow, RingBufferConfig};
use crate::audio::vad::{SilenceDetector, SilenceDetectorConfig};
use crate::audio::wav;
use crate::defaults;
use crate::error::{Result, ScribedError};
use crate::server::protocol::ServerEvent;
use crate::session::scheduler::{Decision, RecognitionScheduler, SchedulerConfig};
use crate::stt::Transcriber;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, no session started.
    Idle,
    /// Accepting audio, scheduler running.
    Active,
    /// Stop received, final pass in flight.
    Draining,
    /// Terminal; no further events accepted.
    Closed,
}

/// Configuration for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Accumulation buffer settings.
    pub ring: RingBufferConfig,
    /// Silence detection settings.
    pub detector: SilenceDetectorConfig,
    /// Trigger policy settings.
    pub scheduler: SchedulerConfig,
    /// Language hint passed to the recognizer.
    pub language: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ring: RingBufferConfig::default(),
            detector: SilenceDetectorConfig::default(),
            scheduler: SchedulerConfig::default(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// One streaming transcription session.
///
/// Owned exclusively by the connection handler that created it; the registry
/// hands out `Arc<Mutex<Session>>` and holding the lock across a recognition
/// pass is what enforces "at most one in-flight pass per session".
pub struct Session {
    id: String,
    state: SessionState,
    config: SessionConfig,
    buffer: AudioRingBuffer,
    scheduler: RecognitionScheduler,
    transcriber: Arc<dyn Transcriber>,
    limiter: Arc<Semaphore>,
    /// Monotonically increasing counter over emitted transcript events.
    seq: u64,
    /// Finalized text; immutable once written.
    committed: String,
}

impl Session {
    /// Creates an idle session bound to a connection identity.
    pub fn new(
        id: String,
        config: SessionConfig,
        transcriber: Arc<dyn Transcriber>,
        limiter: Arc<Semaphore>,
    ) -> Self {
        let buffer = AudioRingBuffer::new(config.ring.clone());
        let scheduler = RecognitionScheduler::new(
            config.scheduler,
            SilenceDetector::new(config.detector),
            config.ring.sample_rate,
        );
        Self {
            id,
            state: SessionState::Idle,
            config,
            buffer,
            scheduler,
            transcriber,
            limiter,
            seq: 0,
            committed: String::new(),
        }
    }

    /// Connection identity this session belongs to.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Text finalized so far. Never changes once a `final` has covered it.
    pub fn transcript(&self) -> &str {
        &self.committed
    }

    /// Number of transcript events emitted so far.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Handles a `start` command: Idle → Active.
    pub fn handle_start(&mut self) -> ServerEvent {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::Active;
                info!(session = %self.id, "session started");
                ServerEvent::SessionStarted
            }
            _ => protocol_error("start received but a session is already active"),
        }
    }

    /// Handles an incoming audio message while Active.
    ///
    /// Buffers the audio, consults the scheduler, and runs at most one
    /// recognition pass. Returns the events to deliver, in order.
    pub async fn handle_audio(&mut self, bytes: &[u8]) -> Vec<ServerEvent> {
        match self.state {
            SessionState::Active => {}
            SessionState::Idle => return vec![protocol_error("audio received before start")],
            SessionState::Draining | SessionState::Closed => {
                return vec![protocol_error("session is not accepting audio")];
            }
        }

        let chunk = match self.decode_chunk(bytes) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(session = %self.id, error = %e, "rejected audio chunk");
                return vec![ServerEvent::error(e.to_string())];
            }
        };

        let mut events = Vec::new();
        let appended = chunk.samples.len();

        match self.buffer.append(&chunk) {
            Ok(outcome) if outcome.overflowed() => {
                let dropped_ms =
                    outcome.dropped_samples as u64 * 1000 / self.buffer.sample_rate() as u64;
                warn!(session = %self.id, dropped_ms, "buffer overflow, oldest audio dropped");
                events.push(ServerEvent::error(
                    ScribedError::Overflow { dropped_ms }.to_string(),
                ));
            }
            Ok(_) => {}
            Err(e) => {
                warn!(session = %self.id, error = %e, "rejected audio chunk");
                events.push(ServerEvent::error(e.to_string()));
                return events;
            }
        }

        match self.scheduler.on_audio_appended(&self.buffer, appended) {
            Decision::NoAction => {}
            Decision::TriggerPartial => {
                let window = self.buffer.snapshot_window(self.scheduler.max_window());
                debug!(session = %self.id, window_ms = window.duration().as_millis() as u64,
                       "partial pass triggered");
                match self.recognize(&window).await {
                    Ok(text) => {
                        self.seq += 1;
                        events.push(ServerEvent::partial(text));
                    }
                    // A failed pass is not fatal; the audio stays buffered
                    // and the next trigger retries with more context.
                    Err(e) => events.push(ServerEvent::error(e.to_string())),
                }
            }
            Decision::TriggerFinal => {
                let window = self.buffer.snapshot_window(self.scheduler.max_window());
                debug!(session = %self.id, window_ms = window.duration().as_millis() as u64,
                       "utterance boundary, final pass triggered");
                match self.recognize(&window).await {
                    Ok(text) => {
                        self.seq += 1;
                        self.commit_text(&text);
                        self.buffer.commit_all();
                        events.push(ServerEvent::final_result(text));
                    }
                    Err(e) => events.push(ServerEvent::error(e.to_string())),
                }
            }
        }

        events
    }

    /// Handles a `stop` command: a synthetic utterance boundary.
    ///
    /// Forces a final pass over whatever remains buffered, bypassing the
    /// silence check; an empty buffer still yields a `final` with empty text.
    pub async fn handle_stop(&mut self) -> Vec<ServerEvent> {
        match self.state {
            SessionState::Active => {
                self.state = SessionState::Draining;

                let window = self.buffer.snapshot_window(self.scheduler.max_window());
                let mut events = Vec::new();

                if window.is_empty() {
                    self.seq += 1;
                    events.push(ServerEvent::final_result(""));
                } else {
                    match self.recognize(&window).await {
                        Ok(text) => {
                            self.seq += 1;
                            self.commit_text(&text);
                            events.push(ServerEvent::final_result(text));
                        }
                        Err(e) => {
                            // The terminal final is still owed to the client;
                            // surface the failure and close with empty text.
                            events.push(ServerEvent::error(e.to_string()));
                            self.seq += 1;
                            events.push(ServerEvent::final_result(""));
                        }
                    }
                }

                self.buffer.commit_all();
                self.scheduler.reset();
                self.state = SessionState::Closed;
                events.push(ServerEvent::SessionEnded);
                info!(session = %self.id, transcript_len = self.committed.len(), "session ended");
                events
            }
            SessionState::Idle => vec![protocol_error("stop received while idle")],
            SessionState::Draining | SessionState::Closed => {
                vec![protocol_error("stop received but session already ended")]
            }
        }
    }

    /// Connection loss: immediate transition to Closed, no further events.
    ///
    /// There is deliberately no final flush here; audio buffered at the
    /// moment of an abrupt disconnect is discarded.
    pub fn abort(&mut self) {
        if self.state != SessionState::Closed {
            debug!(session = %self.id, state = ?self.state, "session aborted");
            self.state = SessionState::Closed;
        }
    }

    fn decode_chunk(&self, bytes: &[u8]) -> Result<AudioChunk> {
        let rate = self.config.ring.sample_rate;
        if wav::looks_like_wav(bytes) {
            let samples = wav::decode_wav(bytes, rate)?;
            Ok(AudioChunk::new(samples, rate, self.config.ring.channels))
        } else {
            AudioChunk::from_pcm_bytes(bytes, rate, self.config.ring.channels)
        }
    }

    async fn recognize(&self, window: &RecognitionWindow) -> Result<String> {
        // Shared recognizer capacity; queueing here delays the pass but never
        // reorders this session's events.
        let _permit =
            self.limiter
                .acquire()
                .await
                .map_err(|_| ScribedError::Recognizer {
                    message: "recognizer pool closed".to_string(),
                })?;

        let transcriber = Arc::clone(&self.transcriber);
        let samples = window.samples().to_vec();
        let language = self.config.language.clone();

        tokio::task::spawn_blocking(move || transcriber.transcribe(&samples, &language))
            .await
            .map_err(|e| ScribedError::Recognizer {
                message: format!("recognition task panicked: {}", e),
            })?
    }

    fn commit_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.committed.is_empty() {
            self.committed.push(' ');
        }
        self.committed.push_str(text);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("buffered", &self.buffer.unconsumed())
            .field("seq", &self.seq)
            .finish()
    }
}

fn protocol_error(message: &str) -> ServerEvent {
    ServerEvent::error(
        ScribedError::Protocol {
            message: message.to_string(),
        }
        .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::MockTranscriber;

    fn make_session(transcriber: MockTranscriber) -> Session {
        Session::new(
            "test-conn".to_string(),
            SessionConfig::default(),
            Arc::new(transcriber),
            Arc::new(Semaphore::new(2)),
        )
    }

    fn voiced_bytes(ms: u32) -> Vec<u8> {
        let n = ms as usize * 16;
        let mut bytes = Vec::with_capacity(n * 2);
        for _ in 0..n {
            bytes.extend_from_slice(&3000i16.to_le_bytes());
        }
        bytes
    }

    fn silence_bytes(ms: u32) -> Vec<u8> {
        vec![0u8; ms as usize * 16 * 2]
    }

    #[test]
    fn test_session_starts_idle() {
        let session = make_session(MockTranscriber::new("m"));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.seq(), 0);
        assert_eq!(session.transcript(), "");
    }

    #[test]
    fn test_start_transitions_to_active() {
        let mut session = make_session(MockTranscriber::new("m"));
        let event = session.handle_start();
        assert_eq!(event, ServerEvent::SessionStarted);
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn test_double_start_is_protocol_error() {
        let mut session = make_session(MockTranscriber::new("m"));
        session.handle_start();
        let event = session.handle_start();
        assert!(matches!(event, ServerEvent::Error { .. }));
        assert_eq!(session.state(), SessionState::Active);
    }

    #[tokio::test]
    async fn test_audio_before_start_is_protocol_error() {
        let mut session = make_session(MockTranscriber::new("m"));
        let events = session.handle_audio(&voiced_bytes(100)).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ServerEvent::Error { .. }));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_short_audio_emits_nothing() {
        let mut session = make_session(MockTranscriber::new("m"));
        session.handle_start();
        let events = session.handle_audio(&voiced_bytes(1000)).await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_interval_crossing_emits_one_partial() {
        let mut session = make_session(MockTranscriber::new("m").with_response("partial text"));
        session.handle_start();

        let events = session.handle_audio(&voiced_bytes(2900)).await;
        assert!(events.is_empty());

        let events = session.handle_audio(&voiced_bytes(200)).await;
        assert_eq!(
            events,
            vec![ServerEvent::partial("partial text")]
        );
        assert_eq!(session.seq(), 1);
        // Partial passes never commit
        assert_eq!(session.transcript(), "");
    }

    #[tokio::test]
    async fn test_silence_boundary_emits_final_and_commits() {
        let mut session = make_session(MockTranscriber::new("m").with_response("an utterance"));
        session.handle_start();

        session.handle_audio(&voiced_bytes(1000)).await;
        let events = session.handle_audio(&silence_bytes(200)).await;
        assert!(events.is_empty(), "trailing silence below minimum");

        let events = session.handle_audio(&silence_bytes(200)).await;
        assert_eq!(events, vec![ServerEvent::final_result("an utterance")]);
        assert_eq!(session.transcript(), "an utterance");
    }

    #[tokio::test]
    async fn test_stop_forces_final_then_session_ended() {
        let mut session = make_session(MockTranscriber::new("m").with_response("short clip"));
        session.handle_start();
        session.handle_audio(&voiced_bytes(1000)).await;

        let events = session.handle_stop().await;
        assert_eq!(
            events,
            vec![
                ServerEvent::final_result("short clip"),
                ServerEvent::SessionEnded
            ]
        );
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.transcript(), "short clip");
    }

    #[tokio::test]
    async fn test_stop_with_empty_buffer_yields_empty_final() {
        let transcriber = MockTranscriber::new("m");
        let mut session = make_session(transcriber);
        session.handle_start();

        let events = session.handle_stop().await;
        assert_eq!(
            events,
            vec![ServerEvent::final_result(""), ServerEvent::SessionEnded]
        );
    }

    #[tokio::test]
    async fn test_stop_while_idle_is_protocol_error() {
        let mut session = make_session(MockTranscriber::new("m"));
        let events = session.handle_stop().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ServerEvent::Error { .. }));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_recognizer_failure_keeps_session_active() {
        let mut session = make_session(MockTranscriber::new("m").with_failure());
        session.handle_start();

        let events = session.handle_audio(&voiced_bytes(3100)).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ServerEvent::Error { .. }));
        assert_eq!(session.state(), SessionState::Active);
        // Buffered audio is retained for the next attempt
        assert!(session.buffer.len() > 0);
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_rejected_not_buffered() {
        let mut session = make_session(MockTranscriber::new("m"));
        session.handle_start();

        let events = session.handle_audio(&[0u8, 1, 2]).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ServerEvent::Error { .. }));
        assert!(session.buffer.is_empty());
        assert_eq!(session.state(), SessionState::Active);
    }

    #[tokio::test]
    async fn test_abort_closes_without_events() {
        let mut session = make_session(MockTranscriber::new("m"));
        session.handle_start();
        session.handle_audio(&voiced_bytes(500)).await;

        session.abort();
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_committed_prefix_is_immutable() {
        let mut session = make_session(MockTranscriber::new("m").with_response("first"));
        session.handle_start();

        session.handle_audio(&voiced_bytes(1000)).await;
        session.handle_audio(&silence_bytes(400)).await;
        assert_eq!(session.transcript(), "first");

        // Later audio and passes never rewrite the committed prefix
        session.handle_audio(&voiced_bytes(3100)).await;
        assert!(session.transcript().starts_with("first"));
    }

    #[tokio::test]
    async fn test_wav_container_audio_accepted() {
        let mut session = make_session(MockTranscriber::new("m"));
        session.handle_start();

        let mut cursor = std::io::Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..1600 {
            writer.write_sample(3000i16).unwrap();
        }
        writer.finalize().unwrap();

        let events = session.handle_audio(&cursor.into_inner()).await;
        assert!(events.is_empty());
        assert_eq!(session.buffer.len(), 1600);
    }
}
