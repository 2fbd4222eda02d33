//! Capture buffer with trailing-silence auto-stop and WAV encoding.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::config::runtime::{DEFAULT_SILENCE_DURATION, DEFAULT_SILENCE_THRESHOLD};
use crate::core::error::TutorError;
use crate::speech::CapturedAudio;

/// Samples per frame handed out by [`WavFileSource`] (~32 ms at 16 kHz).
pub const FRAME_SAMPLES: usize = 512;

/// Mono PCM frames in `[-1.0, 1.0]`.
pub trait AudioSource: Send {
    fn sample_rate(&self) -> u32;

    /// `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Vec<f32>>, TutorError>;
}

/// Root mean square amplitude.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

pub struct WavFileSource {
    samples: Vec<f32>,
    sample_rate: u32,
    position: usize,
}

impl WavFileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TutorError> {
        let path = path.as_ref();
        let mut reader = WavReader::open(path).map_err(|e| {
            TutorError::device(format!("Cannot open audio file {}: {e}", path.display()))
        })?;
        let spec = reader.spec();
        debug!(
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            bits = spec.bits_per_sample,
            "reading WAV file"
        );

        let read_error = |e: hound::Error| {
            TutorError::device(format!("Cannot read audio file {}: {e}", path.display()))
        };
        let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, _) => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(read_error)?,
            (SampleFormat::Int, 16) => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
                .collect::<Result<_, _>>()
                .map_err(read_error)?,
            (SampleFormat::Int, bits @ (24 | 32)) => {
                let scale = (1u64 << (bits - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(read_error)?
            }
            (_, bits) => {
                return Err(TutorError::device(format!(
                    "Unsupported WAV bit depth: {bits}"
                )))
            }
        };

        let channels = spec.channels.max(1) as usize;
        let samples = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();
        Ok(Self::from_samples(samples, spec.sample_rate))
    }

    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            position: 0,
        }
    }
}

impl AudioSource for WavFileSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn next_frame(&mut self) -> Result<Option<Vec<f32>>, TutorError> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }
        let end = (self.position + FRAME_SAMPLES).min(self.samples.len());
        let frame = self.samples[self.position..end].to_vec();
        self.position = end;
        Ok(Some(frame))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecorderConfig {
    pub auto_stop: bool,
    pub silence_threshold: f32,
    pub silence_duration: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            auto_stop: true,
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            silence_duration: DEFAULT_SILENCE_DURATION,
        }
    }
}

/// Tracks how long the input has been quiet since speech was last heard.
#[derive(Debug)]
pub struct SilenceDetector {
    threshold: f32,
    hold: Duration,
    silent_for: Duration,
    heard_speech: bool,
}

impl SilenceDetector {
    pub fn new(threshold: f32, hold: Duration) -> Self {
        Self {
            threshold,
            hold,
            silent_for: Duration::ZERO,
            heard_speech: false,
        }
    }

    /// True once trailing silence after speech exceeds the hold time.
    pub fn observe(&mut self, level: f32, elapsed: Duration) -> bool {
        if level >= self.threshold {
            self.heard_speech = true;
            self.silent_for = Duration::ZERO;
            return false;
        }
        if !self.heard_speech {
            return false;
        }
        self.silent_for += elapsed;
        self.silent_for > self.hold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Recording,
    AutoStopped,
}

pub struct Recorder {
    config: RecorderConfig,
    sample_rate: u32,
    buffer: Vec<f32>,
    detector: SilenceDetector,
    state: RecorderState,
}

impl Recorder {
    pub fn new(config: RecorderConfig, sample_rate: u32) -> Self {
        Self {
            detector: SilenceDetector::new(config.silence_threshold, config.silence_duration),
            config,
            sample_rate,
            buffer: Vec::new(),
            state: RecorderState::Recording,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn push_frame(&mut self, frame: &[f32]) -> RecorderState {
        if self.state == RecorderState::AutoStopped {
            return self.state;
        }
        self.buffer.extend_from_slice(frame);
        if self.config.auto_stop && self.sample_rate > 0 {
            let elapsed = Duration::from_secs_f64(frame.len() as f64 / self.sample_rate as f64);
            if self.detector.observe(rms(frame), elapsed) {
                debug!(samples = self.buffer.len(), "trailing silence; stopping capture");
                self.state = RecorderState::AutoStopped;
            }
        }
        self.state
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.buffer.len() as f64 / self.sample_rate as f64)
    }

    /// Encode the buffer as mono 16-bit WAV.
    pub fn finish(self) -> Result<CapturedAudio, TutorError> {
        let duration = self.duration();
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let encode_error = |e: hound::Error| TutorError::device(format!("Cannot encode WAV: {e}"));
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(encode_error)?;
        for &sample in &self.buffer {
            let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(sample_i16).map_err(encode_error)?;
        }
        writer.finalize().map_err(encode_error)?;

        info!(
            samples = self.buffer.len(),
            seconds = duration.as_secs_f32(),
            "captured audio"
        );
        Ok(CapturedAudio {
            wav: cursor.into_inner(),
            sample_rate: self.sample_rate,
            duration,
        })
    }

    /// Drain `source` until it ends or trailing silence stops the capture.
    pub fn record(
        source: &mut dyn AudioSource,
        config: RecorderConfig,
    ) -> Result<CapturedAudio, TutorError> {
        let mut recorder = Recorder::new(config, source.sample_rate());
        while let Some(frame) = source.next_frame()? {
            if recorder.push_frame(&frame) == RecorderState::AutoStopped {
                break;
            }
        }
        recorder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RATE: u32 = 16_000;

    fn tone(seconds: f32, amplitude: f32) -> Vec<f32> {
        let count = (RATE as f32 * seconds) as usize;
        (0..count)
            .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
            .collect()
    }

    #[test]
    fn rms_of_constant_amplitude() {
        assert_eq!(rms(&[]), 0.0);
        assert!((rms(&[0.5, -0.5, 0.5, -0.5]) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn silence_before_speech_does_not_stop() {
        let mut detector = SilenceDetector::new(0.01, Duration::from_secs(2));
        assert!(!detector.observe(0.0, Duration::from_secs(5)));
        assert!(!detector.observe(0.2, Duration::from_millis(100)));
        assert!(!detector.observe(0.0, Duration::from_secs(2)));
        assert!(detector.observe(0.0, Duration::from_millis(50)));
    }

    #[test]
    fn recorder_auto_stops_after_trailing_silence() {
        let mut samples = tone(1.0, 0.3);
        samples.extend(tone(3.0, 0.0));
        samples.extend(tone(1.0, 0.3));
        let mut source = WavFileSource::from_samples(samples, RATE);

        let captured = Recorder::record(&mut source, RecorderConfig::default()).unwrap();
        let seconds = captured.duration.as_secs_f32();
        assert!(seconds > 3.0 && seconds < 3.1, "stopped after {seconds}s");
        assert_eq!(captured.sample_rate, RATE);
    }

    #[test]
    fn auto_stop_can_be_disabled() {
        let mut samples = tone(0.5, 0.3);
        samples.extend(tone(3.0, 0.0));
        let mut source = WavFileSource::from_samples(samples, RATE);
        let config = RecorderConfig {
            auto_stop: false,
            ..Default::default()
        };
        let captured = Recorder::record(&mut source, config).unwrap();
        assert!((captured.duration.as_secs_f32() - 3.5).abs() < 0.01);
    }

    #[test]
    fn wav_round_trips_through_a_file_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("take.wav");

        let mut recorder = Recorder::new(RecorderConfig::default(), RATE);
        recorder.push_frame(&tone(0.25, 0.5));
        let captured = recorder.finish().unwrap();
        assert_eq!(&captured.wav[..4], b"RIFF");
        std::fs::write(&path, &captured.wav).unwrap();

        let mut source = WavFileSource::open(&path).unwrap();
        assert_eq!(source.sample_rate(), RATE);
        let frame = source.next_frame().unwrap().expect("first frame");
        assert_eq!(frame.len(), FRAME_SAMPLES);
        assert!((rms(&frame) - 0.5).abs() < 0.01);
    }

    #[test]
    fn missing_file_is_a_device_error() {
        let err = match WavFileSource::open("/nonexistent/take.wav") {
            Err(err) => err,
            Ok(_) => panic!("missing file should not open"),
        };
        assert!(matches!(err, TutorError::Device(_)));
    }
}
