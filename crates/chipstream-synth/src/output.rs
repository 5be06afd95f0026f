//! Audio rendering: device playback or WAV capture.
//!
//! The rodio source pulls samples straight off the shared engine
//! manager in batches, holding the lock once per batch rather than once
//! per sample.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use chipstream_core::EngineManager;
use hound::{SampleFormat, WavSpec, WavWriter};
use parking_lot::Mutex;
use rodio::{OutputStream, Sink, Source};
use tracing::info;

/// Samples generated per lock acquisition.
const BATCH_SAMPLES: usize = 1024;

/// Audio source that renders the engine manager on demand.
struct ManagerSource {
    manager: Arc<Mutex<EngineManager>>,
    sample_rate: u32,
    buffer: Vec<f32>,
    buffer_pos: usize,
    stopped: Arc<AtomicBool>,
}

impl ManagerSource {
    fn new(manager: Arc<Mutex<EngineManager>>, sample_rate: u32, stopped: Arc<AtomicBool>) -> Self {
        Self {
            manager,
            sample_rate,
            buffer: vec![0.0; BATCH_SAMPLES],
            buffer_pos: BATCH_SAMPLES, // force a refill on first read
            stopped,
        }
    }
}

impl Iterator for ManagerSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.stopped.load(Ordering::Relaxed) {
            return None;
        }
        if self.buffer_pos >= self.buffer.len() {
            self.manager.lock().fill_buffer(&mut self.buffer);
            self.buffer_pos = 0;
        }
        let sample = self.buffer[self.buffer_pos];
        self.buffer_pos += 1;
        Some(sample)
    }
}

impl Source for ManagerSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Live playback to the default audio device.
pub struct AudioOutput {
    _stream: OutputStream,
    _sink: Sink,
    stopped: Arc<AtomicBool>,
}

impl AudioOutput {
    /// Open the default device and start rendering the manager.
    pub fn start(manager: Arc<Mutex<EngineManager>>, sample_rate: u32) -> anyhow::Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("no default audio output device")?;
        let sink = Sink::try_new(&handle).context("failed to create audio sink")?;

        let stopped = Arc::new(AtomicBool::new(false));
        sink.append(ManagerSource::new(manager, sample_rate, Arc::clone(&stopped)));
        info!(sample_rate, "audio device streaming");

        Ok(Self {
            _stream: stream,
            _sink: sink,
            stopped,
        })
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::Relaxed);
    }
}

/// Render the manager to a mono float WAV in near real time.
///
/// Pacing the generation keeps the capture aligned with the sound state
/// the relay is streaming while the file is open.
pub async fn write_wav(
    manager: Arc<Mutex<EngineManager>>,
    path: &Path,
    seconds: u32,
    sample_rate: u32,
) -> anyhow::Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer =
        WavWriter::create(path, spec).with_context(|| format!("create {}", path.display()))?;

    let chunk = (sample_rate / 10).max(1) as usize;
    let mut buffer = vec![0.0f32; chunk];
    let total = seconds as u64 * sample_rate as u64;
    let mut written = 0u64;
    let mut ticker = tokio::time::interval(Duration::from_millis(100));

    while written < total {
        ticker.tick().await;
        manager.lock().fill_buffer(&mut buffer);
        for sample in &buffer {
            writer.write_sample(*sample)?;
        }
        written += chunk as u64;
    }

    writer.finalize()?;
    info!(path = %path.display(), seconds, "WAV capture finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipstream_core::{EngineRegistry, VoicePatch};

    fn shared_manager() -> Arc<Mutex<EngineManager>> {
        let registry = Arc::new(EngineRegistry::with_builtin_engines());
        Arc::new(Mutex::new(EngineManager::new(registry, "atari", 44_100)))
    }

    #[test]
    fn source_renders_bounded_samples() {
        let manager = shared_manager();
        manager
            .lock()
            .set_voice(0, &VoicePatch::from_values(1, 8, 0, 15));

        let stopped = Arc::new(AtomicBool::new(false));
        let mut source = ManagerSource::new(Arc::clone(&manager), 44_100, stopped);

        for _ in 0..(BATCH_SAMPLES * 3) {
            let sample = source.next().expect("source is endless until stopped");
            assert!((-1.0..=1.0).contains(&sample));
        }
    }

    #[test]
    fn source_ends_after_stop_signal() {
        let manager = shared_manager();
        let stopped = Arc::new(AtomicBool::new(false));
        let mut source = ManagerSource::new(manager, 44_100, Arc::clone(&stopped));

        assert!(source.next().is_some());
        stopped.store(true, Ordering::Relaxed);
        assert_eq!(source.next(), None);
    }

    #[test]
    fn source_reports_mono_at_the_configured_rate() {
        let manager = shared_manager();
        let source = ManagerSource::new(manager, 48_000, Arc::new(AtomicBool::new(false)));
        assert_eq!(source.channels(), 1);
        assert_eq!(source.sample_rate(), 48_000);
        assert!(source.total_duration().is_none());
    }
}
