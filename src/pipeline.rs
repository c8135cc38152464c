//! Detection-to-time pipeline.
//!
//! One submitted frame flows locate -> clamp -> crop -> extract -> compute,
//! or through the remote fallback, and yields exactly one terminal
//! `PipelineOutcome`. Stage errors are converted into `Failed(reason)`;
//! there are no retries and no partial results. The `PipelineWorker` runs
//! the whole sequence for each request on one thread, which serializes
//! access to the non-re-entrant inference capabilities and guarantees that
//! readings come back in submission order.

use std::sync::mpsc;
use std::thread;

use anyhow::{anyhow, Context, Result};

use crate::clock::{read_hands, ClockTime};
use crate::config::DialConfig;
use crate::detect::{
    hands_backend_for, watch_backend_for, HandLandmarkExtractor, WatchLocator,
};
use crate::frame::Frame;
use crate::geometry::BoundingBox;
use crate::remote::{RemoteConfig, RemoteTimeReader};

/// How a frame is turned into a reading. Selected by configuration, not
/// per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadStrategy {
    /// Detector + landmark geometry on device.
    Local,
    /// Remote vision-language inference on the full frame.
    Remote,
    /// Local first; on any non-reading outcome, consult the remote reader.
    LocalThenRemote,
}

impl ReadStrategy {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "local" => Ok(ReadStrategy::Local),
            "remote" => Ok(ReadStrategy::Remote),
            "local-then-remote" => Ok(ReadStrategy::LocalThenRemote),
            other => Err(anyhow!(
                "unknown strategy '{}'; expected local, remote or local-then-remote",
                other
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadStrategy::Local => "local",
            ReadStrategy::Remote => "remote",
            ReadStrategy::LocalThenRemote => "local-then-remote",
        }
    }

    /// True when this strategy needs the remote reader configured.
    pub fn uses_remote(&self) -> bool {
        matches!(self, ReadStrategy::Remote | ReadStrategy::LocalThenRemote)
    }
}

/// Terminal outcome for one submitted frame.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineOutcome {
    /// No detection above threshold. Recoverable; retry with better light.
    NoWatchFound,
    /// Fewer than three usable landmarks. Recoverable, same prompt.
    HandsUnclear,
    /// A computed reading, with the clamped detection box it came from (in
    /// captured-frame coordinates).
    TimeRead {
        time: ClockTime,
        source_box: BoundingBox,
    },
    /// The remote reader's free-text answer, verbatim.
    FallbackTimeRead(String),
    /// A stage error. The reason is displayable as-is.
    Failed(String),
}

impl PipelineOutcome {
    /// User-facing status text for the Presenter.
    pub fn status_line(&self) -> String {
        match self {
            PipelineOutcome::NoWatchFound => "No watch found. Adjust lighting.".to_string(),
            PipelineOutcome::HandsUnclear => {
                "Watch detected, but the hands are unclear. Try again.".to_string()
            }
            PipelineOutcome::TimeRead { time, .. } => format!("The time is {}", time),
            PipelineOutcome::FallbackTimeRead(text) => text.clone(),
            PipelineOutcome::Failed(reason) => format!("Error: {}", reason),
        }
    }

    /// True for the two reading variants.
    pub fn is_reading(&self) -> bool {
        matches!(
            self,
            PipelineOutcome::TimeRead { .. } | PipelineOutcome::FallbackTimeRead(_)
        )
    }
}

/// Display surface the Presenter draws on, for overlay projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

/// What the Presenter receives: the outcome plus, when a detection exists
/// and a display surface is configured, the detection box projected into
/// display space.
#[derive(Clone, Debug)]
pub struct Reading {
    pub outcome: PipelineOutcome,
    pub overlay_box: Option<BoundingBox>,
}

/// Local geometric reading: locator, crop, extractor, calculator.
struct LocalGeometric {
    locator: WatchLocator,
    extractor: HandLandmarkExtractor,
}

/// Outcome plus the clamped detection box (captured-frame space) when one
/// exists, kept for overlay projection even on non-reading outcomes.
struct StageResult {
    outcome: PipelineOutcome,
    source_box: Option<BoundingBox>,
}

impl StageResult {
    fn without_box(outcome: PipelineOutcome) -> Self {
        Self {
            outcome,
            source_box: None,
        }
    }
}

impl LocalGeometric {
    fn read(&mut self, frame: &Frame) -> StageResult {
        log::debug!(
            "locating watch in {}x{} frame ({})",
            frame.width(),
            frame.height(),
            self.locator.backend_name()
        );
        let detection = match self.locator.locate(frame) {
            Ok(detection) => detection,
            Err(e) => {
                return StageResult::without_box(PipelineOutcome::Failed(format!(
                    "watch detection failed: {:#}",
                    e
                )))
            }
        };
        let Some(detection) = detection else {
            log::info!("no watch found above threshold");
            return StageResult::without_box(PipelineOutcome::NoWatchFound);
        };

        let clamped = detection.bbox.clamp_to(frame.width(), frame.height());
        if clamped.is_empty() {
            log::warn!("detection clamped to an empty box, treating as no watch");
            return StageResult::without_box(PipelineOutcome::NoWatchFound);
        }
        log::info!(
            "watch detected, analyzing time (score={:.2}, box={:.0}x{:.0})",
            detection.score,
            clamped.width(),
            clamped.height()
        );

        let crop = match frame.crop(&clamped) {
            Ok(crop) => crop,
            Err(e) => {
                return StageResult {
                    outcome: PipelineOutcome::Failed(format!("crop failed: {:#}", e)),
                    source_box: Some(clamped),
                }
            }
        };

        let landmarks = match self.extractor.extract(&crop) {
            Ok(landmarks) => landmarks,
            Err(e) => {
                return StageResult {
                    outcome: PipelineOutcome::Failed(format!(
                        "hand landmark extraction failed: {:#}",
                        e
                    )),
                    source_box: Some(clamped),
                }
            }
        };
        let Some(landmarks) = landmarks else {
            log::info!("hands unclear in detected watch face");
            return StageResult {
                outcome: PipelineOutcome::HandsUnclear,
                source_box: Some(clamped),
            };
        };

        let time = read_hands(&landmarks);
        log::info!("time read locally: {}", time);
        StageResult {
            outcome: PipelineOutcome::TimeRead {
                time,
                source_box: clamped,
            },
            source_box: Some(clamped),
        }
    }
}

fn remote_read(reader: &RemoteTimeReader, frame: &Frame) -> StageResult {
    match reader.read(frame) {
        Ok(text) => {
            log::info!("time read remotely: {:?}", text);
            StageResult::without_box(PipelineOutcome::FallbackTimeRead(text))
        }
        Err(e) => StageResult::without_box(PipelineOutcome::Failed(format!("{:#}", e))),
    }
}

/// Strategy dispatch. One variant per deployment shape.
enum StrategyImpl {
    Local(LocalGeometric),
    Remote(RemoteTimeReader),
    Chained {
        local: LocalGeometric,
        remote: RemoteTimeReader,
    },
}

/// The detection-to-time pipeline.
///
/// Owns the inference capabilities for its lifetime; construct once at
/// startup and drive through a `PipelineWorker` (or call `read_frame`
/// directly from a single thread).
pub struct Pipeline {
    strategy: StrategyImpl,
    display: Option<DisplaySize>,
    frames_processed: u64,
}

impl Pipeline {
    /// Wire up a pipeline from configuration. Model or endpoint problems
    /// surface here, at startup, never as a per-frame outcome.
    pub fn from_config(cfg: &DialConfig) -> Result<Self> {
        let build_local = |cfg: &DialConfig| -> Result<LocalGeometric> {
            let watch = watch_backend_for(&cfg.detector_model)
                .context("initialize watch detector")?;
            let hands =
                hands_backend_for(&cfg.hands_model).context("initialize hand landmarker")?;
            Ok(LocalGeometric {
                locator: WatchLocator::new(watch).with_threshold(cfg.score_threshold),
                extractor: HandLandmarkExtractor::new(hands),
            })
        };
        let build_remote = |cfg: &DialConfig| -> Result<RemoteTimeReader> {
            let endpoint = cfg.remote.url.clone().ok_or_else(|| {
                anyhow!(
                    "strategy '{}' requires a remote endpoint URL",
                    cfg.strategy.as_str()
                )
            })?;
            RemoteTimeReader::new(RemoteConfig {
                endpoint,
                model: cfg.remote.model.clone(),
                api_key: cfg.remote.api_key.clone(),
                timeout: cfg.remote.timeout,
            })
        };

        let strategy = match cfg.strategy {
            ReadStrategy::Local => StrategyImpl::Local(build_local(cfg)?),
            ReadStrategy::Remote => StrategyImpl::Remote(build_remote(cfg)?),
            ReadStrategy::LocalThenRemote => StrategyImpl::Chained {
                local: build_local(cfg)?,
                remote: build_remote(cfg)?,
            },
        };
        Ok(Self {
            strategy,
            display: cfg.display,
            frames_processed: 0,
        })
    }

    /// Local-geometric pipeline from already-built capabilities.
    pub fn new_local(locator: WatchLocator, extractor: HandLandmarkExtractor) -> Self {
        Self {
            strategy: StrategyImpl::Local(LocalGeometric { locator, extractor }),
            display: None,
            frames_processed: 0,
        }
    }

    /// Remote-only pipeline.
    pub fn new_remote(reader: RemoteTimeReader) -> Self {
        Self {
            strategy: StrategyImpl::Remote(reader),
            display: None,
            frames_processed: 0,
        }
    }

    /// Local pipeline with a remote fallback chained behind it.
    pub fn new_chained(
        locator: WatchLocator,
        extractor: HandLandmarkExtractor,
        reader: RemoteTimeReader,
    ) -> Self {
        Self {
            strategy: StrategyImpl::Chained {
                local: LocalGeometric { locator, extractor },
                remote: reader,
            },
            display: None,
            frames_processed: 0,
        }
    }

    /// Enable overlay projection onto a display surface.
    pub fn with_display(mut self, display: DisplaySize) -> Self {
        self.display = Some(display);
        self
    }

    pub fn strategy(&self) -> ReadStrategy {
        match self.strategy {
            StrategyImpl::Local(_) => ReadStrategy::Local,
            StrategyImpl::Remote(_) => ReadStrategy::Remote,
            StrategyImpl::Chained { .. } => ReadStrategy::LocalThenRemote,
        }
    }

    /// Frames processed since construction.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Drive one frame through the pipeline. Always produces exactly one
    /// outcome; never panics on stage failure.
    pub fn read_frame(&mut self, frame: &Frame) -> Reading {
        self.frames_processed += 1;
        log::debug!(
            "invocation #{}: {} strategy",
            self.frames_processed,
            self.strategy().as_str()
        );

        let result = match &mut self.strategy {
            StrategyImpl::Local(local) => local.read(frame),
            StrategyImpl::Remote(remote) => remote_read(remote, frame),
            StrategyImpl::Chained { local, remote } => {
                let first = local.read(frame);
                if first.outcome.is_reading() {
                    first
                } else {
                    log::info!(
                        "local reading unavailable ({}), falling back to remote",
                        first.outcome.status_line()
                    );
                    let mut second = remote_read(remote, frame);
                    // Keep the local detection box for the overlay even when
                    // the reading itself comes from the fallback.
                    second.source_box = second.source_box.or(first.source_box);
                    second
                }
            }
        };

        let overlay_box = match (result.source_box, self.display) {
            (Some(bbox), Some(display)) => Some(bbox.scaled(
                display.width as f32 / frame.width() as f32,
                display.height as f32 / frame.height() as f32,
            )),
            _ => None,
        };
        Reading {
            outcome: result.outcome,
            overlay_box,
        }
    }
}

/// One queued read request: the frame plus the reply channel.
struct ReadRequest {
    frame: Frame,
    reply: mpsc::Sender<Reading>,
}

/// Single-worker request queue in front of a `Pipeline`.
///
/// Each submission is an explicit request value; the worker thread consumes
/// them in FIFO order, so at most one invocation is in flight and readings
/// are delivered in submission order. A caller that drops its receiver
/// mid-flight simply discards that reading.
pub struct PipelineWorker {
    sender: Option<mpsc::Sender<ReadRequest>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PipelineWorker {
    /// Move the pipeline onto its worker thread.
    pub fn spawn(mut pipeline: Pipeline) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<ReadRequest>();
        let handle = thread::Builder::new()
            .name("dialread-pipeline".to_string())
            .spawn(move || {
                while let Ok(request) = receiver.recv() {
                    let reading = pipeline.read_frame(&request.frame);
                    // The presenter may be gone; the reading is dropped.
                    let _ = request.reply.send(reading);
                }
                log::debug!(
                    "pipeline worker exiting after {} frame(s)",
                    pipeline.frames_processed()
                );
            })
            .context("spawn pipeline worker thread")?;
        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue a frame; the reading arrives on the returned channel.
    pub fn submit(&self, frame: Frame) -> Result<mpsc::Receiver<Reading>> {
        let (reply, receiver) = mpsc::channel();
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| anyhow!("pipeline worker has shut down"))?;
        sender
            .send(ReadRequest { frame, reply })
            .map_err(|_| anyhow!("pipeline worker has shut down"))?;
        Ok(receiver)
    }

    /// Drain the queue and stop the worker.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PipelineWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parsing_round_trips() {
        for strategy in [
            ReadStrategy::Local,
            ReadStrategy::Remote,
            ReadStrategy::LocalThenRemote,
        ] {
            assert_eq!(ReadStrategy::parse(strategy.as_str()).unwrap(), strategy);
        }
        assert!(ReadStrategy::parse("cloud").is_err());
    }

    #[test]
    fn status_lines_are_displayable() {
        assert_eq!(
            PipelineOutcome::NoWatchFound.status_line(),
            "No watch found. Adjust lighting."
        );
        assert_eq!(
            PipelineOutcome::Failed("model not ready".to_string()).status_line(),
            "Error: model not ready"
        );
        assert_eq!(
            PipelineOutcome::FallbackTimeRead("10:09".to_string()).status_line(),
            "10:09"
        );
    }

    #[test]
    fn reading_variants_are_marked() {
        assert!(PipelineOutcome::FallbackTimeRead("x".into()).is_reading());
        assert!(!PipelineOutcome::NoWatchFound.is_reading());
        assert!(!PipelineOutcome::Failed("x".into()).is_reading());
    }
}
