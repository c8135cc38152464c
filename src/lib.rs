//! dialread - reads the time from an analog watch face in a captured image.
//!
//! # Pipeline
//!
//! One submitted frame flows through four stages:
//!
//! 1. **Locate**: an object-detection capability finds the watch-face
//!    bounding box (confidence threshold 0.3, top-1).
//! 2. **Crop**: the box is clamped to the frame and the region extracted.
//! 3. **Extract**: a landmark capability finds the clock center and the
//!    hour/minute hand tips inside the crop.
//! 4. **Compute**: hand angles become an `HH:mm` reading.
//!
//! A remote vision-language reader is the fallback strategy: it can replace
//! the local stages entirely or be chained behind them, selected by
//! configuration.
//!
//! # Guarantees
//!
//! 1. Exactly one `PipelineOutcome` per submitted frame; no partial or
//!    stale results.
//! 2. Readings are delivered in submission order (single-worker queue).
//! 3. Stage failures become `Failed(reason)`; nothing panics, nothing is
//!    retried automatically.
//! 4. Inference capabilities are loaded once at startup and serialized
//!    behind one worker thread; a missing model fails at startup, not per
//!    frame.
//!
//! # Module structure
//!
//! - `geometry`: point/box/angle math
//! - `clock`: hand geometry to wall-clock time
//! - `frame`: the captured raster and cropping
//! - `detect`: watch locator and hand-landmark extractor over pluggable
//!   backends (`stub://`, ONNX via the `backend-tract` feature)
//! - `remote`: the vision-language fallback reader
//! - `pipeline`: stage sequencing, strategies, the worker queue
//! - `config`: file + environment configuration

pub mod clock;
pub mod config;
pub mod detect;
pub mod frame;
pub mod geometry;
pub mod pipeline;
pub mod remote;

pub use clock::{read_hands, ClockTime, HandLandmarkSet};
pub use config::{DialConfig, RemoteSettings};
pub use detect::{
    hands_backend_for, watch_backend_for, Detection, HandLandmarkBackend, HandLandmarkExtractor,
    StubHandsBackend, StubWatchBackend, WatchDetectorBackend, WatchLocator,
    DEFAULT_SCORE_THRESHOLD, STUB_MODEL_SCHEME,
};
pub use frame::{Frame, Rotation};
pub use geometry::{BoundingBox, Point2D};
pub use pipeline::{
    DisplaySize, Pipeline, PipelineOutcome, PipelineWorker, ReadStrategy, Reading,
};
pub use remote::{RemoteConfig, RemoteTimeReader, READ_INSTRUCTION};
