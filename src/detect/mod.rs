mod backend;
mod backends;
mod landmarks;
mod locator;
mod result;

pub use backend::{HandLandmarkBackend, WatchDetectorBackend};
pub use backends::{hands_backend_for, watch_backend_for, StubHandsBackend, StubWatchBackend};
#[cfg(feature = "backend-tract")]
pub use backends::{TractHandsBackend, TractWatchBackend};
pub use backends::STUB_MODEL_SCHEME;
pub use landmarks::{HandLandmarkExtractor, MIN_HAND_SPAN_PX, MIN_LANDMARKS};
pub use locator::{WatchLocator, DEFAULT_SCORE_THRESHOLD};
pub use result::Detection;
