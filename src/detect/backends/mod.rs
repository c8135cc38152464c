mod stub;
#[cfg(feature = "backend-tract")]
mod tract;

pub use stub::{StubHandsBackend, StubWatchBackend};
#[cfg(feature = "backend-tract")]
pub use tract::{TractHandsBackend, TractWatchBackend};

use anyhow::Result;

use crate::detect::backend::{HandLandmarkBackend, WatchDetectorBackend};

/// Model-path scheme that selects the deterministic stub backend instead
/// of loading a file (e.g. `stub://clock_detector`).
pub const STUB_MODEL_SCHEME: &str = "stub://";

/// Build the watch-face detector backend for a configured model path.
pub fn watch_backend_for(model_path: &str) -> Result<Box<dyn WatchDetectorBackend>> {
    if model_path.starts_with(STUB_MODEL_SCHEME) {
        return Ok(Box::new(StubWatchBackend::new()));
    }
    #[cfg(feature = "backend-tract")]
    {
        return Ok(Box::new(TractWatchBackend::load(model_path)?));
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        Err(anyhow::anyhow!(
            "loading object-detector model {} requires the backend-tract feature",
            model_path
        ))
    }
}

/// Build the hand-landmark backend for a configured model path.
pub fn hands_backend_for(model_path: &str) -> Result<Box<dyn HandLandmarkBackend>> {
    if model_path.starts_with(STUB_MODEL_SCHEME) {
        return Ok(Box::new(StubHandsBackend::new()));
    }
    #[cfg(feature = "backend-tract")]
    {
        return Ok(Box::new(TractHandsBackend::load(model_path)?));
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        Err(anyhow::anyhow!(
            "loading watch-hands model {} requires the backend-tract feature",
            model_path
        ))
    }
}
