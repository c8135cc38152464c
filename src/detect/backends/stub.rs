//! Deterministic backends for tests and `stub://` model paths.
//!
//! Each stub holds a queue of scripted results. A call pops the front of
//! the queue; an empty queue falls back to a fixed default that reads as a
//! centered watch face showing 12:15. Call counts are observable through a
//! shared handle so tests can assert which stages ran.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;

use crate::detect::backend::{HandLandmarkBackend, WatchDetectorBackend};
use crate::detect::result::Detection;
use crate::geometry::{BoundingBox, Point2D};

/// Stub object detector. Defaults to one centered detection covering half
/// the frame with score 0.9.
pub struct StubWatchBackend {
    scripted: VecDeque<Vec<Detection>>,
    calls: Arc<AtomicUsize>,
}

impl StubWatchBackend {
    pub fn new() -> Self {
        Self {
            scripted: VecDeque::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue the result of the next call. Results pop in FIFO order.
    pub fn push_result(&mut self, detections: Vec<Detection>) {
        self.scripted.push_back(detections);
    }

    /// Shared call counter, valid after the backend is boxed away.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl Default for StubWatchBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchDetectorBackend for StubWatchBackend {
    fn name(&self) -> &'static str {
        "stub-watch"
    }

    fn detect(&mut self, _pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(scripted) = self.scripted.pop_front() {
            return Ok(scripted);
        }
        let w = width as f32;
        let h = height as f32;
        Ok(vec![Detection {
            bbox: BoundingBox::new(w * 0.25, h * 0.25, w * 0.75, h * 0.75),
            score: 0.9,
        }])
    }
}

/// Stub landmark extractor. Defaults to the 12:15 trio: center of the
/// crop, hour tip straight up, minute tip straight right.
pub struct StubHandsBackend {
    scripted: VecDeque<Vec<Point2D>>,
    calls: Arc<AtomicUsize>,
}

impl StubHandsBackend {
    pub fn new() -> Self {
        Self {
            scripted: VecDeque::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue the result of the next call. Results pop in FIFO order.
    pub fn push_result(&mut self, points: Vec<Point2D>) {
        self.scripted.push_back(points);
    }

    /// Shared call counter, valid after the backend is boxed away.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl Default for StubHandsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HandLandmarkBackend for StubHandsBackend {
    fn name(&self) -> &'static str {
        "stub-hands"
    }

    fn landmarks(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<Point2D>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(scripted) = self.scripted.pop_front() {
            return Ok(scripted);
        }
        Ok(vec![
            Point2D::new(0.5, 0.5),
            Point2D::new(0.5, 0.25),
            Point2D::new(0.75, 0.5),
        ])
    }
}
