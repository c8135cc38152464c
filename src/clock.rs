//! Hand geometry to wall-clock time.
//!
//! `read_hands` is the whole calculator: three denormalized points in, an
//! hour/minute reading out. Deterministic, no I/O. The derivation does not
//! compensate for the minute hand's fractional contribution to the hour
//! angle; hand geometry alone determines the reading, and hands are told
//! apart by landmark index only, never by shape or length.

use std::fmt;

use anyhow::{anyhow, Result};

use crate::geometry::{hand_angle_deg, Point2D};

/// Degrees per hour position on the dial.
const DEGREES_PER_HOUR: f32 = 30.0;
/// Degrees per minute position on the dial.
const DEGREES_PER_MINUTE: f32 = 6.0;

/// Clock center plus the two hand tips, in pixel coordinates of the crop
/// they were extracted from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandLandmarkSet {
    pub center: Point2D,
    pub hour_tip: Point2D,
    pub minute_tip: Point2D,
}

/// A 12-hour wall-clock reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    /// Build a reading, enforcing `hour` in `1..=12` and `minute` in `0..=59`.
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if !(1..=12).contains(&hour) {
            return Err(anyhow!("hour {} outside 1..=12", hour));
        }
        if minute > 59 {
            return Err(anyhow!("minute {} outside 0..=59", minute));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Convert hand geometry into a clock reading.
///
/// Each tip's angle from the center is taken clockwise from 12 o'clock and
/// bucketed: 30 degrees per hour, 6 degrees per minute. An hour bucket of 0
/// displays as 12; buckets are inherently `0..=11`, so no above-12
/// correction case exists.
pub fn read_hands(landmarks: &HandLandmarkSet) -> ClockTime {
    let hour_angle = hand_angle_deg(landmarks.center, landmarks.hour_tip);
    let minute_angle = hand_angle_deg(landmarks.center, landmarks.minute_tip);

    let hour_bucket = (hour_angle / DEGREES_PER_HOUR) as u8;
    let hour = if hour_bucket == 0 { 12 } else { hour_bucket };
    let minute = (minute_angle / DEGREES_PER_MINUTE) as u8;

    ClockTime { hour, minute }
}
