use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::config::PitchDims;
use crate::detection::Observation;
use crate::error::Error;

/// Position in pitch space, within `[0, length] x [0, width]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PitchPoint {
    pub x: f32,
    pub y: f32,
}

impl PitchPoint {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn as_point(&self) -> na::Point2<f32> {
        na::Point2::new(self.x, self.y)
    }

    #[inline]
    pub fn distance(&self, other: &PitchPoint) -> f32 {
        na::distance(&self.as_point(), &other.as_point())
    }
}

/// Projects a pixel position into the `length x width` output rectangle.
///
/// Coordinates outside the frame are clamped onto the rectangle border.
pub fn map_to_pitch(
    px: f32,
    py: f32,
    frame_width: i32,
    frame_height: i32,
    length: f32,
    width: f32,
) -> Result<PitchPoint, Error> {
    if frame_width <= 0 || frame_height <= 0 {
        return Err(Error::InvalidFrameGeometry {
            width: frame_width,
            height: frame_height,
        });
    }

    let x = (px / frame_width as f32) * length;
    let y = (py / frame_height as f32) * width;

    Ok(PitchPoint::new(clamp(x, length), clamp(y, width)))
}

// NaN input collapses onto the origin instead of leaking out of the rectangle.
#[inline]
fn clamp(v: f32, max: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, max)
    }
}

/// Mapper bound to a fixed output rectangle.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    pitch: PitchDims,
}

impl CoordinateMapper {
    pub fn new(pitch: PitchDims) -> Self {
        Self { pitch }
    }

    #[inline]
    pub fn pitch(&self) -> PitchDims {
        self.pitch
    }

    #[inline]
    pub fn map(&self, obs: &Observation, dims: (i32, i32)) -> Result<PitchPoint, Error> {
        map_to_pitch(obs.x, obs.y, dims.0, dims.1, self.pitch.length, self.pitch.width)
    }
}
