use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Error;

/// Pixel dimensions of a decoded frame as (width, height).
pub trait FrameGeometry {
    fn dims(&self) -> (i32, i32);
}

/// Ordered, finite stream of decoded frames.
pub trait VideoSource {
    type Frame: FrameGeometry;

    /// Identifier reported in run metadata (path, URL, device name).
    fn id(&self) -> &str;

    /// Frame rate as reported by the decoder; may be <= 0 when unknown.
    fn fps(&self) -> f64;

    fn frame_count(&self) -> Option<u64>;

    /// Next frame in order, `Ok(None)` once the stream is exhausted.
    fn read_frame(&mut self) -> Result<Option<Self::Frame>, Error>;

    /// Releases the underlying decoder. Must be safe to call more than once.
    fn close(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub width: i32,
    pub height: i32,
    pub data: Vec<u8>,
}

impl RawFrame {
    pub fn blank(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            data: Vec::new(),
        }
    }
}

impl FrameGeometry for RawFrame {
    #[inline]
    fn dims(&self) -> (i32, i32) {
        (self.width, self.height)
    }
}

/// A frame selected for analysis.
#[derive(Debug, Clone)]
pub struct SampleTick<F> {
    pub index: u64,
    pub timestamp: f64, // in seconds
    pub frame: F,
}

/// In-memory source over pre-decoded frames.
pub struct MemorySource {
    id: String,
    fps: f64,
    total: u64,
    frames: VecDeque<RawFrame>,
    position: u64,
    fail_at: Option<u64>,
    hide_count: bool,
    closed: Arc<AtomicBool>,
}

impl MemorySource {
    pub fn new<S: Into<String>>(id: S, fps: f64, frames: Vec<RawFrame>) -> Self {
        Self {
            id: id.into(),
            fps,
            total: frames.len() as u64,
            frames: frames.into(),
            position: 0,
            fail_at: None,
            hide_count: false,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn blank<S: Into<String>>(id: S, fps: f64, count: usize, width: i32, height: i32) -> Self {
        Self::new(id, fps, vec![RawFrame::blank(width, height); count])
    }

    /// Makes the read of frame `index` fail with `SourceRead`.
    pub fn fail_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Reports no frame count, like a live stream.
    pub fn without_frame_count(mut self) -> Self {
        self.hide_count = true;
        self
    }

    /// Flag raised once the source is closed; stays observable after the
    /// source has been moved into a run.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }
}

impl VideoSource for MemorySource {
    type Frame = RawFrame;

    fn id(&self) -> &str {
        &self.id
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_count(&self) -> Option<u64> {
        if self.hide_count {
            None
        } else {
            Some(self.total)
        }
    }

    fn read_frame(&mut self) -> Result<Option<RawFrame>, Error> {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(None);
        }

        if self.fail_at == Some(self.position) {
            return Err(Error::SourceRead {
                frame_index: self.position,
                reason: "simulated decoder failure".to_string(),
            });
        }

        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.position += 1;
        }

        Ok(frame)
    }

    fn close(&mut self) {
        self.frames.clear();
        self.closed.store(true, Ordering::SeqCst);
    }
}
