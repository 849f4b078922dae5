use log::{info, warn};
use opencv::{core::Mat, prelude::*, videoio};

use crate::error::Error;
use crate::frame::{FrameGeometry, VideoSource};

impl FrameGeometry for Mat {
    #[inline]
    fn dims(&self) -> (i32, i32) {
        (self.cols(), self.rows())
    }
}

/// Video file or stream decoded through `videoio::VideoCapture`.
pub struct OpenCvSource {
    id: String,
    cap: Option<videoio::VideoCapture>,
    fps: f64,
    frame_count: Option<u64>,
    position: u64,
}

impl OpenCvSource {
    pub fn open(path: &str) -> Result<Self, Error> {
        let open_err = |reason: String| Error::SourceOpen {
            source_id: path.to_string(),
            reason,
        };

        let cap = videoio::VideoCapture::from_file(path, videoio::CAP_ANY)
            .map_err(|err| open_err(err.to_string()))?;

        let opened = videoio::VideoCapture::is_opened(&cap).map_err(|err| open_err(err.to_string()))?;
        if !opened {
            return Err(open_err("capture is not opened".to_string()));
        }

        let prop = |id: i32| cap.get(id).map_err(|err| open_err(err.to_string()));

        let fps = prop(videoio::CAP_PROP_FPS)?;
        let total = prop(videoio::CAP_PROP_FRAME_COUNT)?;
        let width = prop(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = prop(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;

        info!("video {}: {}x{} {} frames @ {} fps", path, width, height, total, fps);

        Ok(Self {
            id: path.to_string(),
            cap: Some(cap),
            fps,
            frame_count: if total > 0.0 { Some(total as u64) } else { None },
            position: 0,
        })
    }
}

impl VideoSource for OpenCvSource {
    type Frame = Mat;

    fn id(&self) -> &str {
        &self.id
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }

    fn read_frame(&mut self) -> Result<Option<Mat>, Error> {
        let cap = match self.cap.as_mut() {
            Some(cap) => cap,
            None => return Ok(None),
        };

        let mut frame = Mat::default();
        let grabbed = cap.read(&mut frame).map_err(|err| Error::SourceRead {
            frame_index: self.position,
            reason: err.to_string(),
        })?;

        if !grabbed || frame.rows() == 0 || frame.cols() == 0 {
            return Ok(None);
        }

        self.position += 1;

        Ok(Some(frame))
    }

    fn close(&mut self) {
        if let Some(mut cap) = self.cap.take() {
            if let Err(err) = cap.release() {
                warn!("{}: release failed: {}", self.id, err);
            }
        }
    }
}

impl Drop for OpenCvSource {
    fn drop(&mut self) {
        self.close();
    }
}
