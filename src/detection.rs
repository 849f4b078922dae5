use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Identity of an observed entity within a single run.
///
/// `Unassigned` groups every observation the tracker could not associate
/// with a persistent id. It orders after all tracked ids.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Identity {
    Tracked(u32),
    Unassigned,
}

impl Identity {
    #[inline]
    pub fn is_tracked(&self) -> bool {
        matches!(self, Identity::Tracked(_))
    }

    #[inline]
    pub fn id(&self) -> Option<u32> {
        match self {
            Identity::Tracked(id) => Some(*id),
            Identity::Unassigned => None,
        }
    }
}

impl From<Option<u32>> for Identity {
    fn from(id: Option<u32>) -> Self {
        id.map_or(Identity::Unassigned, Identity::Tracked)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Tracked(id) => write!(f, "{}", id),
            Identity::Unassigned => f.write_str("unassigned"),
        }
    }
}

/// Box as reported by the detection capability.
/// Contains (x,y) of the center and (width,height) in pixels.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RawBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(rename = "p")]
    pub confidence: f32,
    #[serde(rename = "c")]
    pub class: String,
}

impl RawBox {
    pub fn xywh<S: Into<String>>(x: f32, y: f32, w: f32, h: f32, confidence: f32, class: S) -> Self {
        Self {
            x,
            y,
            w,
            h,
            confidence,
            class: class.into(),
        }
    }

    /// Builds a box from its left-top and right-bottom corners.
    pub fn ltrb<S: Into<String>>(
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
        confidence: f32,
        class: S,
    ) -> Self {
        let w = right - left;
        let h = bottom - top;

        Self::xywh(left + w / 2.0, top + h / 2.0, w, h, confidence, class)
    }

    #[inline(always)]
    pub fn xmin(&self) -> f32 {
        self.x - self.w / 2.
    }

    #[inline(always)]
    pub fn xmax(&self) -> f32 {
        self.x + self.w / 2.
    }

    #[inline(always)]
    pub fn ymin(&self) -> f32 {
        self.y - self.h / 2.
    }

    #[inline(always)]
    pub fn ymax(&self) -> f32 {
        self.y + self.h / 2.
    }
}

/// One response of the detection capability for a single frame.
///
/// `ids`, when present, runs parallel to `boxes`: the tracker associated
/// every box with a persistent id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDetections {
    pub boxes: Vec<RawBox>,
    pub ids: Option<Vec<u32>>,
}

impl RawDetections {
    pub fn untracked(boxes: Vec<RawBox>) -> Self {
        Self { boxes, ids: None }
    }

    pub fn tracked(boxes: Vec<RawBox>, ids: Vec<u32>) -> Self {
        Self {
            boxes,
            ids: Some(ids),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// A detected entity at one sample tick, in pixel space.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub confidence: f32,
    pub identity: Identity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unassigned_orders_after_every_tracked_id() {
        let mut ids = vec![
            Identity::Tracked(3),
            Identity::Unassigned,
            Identity::Tracked(1),
            Identity::Tracked(u32::MAX),
        ];
        ids.sort();

        assert_eq!(
            ids,
            vec![
                Identity::Tracked(1),
                Identity::Tracked(3),
                Identity::Tracked(u32::MAX),
                Identity::Unassigned,
            ]
        );
    }

    #[test]
    fn tracked_zero_is_not_unassigned() {
        assert_ne!(Identity::Tracked(0), Identity::Unassigned);
        assert_eq!(Identity::from(Some(0)), Identity::Tracked(0));
        assert_eq!(Identity::from(None), Identity::Unassigned);
    }

    #[test]
    fn ltrb_box_is_centered() {
        let b = RawBox::ltrb(10.0, 20.0, 30.0, 60.0, 0.5, "person");

        assert_eq!((b.x, b.y, b.w, b.h), (20.0, 40.0, 20.0, 40.0));
        assert_eq!((b.xmin(), b.xmax()), (10.0, 30.0));
        assert_eq!((b.ymin(), b.ymax()), (20.0, 60.0));
    }

    #[test]
    fn raw_box_uses_short_json_keys() {
        let json = r#"{"x":1.0,"y":2.0,"w":3.0,"h":4.0,"p":0.9,"c":"person"}"#;
        let b: RawBox = serde_json::from_str(json).unwrap();

        assert_eq!(b, RawBox::xywh(1.0, 2.0, 3.0, 4.0, 0.9, "person"));
    }
}
