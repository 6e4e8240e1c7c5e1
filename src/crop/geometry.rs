//! Crop geometry: edge insets, clamped pixel bounds and the crop rectangle
//! descriptor handed to downstream nodes.

use crate::crop::aspect::AspectRatio;
use serde::{Deserialize, Serialize};
use std::io;

/// Largest inset the host's widgets accept.
pub const MAX_INSET: u32 = 8192;

/// Pixels to remove from each edge of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CropInsets {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl CropInsets {
    /// Create insets from the four edges.
    pub const fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// No crop: keep the whole image.
    pub const fn full() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Insets of a centred rectangle with the given aspect ratio.
    ///
    /// The rectangle spans 80% of whichever image dimension limits the
    /// ratio, and its corners are rounded to whole pixels. This is the
    /// rectangle the interactive UI proposes when the ratio lock is applied.
    pub fn centered_for_ratio(width: u32, height: u32, ratio: AspectRatio) -> Self {
        if width == 0 || height == 0 {
            return Self::full();
        }

        let (iw, ih) = (f64::from(width), f64::from(height));
        let r = ratio.value();
        let (nw, nh) = if iw / ih > r {
            let nh = ih * 0.8;
            (nh * r, nh)
        } else {
            let nw = iw * 0.8;
            (nw, nw / r)
        };

        let (nx, ny) = ((iw - nw) / 2.0, (ih - nh) / 2.0);
        let edge = |v: f64| v.round().max(0.0) as u32;
        let (x1, y1) = (edge(nx), edge(ny));
        let (x2, y2) = (edge(nx + nw), edge(ny + nh));

        Self::new(x1, width.saturating_sub(x2), y1, height.saturating_sub(y2))
    }
}

/// Clamped half-open pixel bounds of the retained region.
///
/// Always satisfies `left < right <= width` and `top < bottom <= height`
/// for the dimensions it was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropBounds {
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
}

impl CropBounds {
    /// Resolve insets against an image of `width` x `height` pixels.
    ///
    /// Insets larger than the image, or opposing insets that overlap, are
    /// clamped so the region keeps at least one row and one column.
    pub fn compute(width: usize, height: usize, insets: CropInsets) -> Self {
        let (left, right) = axis_span(width, insets.left, insets.right);
        let (top, bottom) = axis_span(height, insets.top, insets.bottom);
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Width of the retained region.
    pub fn width(&self) -> usize {
        self.right - self.left
    }

    /// Height of the retained region.
    pub fn height(&self) -> usize {
        self.bottom - self.top
    }

    /// Describe these bounds in original-image coordinates.
    ///
    /// Dimensions come from an `ImageBatch`, whose spatial axes fit in `u32`.
    pub fn to_rect(&self, orig_width: usize, orig_height: usize) -> CropRect {
        CropRect {
            x: self.left as u32,
            y: self.top as u32,
            width: self.width() as u32,
            height: self.height() as u32,
            orig_width: orig_width as u32,
            orig_height: orig_height as u32,
        }
    }
}

// start = clamp(near, 0, len-1); end = clamp(len - far, start+1, len)
fn axis_span(len: usize, near: u32, far: u32) -> (usize, usize) {
    let start = (near as usize).min(len.saturating_sub(1));
    let end = len.saturating_sub(far as usize).min(len).max(start + 1);
    (start, end)
}

/// The retained region's origin and size in original-image pixels.
///
/// Serialized with exactly these field names for downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub orig_width: u32,
    pub orig_height: u32,
}

impl CropRect {
    /// Serialize to the JSON text emitted on the `crop_json` output.
    ///
    /// Single line with `", "` and `": "` separators, the layout Python
    /// hosts produce with `json.dumps`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(out).map_err(<serde_json::Error as serde::ser::Error>::custom)
    }

    /// Parse a descriptor produced by [`CropRect::to_json`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check the descriptor invariants.
    pub fn is_valid(&self) -> bool {
        self.width >= 1
            && self.height >= 1
            && u64::from(self.x) + u64::from(self.width) <= u64::from(self.orig_width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(self.orig_height)
    }

    /// Insets that reproduce this rectangle on the original image.
    pub fn insets(&self) -> CropInsets {
        CropInsets {
            left: self.x,
            right: self.orig_width.saturating_sub(self.x.saturating_add(self.width)),
            top: self.y,
            bottom: self.orig_height.saturating_sub(self.y.saturating_add(self.height)),
        }
    }
}

/// Compact JSON with a space after each `,` and `:`.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}
