//! Resolution independent coordinates.
//!
//! Participants draw on canvases of different pixel sizes. Positions
//! travel over the wire as fractions of the sender's canvas and are
//! mapped back onto the receiver's canvas, so a stroke lands at the
//! same relative spot everywhere.

use serde::{Deserialize, Serialize};

/// A position on a concrete canvas, in device pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A position as a fraction of each canvas axis.
///
/// Values usually fall in `[0, 1]`; points captured outside the canvas
/// can escape that range and are passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormPoint {
    pub nx: f64,
    pub ny: f64,
}

impl NormPoint {
    pub fn new(nx: f64, ny: f64) -> Self {
        Self { nx, ny }
    }
}

/// Backing store dimensions of a drawing surface, in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scale up by a device pixel ratio, the way a backing store grows
    /// on high-DPI displays. Ratios below one count as one.
    pub fn scaled(self, ratio: u32) -> Self {
        let ratio = ratio.max(1);
        Self {
            width: self.width * ratio,
            height: self.height * ratio,
        }
    }

    /// Map a pixel position on this canvas to its wire form
    pub fn normalize(self, point: PixelPoint) -> NormPoint {
        NormPoint {
            nx: point.x / self.width as f64,
            ny: point.y / self.height as f64,
        }
    }

    /// Map a wire point back to pixels on this canvas
    pub fn denormalize(self, point: NormPoint) -> PixelPoint {
        PixelPoint {
            x: point.nx * self.width as f64,
            y: point.ny * self.height as f64,
        }
    }
}
