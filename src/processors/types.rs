//! Option types used by the image processing operations.

use crate::core::errors::ImageProcessError;

/// Distance metric for morphological dilation.
///
/// Only the Chebyshev (L-infinity) metric is supported; a radius-k L∞
/// dilation is equivalent to a `(2k+1) x (2k+1)` square structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceNorm {
    /// Manhattan distance. Declared for completeness; dilation rejects it.
    L1,
    /// Chebyshev distance, `max(|dx|, |dy|)`.
    LInf,
}

/// Target dimensions for a resize.
///
/// At least one of `width`/`height` must be set; a missing dimension is
/// derived from the source aspect ratio, rounded to the nearest pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResizeTarget {
    /// Target width in pixels.
    pub width: Option<u32>,
    /// Target height in pixels.
    pub height: Option<u32>,
}

impl ResizeTarget {
    /// Targets an exact width; the height follows the aspect ratio.
    pub fn width(width: u32) -> Self {
        Self {
            width: Some(width),
            height: None,
        }
    }

    /// Targets an exact height; the width follows the aspect ratio.
    pub fn height(height: u32) -> Self {
        Self {
            width: None,
            height: Some(height),
        }
    }

    /// Targets both dimensions exactly.
    pub fn exact(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    /// Resolves the target against a source size.
    ///
    /// The derived dimension is floored at one pixel so a degenerate source
    /// cannot request a zero-sized resize.
    pub(crate) fn resolve(self, src_w: u32, src_h: u32) -> Result<(u32, u32), ImageProcessError> {
        match (self.width, self.height) {
            (None, None) => Err(ImageProcessError::MissingTargetSize),
            (Some(width), Some(height)) => Ok((width, height)),
            (Some(width), None) => {
                let height = (src_h as f64 * width as f64 / src_w as f64).round() as u32;
                Ok((width, height.max(1)))
            }
            (None, Some(height)) => {
                let width = (src_w as f64 * height as f64 / src_h as f64).round() as u32;
                Ok((width.max(1), height))
            }
        }
    }
}

/// Options for [`ImageBuffer::padding`](crate::processors::ImageBuffer::padding).
///
/// Precedence: `padding` overrides `vertical`/`horizontal`, which override
/// the per-side fields. Unspecified sides default to 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaddingOptions {
    /// Uniform padding applied to all four sides.
    pub padding: Option<u32>,
    /// Padding applied to top and bottom.
    pub vertical: Option<u32>,
    /// Padding applied to left and right.
    pub horizontal: Option<u32>,
    /// Top padding.
    pub top: Option<u32>,
    /// Bottom padding.
    pub bottom: Option<u32>,
    /// Left padding.
    pub left: Option<u32>,
    /// Right padding.
    pub right: Option<u32>,
    /// RGBA fill color. `None` fills with transparent black.
    pub color: Option<[u8; 4]>,
}

impl PaddingOptions {
    /// Uniform padding with an explicit fill color.
    pub fn uniform(padding: u32, color: [u8; 4]) -> Self {
        Self {
            padding: Some(padding),
            color: Some(color),
            ..Self::default()
        }
    }

    /// Resolves the per-side amounts as `(top, bottom, left, right)`.
    pub(crate) fn resolve_sides(&self) -> (u32, u32, u32, u32) {
        if let Some(padding) = self.padding {
            return (padding, padding, padding, padding);
        }
        let top = self.vertical.or(self.top).unwrap_or(0);
        let bottom = self.vertical.or(self.bottom).unwrap_or(0);
        let left = self.horizontal.or(self.left).unwrap_or(0);
        let right = self.horizontal.or(self.right).unwrap_or(0);
        (top, bottom, left, right)
    }

    /// Resolves the fill color.
    pub(crate) fn fill_color(&self) -> [u8; 4] {
        self.color.unwrap_or([0, 0, 0, 0])
    }
}
