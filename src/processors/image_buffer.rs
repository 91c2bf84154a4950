//! The owned raster type behind every pipeline image operation.
//!
//! An [`ImageBuffer`] carries interleaved 8-bit pixels (rows top-to-bottom,
//! pixels left-to-right) with 1 to 4 channels. Operations return fresh
//! buffers; nothing mutates in place. The resampler, the chamfer dilation,
//! and the connected-component extraction are written out explicitly because
//! the trained models expect their exact numerics.

use std::collections::VecDeque;

use rayon::prelude::*;

use crate::core::errors::{ImageProcessError, OcrError, OcrResult};
use crate::processors::geometry::TextRect;
use crate::processors::types::{DistanceNorm, PaddingOptions, ResizeTarget};

/// An 8-bit raster image with interleaved channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    channels: u32,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Creates a buffer from its parts, checking the length invariant.
    ///
    /// # Errors
    ///
    /// Returns an error if `data.len() != width * height * channels` or if
    /// `channels` is outside `1..=4`.
    pub fn new(width: u32, height: u32, channels: u32, data: Vec<u8>) -> OcrResult<Self> {
        if !(1..=4).contains(&channels) {
            return Err(OcrError::invalid_input(format!(
                "channel count must be in 1..=4, got {channels}"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(OcrError::invalid_input(format!(
                "pixel buffer length {} does not match {width}x{height}x{channels} (expected {expected})",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Creates a buffer from raw bytes, deriving the channel count.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions are zero or if the byte length is
    /// not an integer multiple of `width * height` in `1..=4`; the message
    /// names the computed (possibly fractional) channel count.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> OcrResult<Self> {
        let pixels = width as u64 * height as u64;
        if pixels == 0 {
            return Err(OcrError::invalid_input(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }
        let computed = data.len() as f64 / pixels as f64;
        if data.len() as u64 % pixels != 0 || !(1.0..=4.0).contains(&computed) {
            return Err(OcrError::invalid_input(format!(
                "data length {} over {width}x{height} pixels gives {computed} channels; expected an integer in 1..=4",
                data.len()
            )));
        }
        let channels = (data.len() as u64 / pixels) as u32;
        Self::new(width, height, channels, data)
    }

    fn from_parts(width: u32, height: u32, channels: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * channels as usize
        );
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of interleaved channels.
    #[inline]
    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// The underlying pixel bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Copies a rectangle out of the image.
    ///
    /// The rectangle must lie fully inside the source; the output keeps the
    /// source channel count.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Self, ImageProcessError> {
        if x as u64 + width as u64 > self.width as u64
            || y as u64 + height as u64 > self.height as u64
        {
            return Err(ImageProcessError::CropOutOfBounds {
                x,
                y,
                width,
                height,
                image_width: self.width,
                image_height: self.height,
            });
        }

        let ch = self.channels as usize;
        let src_stride = self.width as usize * ch;
        let row_bytes = width as usize * ch;
        let mut data = Vec::with_capacity(height as usize * row_bytes);
        for row in y..y + height {
            let start = row as usize * src_stride + x as usize * ch;
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        Ok(Self::from_parts(width, height, self.channels, data))
    }

    /// Resamples the image with a separable triangle (linear) filter.
    ///
    /// The vertical axis is filtered first, then the horizontal axis. For an
    /// axis with ratio `src/dst` the filter support is `max(ratio, 1)`;
    /// output coordinate `o` maps to input center `(o + 0.5)*ratio - 0.5`,
    /// taps inside `[floor(i - support), ceil(i + support))` are weighted
    /// `max(0, 1 - |k - i|/support)` and renormalized over the clipped
    /// window. Channels are filtered independently; intermediates stay in
    /// f32 and the final pass rounds to nearest, clamped to `[0, 255]`.
    pub fn resize(&self, target: ResizeTarget) -> Result<Self, ImageProcessError> {
        let (dst_w, dst_h) = target.resolve(self.width, self.height)?;
        if dst_w == 0 || dst_h == 0 {
            return Err(ImageProcessError::InvalidTargetSize);
        }

        let ch = self.channels as usize;
        let src_w = self.width as usize;
        let src_h = self.height as usize;
        let dst_w = dst_w as usize;
        let dst_h = dst_h as usize;

        // Vertical pass: src_h x src_w -> dst_h x src_w, f32 accumulators.
        let v_windows = triangle_windows(src_h, dst_h);
        let row_bytes = src_w * ch;
        let mut intermediate = vec![0.0f32; dst_h * row_bytes];
        intermediate
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(oy, out_row)| {
                let window = &v_windows[oy];
                for (tap, &weight) in window.weights.iter().enumerate() {
                    let src_row = (window.start + tap) * row_bytes;
                    let src = &self.data[src_row..src_row + row_bytes];
                    for (acc, &px) in out_row.iter_mut().zip(src) {
                        *acc += px as f32 * weight;
                    }
                }
            });

        // Horizontal pass: dst_h x src_w -> dst_h x dst_w, rounded to u8.
        let h_windows = triangle_windows(src_w, dst_w);
        let mut data = vec![0u8; dst_h * dst_w * ch];
        data.par_chunks_mut(dst_w * ch)
            .zip(intermediate.par_chunks(row_bytes))
            .for_each(|(out_row, src_row)| {
                for (ox, window) in h_windows.iter().enumerate() {
                    for c in 0..ch {
                        let mut acc = 0.0f32;
                        for (tap, &weight) in window.weights.iter().enumerate() {
                            acc += src_row[(window.start + tap) * ch + c] * weight;
                        }
                        out_row[ox * ch + c] = acc.round().clamp(0.0, 255.0) as u8;
                    }
                }
            });

        Ok(Self::from_parts(
            dst_w as u32,
            dst_h as u32,
            self.channels,
            data,
        ))
    }

    /// Pads the image onto a larger canvas.
    ///
    /// The output is always RGBA: the canvas is filled with the RGBA color
    /// from `options` (default transparent black) and the source is copied
    /// to `(left, top)`. Source channels beyond the canvas's four are never
    /// read; canvas channels the source does not supply keep the fill
    /// value.
    pub fn padding(&self, options: &PaddingOptions) -> Self {
        let (top, bottom, left, right) = options.resolve_sides();
        let color = options.fill_color();

        let new_w = (self.width + left + right) as usize;
        let new_h = (self.height + top + bottom) as usize;
        let mut data = Vec::with_capacity(new_w * new_h * 4);
        for _ in 0..new_w * new_h {
            data.extend_from_slice(&color);
        }

        let ch = self.channels as usize;
        let copy_channels = ch.min(4);
        let src_stride = self.width as usize * ch;
        for y in 0..self.height as usize {
            let src_row = y * src_stride;
            let dst_row = (y + top as usize) * new_w + left as usize;
            for x in 0..self.width as usize {
                let src = src_row + x * ch;
                let dst = (dst_row + x) * 4;
                data[dst..dst + copy_channels]
                    .copy_from_slice(&self.data[src..src + copy_channels]);
            }
        }

        Self::from_parts(new_w as u32, new_h as u32, 4, data)
    }

    /// Packs the image into a CHW f32 tensor of length `3 * H * W`.
    ///
    /// `out[c*H*W + h*W + w] = px[c] * norm[c] - mean[c] * norm[c]`, which
    /// equals `(px/255 - m)/s` when `mean = m*255` and `norm = 1/(s*255)`.
    /// Channels beyond the third (alpha) are ignored; sources with fewer
    /// than three channels replicate their last channel.
    pub fn tensor(&self, mean: &[f32; 3], norm: &[f32; 3]) -> Vec<f32> {
        let hw = self.width as usize * self.height as usize;
        let ch = self.channels as usize;
        let mut out = vec![0.0f32; 3 * hw];
        for c in 0..3 {
            let src_c = c.min(ch - 1);
            let scale = norm[c];
            let offset = mean[c] * norm[c];
            let plane = &mut out[c * hw..(c + 1) * hw];
            for (i, value) in plane.iter_mut().enumerate() {
                *value = self.data[i * ch + src_c] as f32 * scale - offset;
            }
        }
        out
    }

    /// Binarizes the image against `threshold` (conventionally 128).
    ///
    /// Only channel 0 is read. The output is single-channel with every pixel
    /// either 0 or 255 (`255` when the source value is strictly greater than
    /// the threshold).
    pub fn threshold(&self, threshold: u8) -> Self {
        let ch = self.channels as usize;
        let data: Vec<u8> = self
            .data
            .chunks_exact(ch)
            .map(|px| if px[0] > threshold { 255 } else { 0 })
            .collect();
        Self::from_parts(self.width, self.height, 1, data)
    }

    /// Dilates a binary image by Chebyshev radius `k`.
    ///
    /// Equivalent to a `(2k+1) x (2k+1)` square structuring element: every
    /// pixel whose L∞ distance to a foreground (255) pixel is at most `k`
    /// becomes 255. Distances come from a two-pass 8-neighbor chamfer sweep.
    /// Only single-channel input and [`DistanceNorm::LInf`] are accepted.
    pub fn dilate(&self, norm: DistanceNorm, k: u32) -> Result<Self, ImageProcessError> {
        if self.channels != 1 {
            return Err(ImageProcessError::NotGrayscale {
                channels: self.channels,
            });
        }
        if norm != DistanceNorm::LInf {
            return Err(ImageProcessError::UnsupportedNorm);
        }

        let w = self.width as usize;
        let h = self.height as usize;

        let mut dist: Vec<u32> = self
            .data
            .iter()
            .map(|&px| if px == 255 { 0 } else { u32::MAX })
            .collect();

        // Forward sweep: left, upper-left, up, upper-right.
        for y in 0..h {
            for x in 0..w {
                let idx = y * w + x;
                let mut d = dist[idx];
                if x > 0 {
                    d = d.min(dist[idx - 1].saturating_add(1));
                }
                if y > 0 {
                    let up = idx - w;
                    d = d.min(dist[up].saturating_add(1));
                    if x > 0 {
                        d = d.min(dist[up - 1].saturating_add(1));
                    }
                    if x + 1 < w {
                        d = d.min(dist[up + 1].saturating_add(1));
                    }
                }
                dist[idx] = d;
            }
        }

        // Reverse sweep: right, lower-right, down, lower-left.
        for y in (0..h).rev() {
            for x in (0..w).rev() {
                let idx = y * w + x;
                let mut d = dist[idx];
                if x + 1 < w {
                    d = d.min(dist[idx + 1].saturating_add(1));
                }
                if y + 1 < h {
                    let down = idx + w;
                    d = d.min(dist[down].saturating_add(1));
                    if x + 1 < w {
                        d = d.min(dist[down + 1].saturating_add(1));
                    }
                    if x > 0 {
                        d = d.min(dist[down - 1].saturating_add(1));
                    }
                }
                dist[idx] = d;
            }
        }

        let data: Vec<u8> = dist
            .into_iter()
            .map(|d| if d <= k { 255 } else { 0 })
            .collect();
        Ok(Self::from_parts(self.width, self.height, 1, data))
    }

    /// Extracts the bounding boxes of 8-connected foreground components.
    ///
    /// Any non-zero pixel (channel 0) is foreground. The scan is row-major,
    /// each unvisited foreground pixel seeds a BFS flood fill, and a
    /// component contributes its axis-aligned bounding box when its pixel
    /// count reaches `min_area`. Boxes come back in discovery order.
    pub fn contours(&self, min_area: u32) -> Vec<TextRect> {
        let w = self.width as usize;
        let h = self.height as usize;
        let ch = self.channels as usize;

        let mut visited = vec![false; w * h];
        let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
        let mut boxes = Vec::new();

        for y in 0..h {
            for x in 0..w {
                let idx = y * w + x;
                if visited[idx] || self.data[idx * ch] == 0 {
                    continue;
                }

                visited[idx] = true;
                queue.push_back((x, y));
                let (mut min_x, mut max_x, mut min_y, mut max_y) = (x, x, y, y);
                let mut area = 0u32;

                while let Some((cx, cy)) = queue.pop_front() {
                    area += 1;
                    min_x = min_x.min(cx);
                    max_x = max_x.max(cx);
                    min_y = min_y.min(cy);
                    max_y = max_y.max(cy);

                    for (dx, dy) in [
                        (-1i64, -1i64),
                        (0, -1),
                        (1, -1),
                        (-1, 0),
                        (1, 0),
                        (-1, 1),
                        (0, 1),
                        (1, 1),
                    ] {
                        let nx = cx as i64 + dx;
                        let ny = cy as i64 + dy;
                        if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                            continue;
                        }
                        let nidx = ny as usize * w + nx as usize;
                        if !visited[nidx] && self.data[nidx * ch] != 0 {
                            visited[nidx] = true;
                            queue.push_back((nx as usize, ny as usize));
                        }
                    }
                }

                if area >= min_area {
                    boxes.push(TextRect::new(
                        min_x as u32,
                        min_y as u32,
                        (max_x - min_x + 1) as u32,
                        (max_y - min_y + 1) as u32,
                    ));
                }
            }
        }

        boxes
    }
}

struct FilterWindow {
    start: usize,
    weights: Vec<f32>,
}

/// Precomputes the clipped, renormalized triangle taps for one axis.
fn triangle_windows(src: usize, dst: usize) -> Vec<FilterWindow> {
    let ratio = src as f32 / dst as f32;
    let support = ratio.max(1.0);

    (0..dst)
        .map(|o| {
            let center = (o as f32 + 0.5) * ratio - 0.5;
            let start = ((center - support).floor() as i64).max(0) as usize;
            let end = (((center + support).ceil() as i64).max(0) as usize).min(src);

            let mut weights: Vec<f32> = (start..end)
                .map(|k| (1.0 - (k as f32 - center).abs() / support).max(0.0))
                .collect();
            let sum: f32 = weights.iter().sum();
            if sum > 0.0 {
                for weight in &mut weights {
                    *weight /= sum;
                }
            }
            FilterWindow { start, weights }
        })
        .collect()
}
