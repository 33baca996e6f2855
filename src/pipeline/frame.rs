use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};

use crate::error::{EmotuneError, Result};

// ITU-R BT.601 luma weights, the same conversion the classifier was trained on
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Raw interleaved 8-bit pixel buffer (RGB order for colour frames).
#[derive(Debug, Clone)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

/// Face bounding box in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Result<Self> {
        if !matches!(channels, 1 | 3 | 4) {
            return Err(EmotuneError::InvalidImage(format!(
                "unsupported channel count {}",
                channels
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(EmotuneError::InvalidImage(format!(
                "buffer holds {} bytes, {}x{}x{} needs {}",
                data.len(),
                width,
                height,
                channels,
                expected
            )));
        }
        Ok(Self { data, width, height, channels })
    }

    /// Decode an encoded image (JPEG, PNG, ...).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| EmotuneError::InvalidImage(format!("could not decode image: {}", e)))?;
        Ok(Self::from_image(&img))
    }

    /// Decode a webcam capture sent as base64, with or without a
    /// `data:image/...;base64,` prefix.
    pub fn from_data_url(s: &str) -> Result<Self> {
        let payload = s.split_once(',').map(|(_, p)| p).unwrap_or(s).trim();
        if payload.is_empty() {
            return Err(EmotuneError::InvalidImage("empty image payload".to_string()));
        }
        let bytes = general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| EmotuneError::InvalidImage(format!("invalid base64 payload: {}", e)))?;
        Self::decode(&bytes)
    }

    pub fn from_image(img: &DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        if img.color().has_color() {
            Self { data: img.to_rgb8().into_raw(), width, height, channels: 3 }
        } else {
            Self { data: img.to_luma8().into_raw(), width, height, channels: 1 }
        }
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn channels(&self) -> u8 { self.channels }
    pub fn data(&self) -> &[u8] { &self.data }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Single-channel copy of the frame. Alpha is ignored.
    pub fn to_gray(&self) -> Result<GrayImage> {
        let luma: Vec<u8> = if self.channels == 1 {
            self.data.clone()
        } else {
            self.data
                .chunks_exact(self.channels as usize)
                .map(|px| {
                    let v = LUMA_R * px[0] as f32 + LUMA_G * px[1] as f32 + LUMA_B * px[2] as f32;
                    v.round().clamp(0.0, 255.0) as u8
                })
                .collect()
        };
        GrayImage::from_raw(self.width, self.height, luma)
            .ok_or_else(|| EmotuneError::InvalidImage("frame buffer size mismatch".to_string()))
    }

    /// Copy out `region`, clamped to the frame bounds. A region lying fully
    /// outside the frame yields an empty frame.
    pub fn crop(&self, region: &FaceRegion) -> Frame {
        let x0 = region.x.min(self.width);
        let y0 = region.y.min(self.height);
        let x1 = region.x.saturating_add(region.width).min(self.width);
        let y1 = region.y.saturating_add(region.height).min(self.height);
        let (w, h) = (x1 - x0, y1 - y0);
        let c = self.channels as usize;
        let stride = self.width as usize * c;

        let mut data = Vec::with_capacity(w as usize * h as usize * c);
        for y in y0..y1 {
            let start = y as usize * stride + x0 as usize * c;
            data.extend_from_slice(&self.data[start..start + w as usize * c]);
        }
        Frame { data, width: w, height: h, channels: self.channels }
    }
}
