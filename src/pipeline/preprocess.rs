use image::imageops::{self, FilterType};
use ndarray::Array4;

use super::frame::Frame;
use crate::error::{EmotuneError, Result};

/// Side of the square input the classifier was trained on.
pub const INPUT_SIZE: u32 = 48;

/// Turn a face crop into the classifier input: grayscale, resized to
/// `INPUT_SIZE`², intensities scaled to [0, 1], laid out NHWC `[1, 48, 48, 1]`.
pub fn normalize(face_crop: &Frame) -> Result<Array4<f32>> {
    if face_crop.is_empty() {
        return Err(EmotuneError::InvalidImage("empty face crop".to_string()));
    }
    let gray = face_crop.to_gray()?;
    let resized = imageops::resize(&gray, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    let side = INPUT_SIZE as usize;
    let data: Vec<f32> = resized.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
    Array4::from_shape_vec((1, side, side, 1), data)
        .map_err(|e| EmotuneError::InvalidImage(format!("tensor shape: {}", e)))
}
