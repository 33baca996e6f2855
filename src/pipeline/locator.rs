use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::frame::{FaceRegion, Frame};
use crate::error::{EmotuneError, Result};

/// Fixed detector configuration. Detection output is deterministic for a
/// given configuration and frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Image pyramid growth between scales.
    pub scale_factor: f32,
    /// Acceptance strictness; higher rejects more candidate windows.
    pub min_neighbors: u32,
    /// Smallest face side in pixels.
    pub min_face_size: u32,
    /// Sliding window step in pixels.
    pub window_step: u32,
}

pub const DETECTOR_CONFIG: DetectorConfig = DetectorConfig {
    scale_factor: 1.3,
    min_neighbors: 5,
    min_face_size: 20,
    window_step: 4,
};

impl DetectorConfig {
    fn pyramid_scale(&self) -> f32 {
        1.0 / self.scale_factor
    }

    fn score_threshold(&self) -> f64 {
        self.min_neighbors as f64 * 0.4
    }
}

/// Finds faces in a grayscale buffer.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceRegion>;
}

/// SeetaFace frontal detector backed by `rustface`.
pub struct SeetaDetector {
    model: rustface::Model,
    config: DetectorConfig,
}

impl SeetaDetector {
    pub fn load<P: AsRef<Path>>(path: P, config: DetectorConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            EmotuneError::ModelUnavailable(format!("face detector model {:?}: {}", path, e))
        })?;
        let model = rustface::read_model(std::io::BufReader::new(file)).map_err(|e| {
            EmotuneError::ModelUnavailable(format!("face detector model {:?} is corrupt: {}", path, e))
        })?;
        Ok(Self { model, config })
    }
}

impl FaceDetector for SeetaDetector {
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceRegion> {
        // Detectors carry per-run scratch state, so each call gets its own.
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.config.min_face_size);
        detector.set_score_thresh(self.config.score_threshold());
        detector.set_pyramid_scale_factor(self.config.pyramid_scale());
        detector.set_slide_window_step(self.config.window_step, self.config.window_step);

        detector
            .detect(&rustface::ImageData::new(gray, width, height))
            .iter()
            .filter_map(|face| {
                let bbox = face.bbox();
                // Boxes may hang off the top/left edge; shrink them to the frame.
                let x0 = bbox.x().max(0);
                let y0 = bbox.y().max(0);
                let x1 = (bbox.x() + bbox.width() as i32).max(0);
                let y1 = (bbox.y() + bbox.height() as i32).max(0);
                if x1 <= x0 || y1 <= y0 {
                    return None;
                }
                Some(FaceRegion {
                    x: x0 as u32,
                    y: y0 as u32,
                    width: (x1 - x0) as u32,
                    height: (y1 - y0) as u32,
                })
            })
            .collect()
    }
}

enum DetectorState {
    Ready(Arc<dyn FaceDetector>),
    Unavailable(String),
}

/// Locates faces in frames. Callers use only the first region in detector
/// output order; no ranking by size or score is applied.
pub struct FaceLocator {
    state: DetectorState,
}

impl FaceLocator {
    pub fn new(detector: Arc<dyn FaceDetector>) -> Self {
        Self { state: DetectorState::Ready(detector) }
    }

    /// Load the SeetaFace model. A missing or unreadable model leaves the
    /// locator unavailable instead of failing startup.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        match SeetaDetector::load(path.as_ref(), DETECTOR_CONFIG) {
            Ok(detector) => {
                info!("Face detector loaded from {:?}", path.as_ref());
                Self::new(Arc::new(detector))
            }
            Err(e) => {
                warn!("Face detector not loaded: {}", e);
                Self { state: DetectorState::Unavailable(e.to_string()) }
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, DetectorState::Ready(_))
    }

    /// All face regions in detector output order; never empty on success.
    pub fn detect(&self, frame: &Frame) -> Result<Vec<FaceRegion>> {
        let detector = match &self.state {
            DetectorState::Ready(d) => d,
            DetectorState::Unavailable(reason) => {
                return Err(EmotuneError::ModelUnavailable(reason.clone()))
            }
        };
        if frame.is_empty() {
            return Err(EmotuneError::InvalidImage("empty frame".to_string()));
        }
        let gray = frame.to_gray()?;
        let regions = detector.detect(gray.as_raw(), gray.width(), gray.height());
        if regions.is_empty() {
            return Err(EmotuneError::NoFaceDetected);
        }
        Ok(regions)
    }

    /// The region downstream stages consume: the detector's first.
    pub fn primary_face(&self, frame: &Frame) -> Result<FaceRegion> {
        self.detect(frame)?
            .into_iter()
            .next()
            .ok_or(EmotuneError::NoFaceDetected)
    }
}
