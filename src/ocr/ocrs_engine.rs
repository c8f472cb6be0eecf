//! Pure-Rust recognizer using the `ocrs` engine (feature `ocrs`).
//!
//! Needs the detection and recognition models on disk, by default in
//! `$XDG_CACHE_HOME/ocrs` (or `~/.cache/ocrs`), where `ocrs-cli` stores
//! them after its first run.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;

use super::{RecognitionMode, Recognizer};
use crate::error::{Error, Result};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Model locations for [`OcrsRecognizer`].
#[derive(Debug, Clone)]
pub struct OcrsConfig {
    /// Text-detection model (`.rten`)
    pub detection_model_path: PathBuf,
    /// Text-recognition model (`.rten`)
    pub recognition_model_path: PathBuf,
}

impl Default for OcrsConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrsConfig {
    /// Expect both models inside `dir` under their standard file names.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(Error::RecognitionFailure(format!(
                    "OCR model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Recognizer running the `ocrs` neural engine in-process.
///
/// `ocrs` has no segmentation or language switches, so the
/// [`RecognitionMode`] is ignored.
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Load both models and build the engine.
    pub fn new(config: OcrsConfig) -> Result<Self> {
        config.validate()?;

        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            Error::RecognitionFailure(format!(
                "failed to load detection model from {}: {}",
                config.detection_model_path.display(),
                err
            ))
        })?;
        let recognition_model = Model::load_file(&config.recognition_model_path).map_err(|err| {
            Error::RecognitionFailure(format!(
                "failed to load recognition model from {}: {}",
                config.recognition_model_path.display(),
                err
            ))
        })?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| Error::RecognitionFailure(format!("failed to initialise OCR engine: {}", err)))?;

        log::info!("ocrs engine initialised");
        Ok(Self { engine })
    }

    /// Load models from the default cache directory.
    pub fn with_defaults() -> Result<Self> {
        Self::new(OcrsConfig::default())
    }
}

impl Recognizer for OcrsRecognizer {
    fn name(&self) -> &str {
        "ocrs"
    }

    fn recognize(&self, image: &DynamicImage, _mode: &RecognitionMode) -> Result<String> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            Error::RecognitionFailure(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| Error::RecognitionFailure(format!("OCR preprocessing failed: {}", err)))?;

        self.engine
            .get_text(&input)
            .map_err(|err| Error::RecognitionFailure(format!("OCR text recognition failed: {}", err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_dir() {
        let config = OcrsConfig::from_dir("/tmp/models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/tmp/models/text-detection.rten")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/tmp/models/text-recognition.rten")
        );
    }

    #[test]
    fn test_missing_models() {
        let result = OcrsRecognizer::new(OcrsConfig::from_dir("/nonexistent/ocr-models"));
        assert!(matches!(result, Err(Error::RecognitionFailure(_))));
    }
}
