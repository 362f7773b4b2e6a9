pub mod handle;
pub mod labels;
pub mod model;
pub mod preprocess;

pub use handle::ModelHandle;
pub use labels::{label_for, label_table, BILL_LABELS};
pub use model::{Classifier, ModelLoader, OnnxModelLoader};

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("model artifact not found (searched: {0})")]
    ModelNotFound(String),

    #[error("model load failed: {0}")]
    Load(String),

    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of classifying a single banknote image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    #[serde(rename = "result")]
    pub label: String,
    pub confidence: f32,
    #[serde(rename = "class")]
    pub class_index: usize,
}

impl Prediction {
    /// Picks the most probable class from a probability vector.
    pub fn from_probabilities(probabilities: &[f32]) -> Result<Self, ClassifierError> {
        let (class_index, &confidence) = probabilities
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_nan())
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .ok_or_else(|| {
                ClassifierError::Inference("model returned no usable probabilities".to_string())
            })?;

        Ok(Self {
            label: label_for(class_index).into_owned(),
            confidence: confidence.clamp(0.0, 1.0),
            class_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_selects_most_probable_class() {
        let mut probabilities = vec![0.01; 12];
        probabilities[5] = 0.93;

        let prediction = Prediction::from_probabilities(&probabilities).unwrap();

        assert_eq!(
            prediction,
            Prediction {
                label: "100 USD".to_string(),
                confidence: 0.93,
                class_index: 5,
            }
        );
    }

    #[test]
    fn ties_resolve_to_a_valid_class() {
        let prediction = Prediction::from_probabilities(&[0.5, 0.5]).unwrap();
        assert!(prediction.class_index < 2);
        assert_eq!(prediction.confidence, 0.5);
    }

    #[test]
    fn index_past_label_table_uses_fallback_label() {
        let mut probabilities = vec![0.0; 14];
        probabilities[13] = 0.8;

        let prediction = Prediction::from_probabilities(&probabilities).unwrap();
        assert_eq!(prediction.label, "unknown class 13");
        assert_eq!(prediction.class_index, 13);
    }

    #[test]
    fn confidence_stays_within_unit_interval() {
        let prediction = Prediction::from_probabilities(&[0.2, 1.7, -0.1]).unwrap();
        assert_eq!(prediction.class_index, 1);
        assert_eq!(prediction.confidence, 1.0);
    }

    #[test]
    fn nan_scores_are_ignored() {
        let prediction = Prediction::from_probabilities(&[f32::NAN, 0.3, 0.6]).unwrap();
        assert_eq!(prediction.class_index, 2);
    }

    #[test]
    fn empty_output_is_an_inference_error() {
        assert!(matches!(
            Prediction::from_probabilities(&[]),
            Err(ClassifierError::Inference(_))
        ));
        assert!(Prediction::from_probabilities(&[f32::NAN]).is_err());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let prediction = Prediction {
            label: "20 USD".to_string(),
            confidence: 0.5,
            class_index: 3,
        };

        let json = serde_json::to_value(&prediction).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"result": "20 USD", "confidence": 0.5, "class": 3})
        );
    }
}
