use std::path::{Path, PathBuf};
use std::sync::Arc;

use tract_onnx::prelude::tract_ndarray::Array4;
use tract_onnx::prelude::*;
use tract_onnx::tract_hir::internal::DimLike;

use super::ClassifierError;

/// A loaded image classifier producing one probability per class.
pub trait Classifier: Send + Sync {
    fn input_shape(&self) -> &[usize];

    fn output_shape(&self) -> &[usize];

    fn predict(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError>;
}

/// Produces a classifier on demand. Called from the blocking thread pool.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<Arc<dyn Classifier>, ClassifierError>;
}

pub struct OnnxModelLoader {
    candidates: Vec<PathBuf>,
    image_size: u32,
}

impl OnnxModelLoader {
    pub fn new(candidates: Vec<PathBuf>, image_size: u32) -> Self {
        Self {
            candidates,
            image_size,
        }
    }

    /// First candidate that exists on disk.
    pub fn resolve(&self) -> Result<&Path, ClassifierError> {
        for candidate in &self.candidates {
            if candidate.is_file() {
                return Ok(candidate);
            }
            tracing::debug!("Model not found at {}", candidate.display());
        }

        let searched = self
            .candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(ClassifierError::ModelNotFound(searched))
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self) -> Result<Arc<dyn Classifier>, ClassifierError> {
        let path = self.resolve()?;
        tracing::info!("Loading model from {}", path.display());

        let classifier = OnnxClassifier::load(path, self.image_size)?;
        tracing::info!(
            "Model loaded: input {:?}, output {:?}",
            classifier.input_shape,
            classifier.output_shape
        );
        Ok(Arc::new(classifier))
    }
}

pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
    input_shape: Vec<usize>,
    output_shape: Vec<usize>,
}

impl OnnxClassifier {
    /// Loads an ONNX graph expecting a single NHWC `f32` image batch.
    pub fn load(path: &Path, image_size: u32) -> Result<Self, ClassifierError> {
        let side = image_size as usize;
        let input_shape = vec![1, side, side, 3];
        let load_err = |e: TractError| ClassifierError::Load(format!("{}: {}", path.display(), e));

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| {
                model.with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, side, side, 3)),
                )
            })
            .and_then(|model| model.into_optimized())
            .map_err(load_err)?;

        let output_shape = model
            .output_fact(0)
            .and_then(|fact| {
                fact.shape
                    .iter()
                    .map(|dim| dim.to_usize())
                    .collect::<TractResult<Vec<_>>>()
            })
            .map_err(load_err)?;

        let plan = model.into_runnable().map_err(load_err)?;

        Ok(Self {
            plan,
            input_shape,
            output_shape,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    fn output_shape(&self) -> &[usize] {
        &self.output_shape
    }

    fn predict(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        if input.shape() != self.input_shape.as_slice() {
            return Err(ClassifierError::Inference(format!(
                "expected input shape {:?}, got {:?}",
                self.input_shape,
                input.shape()
            )));
        }

        let outputs = self
            .plan
            .run(tvec!(input.into_tensor().into()))
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let scores = outputs
            .first()
            .ok_or_else(|| ClassifierError::Inference("model produced no output".to_string()))?
            .to_array_view::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        Ok(scores.iter().copied().collect())
    }
}
