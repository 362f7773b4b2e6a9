use std::sync::Arc;

use tokio::sync::OnceCell;

use super::{Classifier, ClassifierError, ModelLoader};

/// Process-wide classifier slot.
///
/// Loading is single-flight: concurrent callers wait on the one in-progress
/// load. A failed load leaves the slot empty, so the next caller retries.
/// The load runs in its own task, so a caller that goes away mid-load does not
/// discard the result.
pub struct ModelHandle {
    cell: Arc<OnceCell<Arc<dyn Classifier>>>,
    loader: Arc<dyn ModelLoader>,
}

impl ModelHandle {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
            loader,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// The classifier if it has already been loaded. Never triggers a load.
    pub fn get(&self) -> Option<Arc<dyn Classifier>> {
        self.cell.get().cloned()
    }

    pub async fn get_or_load(&self) -> Result<Arc<dyn Classifier>, ClassifierError> {
        if let Some(classifier) = self.cell.get() {
            return Ok(classifier.clone());
        }

        let cell = self.cell.clone();
        let loader = self.loader.clone();
        let init = tokio::spawn(async move {
            let classifier = cell
                .get_or_try_init(|| async move {
                    tokio::task::spawn_blocking(move || loader.load())
                        .await
                        .map_err(|e| ClassifierError::Load(format!("loader task failed: {}", e)))?
                })
                .await?;
            Ok::<_, ClassifierError>(classifier.clone())
        });

        init.await
            .map_err(|e| ClassifierError::Load(format!("loader task failed: {}", e)))?
    }
}
