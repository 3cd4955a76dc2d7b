//! Inference orchestrator: split → model → merge for one image at a time.

use anyhow::{bail, Result};
use ndarray::{Array3, ArrayView3};
use tracing::debug;

use crate::geometry::Strides;
use crate::merger::merge;
use crate::model::PatchModel;
use crate::tiler::split;

/// One-image-in, one-image-out super-resolution pipeline.
///
/// Splits the input with the model's window and the configured strides,
/// runs the batch through the model, rescales predictions back to the
/// 0–255 range and merges them at the same positions. Synchronous and
/// stateless across calls: each call owns its own buffers.
pub struct Pipeline<M: PatchModel> {
    model: M,
    strides: Strides,
}

impl<M: PatchModel> Pipeline<M> {
    pub fn new(model: M, strides: Strides) -> Self {
        Self { model, strides }
    }

    pub fn strides(&self) -> Strides {
        self.strides
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run super-resolution over a full HWC u8 image.
    pub fn enhance(&mut self, image: ArrayView3<'_, u8>) -> Result<Array3<u8>> {
        let (h, w, c) = image.dim();
        let window = self.model.window();

        let batch = split(image, window, self.strides)?;
        let n = batch.dim().0;

        debug!(h, w, c, window = %window, patches = n, "Running tiled inference");

        let predictions = self.model.predict_batch(batch.view())?;
        if predictions.dim() != batch.dim() {
            bail!(
                "model broke the batch contract: sent {:?}, received {:?}",
                batch.dim(),
                predictions.dim()
            );
        }

        let rescaled = predictions.mapv(|v| v * 255.0);
        let merged = merge(rescaled.view(), (h, w, c), self.strides)?;
        Ok(merged)
    }
}
