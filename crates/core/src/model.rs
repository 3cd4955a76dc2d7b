//! Black-box model boundary: a shape-preserving batch transform.
//!
//! The pipeline only ever sees [`PatchModel`]: normalized NHWC float
//! patches in, same-shaped patches out. [`OnnxModel`] is the production
//! implementation over `ort::Session`; tests substitute their own.

use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::{Array4, ArrayView4};
use ort::{session::Session, value::Tensor};
use tracing::debug;

use crate::backend::{build_session, SessionConfig};
use crate::geometry::Window;

/// A trained super-resolution network, treated solely as a batch transform.
///
/// `predict_batch` maps an `(n, height, width, c)` batch of `[0, 1]` floats
/// to a batch of identical shape. The window is fixed per model and drives
/// the tiling geometry.
pub trait PatchModel {
    fn window(&self) -> Window;

    fn predict_batch(&mut self, batch: ArrayView4<'_, f32>) -> Result<Array4<f32>>;
}

/// ONNX-backed [`PatchModel`] running on the configured execution provider.
pub struct OnnxModel {
    session: Session,
    input_name: String,
    output_name: String,
    window: Window,
}

impl OnnxModel {
    /// Load a model and read its IO metadata.
    ///
    /// The inference window is taken from the model's static input shape
    /// `(N, H, W, C)`. Models with dynamic spatial dims need
    /// `window_override`. Only float32 inputs are supported.
    pub fn load(config: &SessionConfig<'_>, window_override: Option<Window>) -> Result<Self> {
        let session = build_session(config)?;

        let input_name = session.inputs()[0].name().to_string();
        let output_name = session.outputs()[0].name().to_string();

        let (is_f32, dims) = match session.inputs()[0].dtype() {
            ort::value::ValueType::Tensor { ty, shape, .. } => (
                *ty == ort::tensor::TensorElementType::Float32,
                shape.iter().copied().collect::<Vec<i64>>(),
            ),
            _ => bail!("model input is not a tensor"),
        };
        if !is_f32 {
            bail!("model input must be float32 (fp16 models are not supported)");
        }

        let window = match window_override {
            Some(window) => window,
            None => window_from_input_dims(&dims)?,
        };

        debug!(
            model = %config.model_path.display(),
            %input_name,
            %output_name,
            window = %window,
            "Loaded ONNX super-resolution model"
        );

        Ok(Self {
            session,
            input_name,
            output_name,
            window,
        })
    }

    /// Convenience constructor over [`OnnxModel::load`].
    pub fn from_file(model_path: &Path) -> Result<Self> {
        let config = SessionConfig {
            model_path,
            backend: &Default::default(),
            trt_cache_dir: None,
        };
        Self::load(&config, None)
    }
}

/// Extract the inference window from a static NHWC input shape.
///
/// `-1` marks a dynamic/symbolic dimension; dynamic H or W means the model
/// cannot drive the tiling geometry on its own.
fn window_from_input_dims(dims: &[i64]) -> Result<Window> {
    if dims.len() != 4 {
        bail!(
            "expected 4-D NHWC model input, got {}-D shape {dims:?}",
            dims.len()
        );
    }
    let (h, w) = (dims[1], dims[2]);
    if h <= 0 || w <= 0 {
        bail!(
            "model input has dynamic spatial dims {dims:?} — a window override is required"
        );
    }
    Ok(Window::new(h as usize, w as usize))
}

impl PatchModel for OnnxModel {
    fn window(&self) -> Window {
        self.window
    }

    fn predict_batch(&mut self, batch: ArrayView4<'_, f32>) -> Result<Array4<f32>> {
        let input_shape = batch.dim();
        let input_tensor = Tensor::from_array(batch.to_owned())?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => &input_tensor])?;
        let output_view = outputs[self.output_name.as_str()].try_extract_array::<f32>()?;

        let output = output_view
            .to_owned()
            .into_dimensionality::<ndarray::Ix4>()
            .context("model output is not a 4-D batch")?;

        if output.dim() != input_shape {
            bail!(
                "model is not shape-preserving: input batch {:?}, output batch {:?}",
                input_shape,
                output.dim()
            );
        }

        Ok(output)
    }
}
