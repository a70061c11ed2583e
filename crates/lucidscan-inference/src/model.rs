//! Scoring model contract and the bundled classifier head.

use std::collections::HashMap;
use std::sync::Arc;

use candle_core::{DType, Device, Tensor};

use lucidscan_core::{FeatureTensor, Modality};

use crate::error::{DetectError, DetectResult};

/// Shared reference to a loaded scoring model.
///
/// Handles are owned by the model registry; at most one live model
/// exists per modality and it is never mutated after loading.
pub type ModelHandle = Arc<dyn ScoringModel>;

/// A ready-to-invoke classifier for one modality.
///
/// The pipeline treats the model as opaque: it feeds the modality's
/// contract tensor in and reads a single raw probability in `[0, 1]`
/// back. Scaling to a percentage and clamping happen in the executor.
pub trait ScoringModel: Send + Sync {
    /// The modality this model scores.
    fn modality(&self) -> Modality;

    /// Score one feature tensor.
    ///
    /// # Errors
    /// Any failure of the underlying compute; the executor wraps it into
    /// an inference error.
    fn score(&self, tensor: &FeatureTensor) -> DetectResult<f32>;
}

/// Safetensors key for the pooled-feature weight vector.
pub const WEIGHT_KEY: &str = "head.weight";
/// Safetensors key for the scalar bias.
pub const BIAS_KEY: &str = "head.bias";

/// Bundled classifier head.
///
/// Deserialized from a per-modality safetensors blob holding a weight
/// vector `[K]` and a bias `[1]`. Scoring flattens the input to f32,
/// mean-pools it into `K` contiguous spans (so one head shape serves
/// every modality's tensor size), and applies the affine head with a
/// sigmoid.
#[derive(Debug)]
pub struct DetectorHead {
    modality: Modality,
    weight: Tensor,
    bias: Tensor,
    feature_dim: usize,
}

impl DetectorHead {
    /// Deserialize a head from safetensors bytes.
    ///
    /// # Errors
    /// Returns [`DetectError::TensorError`] when the blob cannot be
    /// parsed or does not carry the expected `head.weight` / `head.bias`
    /// tensors.
    pub fn from_bytes(modality: Modality, bytes: &[u8]) -> DetectResult<Self> {
        let mut tensors: HashMap<String, Tensor> =
            candle_core::safetensors::load_buffer(bytes, &Device::Cpu)
                .map_err(|e| DetectError::tensor("safetensors parse", e))?;

        let weight = take_tensor(&mut tensors, WEIGHT_KEY)?
            .to_dtype(DType::F32)
            .map_err(|e| DetectError::tensor("weight dtype", e))?;
        let feature_dim = match weight.dims() {
            [k] if *k > 0 => *k,
            dims => {
                return Err(DetectError::TensorError {
                    message: format!("{WEIGHT_KEY} must be a non-empty vector, got {dims:?}"),
                })
            }
        };

        let bias = take_tensor(&mut tensors, BIAS_KEY)?
            .to_dtype(DType::F32)
            .map_err(|e| DetectError::tensor("bias dtype", e))?;
        let bias = match bias.dims() {
            [1] => bias
                .squeeze(0)
                .map_err(|e| DetectError::tensor("bias squeeze", e))?,
            [] => bias,
            dims => {
                return Err(DetectError::TensorError {
                    message: format!("{BIAS_KEY} must be a scalar, got {dims:?}"),
                })
            }
        };

        Ok(Self {
            modality,
            weight,
            bias,
            feature_dim,
        })
    }

    /// Number of pooled feature spans the head consumes.
    #[must_use]
    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    /// Mean-pool a flat `[n]` tensor into `feature_dim` contiguous spans.
    fn pool(&self, flat: &Tensor, n: usize) -> DetectResult<Vec<f32>> {
        let k = self.feature_dim;
        let mut pooled = Vec::with_capacity(k);
        for span in 0..k {
            let start = span * n / k;
            let end = ((span + 1) * n / k).max(start + 1).min(n);
            if start >= n {
                pooled.push(0.0);
                continue;
            }
            let mean = flat
                .narrow(0, start, end - start)
                .map_err(|e| DetectError::tensor("pool narrow", e))?
                .mean_all()
                .map_err(|e| DetectError::tensor("pool mean", e))?
                .to_scalar::<f32>()
                .map_err(|e| DetectError::tensor("pool read", e))?;
            pooled.push(mean);
        }
        Ok(pooled)
    }
}

impl ScoringModel for DetectorHead {
    fn modality(&self) -> Modality {
        self.modality
    }

    fn score(&self, tensor: &FeatureTensor) -> DetectResult<f32> {
        let flat = tensor
            .inner()
            .to_dtype(DType::F32)
            .map_err(|e| DetectError::tensor("input dtype", e))?
            .flatten_all()
            .map_err(|e| DetectError::tensor("input flatten", e))?;
        let n = flat
            .dim(0)
            .map_err(|e| DetectError::tensor("input length", e))?;

        let pooled = Tensor::from_vec(self.pool(&flat, n)?, (self.feature_dim,), &Device::Cpu)
            .map_err(|e| DetectError::tensor("pooled build", e))?;
        let logit = (&pooled * &self.weight)
            .map_err(|e| DetectError::tensor("head weight", e))?
            .sum_all()
            .map_err(|e| DetectError::tensor("head sum", e))?;
        let logit = (&logit + &self.bias).map_err(|e| DetectError::tensor("head bias", e))?;

        candle_nn::ops::sigmoid(&logit)
            .map_err(|e| DetectError::tensor("head sigmoid", e))?
            .to_scalar::<f32>()
            .map_err(|e| DetectError::tensor("score read", e))
    }
}

fn take_tensor(tensors: &mut HashMap<String, Tensor>, key: &str) -> DetectResult<Tensor> {
    tensors.remove(key).ok_or_else(|| DetectError::TensorError {
        message: format!("safetensors blob is missing '{key}'"),
    })
}

/// Write a head's parameters as a safetensors file.
///
/// Bundled assets and the persistent cache share this format; the test
/// fixtures are generated through it as well.
///
/// # Errors
/// Returns [`DetectError::TensorError`] on serialization failure.
pub fn save_head(path: impl AsRef<std::path::Path>, weight: &[f32], bias: f32) -> DetectResult<()> {
    let weight = Tensor::from_vec(weight.to_vec(), (weight.len(),), &Device::Cpu)
        .map_err(|e| DetectError::tensor("weight build", e))?;
    let bias = Tensor::from_vec(vec![bias], (1,), &Device::Cpu)
        .map_err(|e| DetectError::tensor("bias build", e))?;

    let mut tensors = HashMap::new();
    tensors.insert(WEIGHT_KEY.to_string(), weight);
    tensors.insert(BIAS_KEY.to_string(), bias);
    candle_core::safetensors::save(&tensors, path)
        .map_err(|e| DetectError::tensor("safetensors save", e))
}
