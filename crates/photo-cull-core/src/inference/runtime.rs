//! Candle runtime helpers: device selection and weight loading.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use safetensors::SafeTensors;
use tracing::{debug, info};

/// Returns the best available device for inference.
///
/// GPU backends are only tried when compiled in (`metal` or `cuda`
/// features); otherwise, or when no GPU is usable, the CPU is used.
#[must_use]
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            info!("Using Metal device for face detection");
            return device;
        }
    }

    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("Using CUDA device for face detection");
            return device;
        }
    }

    info!("Using CPU for face detection");
    Device::Cpu
}

/// Reads a safetensors file into a `VarBuilder` on `device`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid safetensors,
/// or holds a tensor type candle cannot represent.
pub fn load_weights(path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    debug!("Loading weights from {}", path.display());

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read model file: {}", path.display()))?;
    let file = SafeTensors::deserialize(&bytes)
        .with_context(|| format!("Failed to parse safetensors: {}", path.display()))?;

    let tensors = file
        .tensors()
        .into_iter()
        .map(|(name, view)| {
            let dtype = candle_dtype(view.dtype())
                .with_context(|| format!("Tensor '{name}' has an unsupported type"))?;
            let tensor = Tensor::from_raw_buffer(view.data(), dtype, view.shape(), device)
                .with_context(|| format!("Failed to create tensor '{name}'"))?;
            Ok((name, tensor))
        })
        .collect::<Result<HashMap<String, Tensor>>>()?;

    debug!(tensors = tensors.len(), "Weights loaded");
    Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
}

fn candle_dtype(dtype: safetensors::Dtype) -> Result<DType> {
    use safetensors::Dtype as S;
    match dtype {
        S::F32 => Ok(DType::F32),
        S::F64 => Ok(DType::F64),
        S::F16 => Ok(DType::F16),
        S::BF16 => Ok(DType::BF16),
        S::I64 => Ok(DType::I64),
        S::U8 => Ok(DType::U8),
        S::U32 => Ok(DType::U32),
        other => anyhow::bail!("Unsupported dtype: {other:?}"),
    }
}

/// Logistic function.
#[inline]
#[must_use]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
