//! Safetensors weight loading.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use safetensors::SafeTensors;
use tracing::debug;

/// Reads a safetensors file into a `VarBuilder` on `device`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid safetensors, or
/// holds a tensor with an unsupported dtype.
pub fn load_safetensors(path: impl AsRef<Path>, device: &Device) -> Result<VarBuilder<'static>> {
    let path = path.as_ref();
    debug!("Loading weights from {}", path.display());

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read weights: {}", path.display()))?;
    let tensors = tensors_from_bytes(&bytes, device)
        .with_context(|| format!("Invalid weights file: {}", path.display()))?;

    debug!("Loaded {} tensors", tensors.len());
    Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
}

fn tensors_from_bytes(bytes: &[u8], device: &Device) -> Result<HashMap<String, Tensor>> {
    let file = SafeTensors::deserialize(bytes).context("Failed to parse safetensors header")?;

    let mut tensors = HashMap::new();
    for (name, view) in file.tensors() {
        let dtype = to_candle_dtype(view.dtype())?;
        let tensor = Tensor::from_raw_buffer(view.data(), dtype, view.shape(), device)
            .with_context(|| format!("Failed to build tensor '{name}'"))?;
        tensors.insert(name, tensor);
    }
    Ok(tensors)
}

fn to_candle_dtype(dtype: safetensors::Dtype) -> Result<DType> {
    use safetensors::Dtype as S;
    Ok(match dtype {
        S::F32 => DType::F32,
        S::F64 => DType::F64,
        S::F16 => DType::F16,
        S::BF16 => DType::BF16,
        S::I64 => DType::I64,
        S::U32 => DType::U32,
        S::U8 => DType::U8,
        other => bail!("Unsupported tensor dtype: {other:?}"),
    })
}
