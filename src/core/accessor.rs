use super::shared::FeatureId;

#[remain::sorted]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Err {
    #[error("Element {index} is not a valid feature ID: {value}")]
    InvalidFeatureId { index: usize, value: String },
}

/// A typed, flattened copy of the elements referenced by a glTF accessor.
/// Multi-component accessors are stored element-major, i.e. `[x0, y0, z0, x1, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessorArray {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

impl AccessorArray {
    pub fn len(&self) -> usize {
        match self {
            Self::I8(v) => v.len(),
            Self::U8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts every element to a feature ID. Negative, fractional and non-finite
    /// values are rejected rather than rounded onto a neighbouring ID.
    pub fn to_feature_ids(&self) -> Result<Vec<FeatureId>, Err> {
        match self {
            Self::I8(v) => signed_feature_ids(v.iter().map(|&x| x as i64)),
            Self::U8(v) => Ok(v.iter().map(|&x| x as FeatureId).collect()),
            Self::I16(v) => signed_feature_ids(v.iter().map(|&x| x as i64)),
            Self::U16(v) => Ok(v.iter().map(|&x| x as FeatureId).collect()),
            Self::U32(v) => Ok(v.clone()),
            Self::F32(v) => v.iter()
                .enumerate()
                .map(|(index, &x)| {
                    let valid = x.fract() == 0.0 && x >= 0.0 && x < FeatureId::MAX as f32;
                    if valid { Ok(x as FeatureId) } else { Err(Err::InvalidFeatureId { index, value: x.to_string() }) }
                })
                .collect(),
        }
    }

    /// Converts every element to `f32` without normalization.
    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            Self::I8(v) => v.iter().map(|&x| x as f32).collect(),
            Self::U8(v) => v.iter().map(|&x| x as f32).collect(),
            Self::I16(v) => v.iter().map(|&x| x as f32).collect(),
            Self::U16(v) => v.iter().map(|&x| x as f32).collect(),
            Self::U32(v) => v.iter().map(|&x| x as f32).collect(),
            Self::F32(v) => v.clone(),
        }
    }

    /// Converts every element to `f32`, mapping integer types onto `[0, 1]` / `[-1, 1]`
    /// as glTF prescribes for normalized accessors.
    pub fn to_normalized_f32(&self) -> Vec<f32> {
        match self {
            Self::I8(v) => v.iter().map(|&x| (x as f32 / 127.0).max(-1.0)).collect(),
            Self::U8(v) => v.iter().map(|&x| x as f32 / 255.0).collect(),
            Self::I16(v) => v.iter().map(|&x| (x as f32 / 32767.0).max(-1.0)).collect(),
            Self::U16(v) => v.iter().map(|&x| x as f32 / 65535.0).collect(),
            Self::U32(v) => v.iter().map(|&x| x as f32 / u32::MAX as f32).collect(),
            Self::F32(v) => v.clone(),
        }
    }
}

fn signed_feature_ids(values: impl Iterator<Item = i64>) -> Result<Vec<FeatureId>, Err> {
    values.enumerate()
        .map(|(index, x)| FeatureId::try_from(x).map_err(|_| Err::InvalidFeatureId { index, value: x.to_string() }))
        .collect()
}
