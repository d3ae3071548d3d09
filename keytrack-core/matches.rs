use crate::error::{CoreError, CoreResult};
use std::borrow::Cow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const BINARY_DESCRIPTOR_BYTES: usize = 32;

/// 256-bit binary descriptor = 32 bytes
pub type BinaryDescriptor = [u8; BINARY_DESCRIPTOR_BYTES];

/// Correspondence between a source descriptor and a reference descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Match {
    pub source_index: usize,
    pub reference_index: usize,
    pub distance: f32,
}

impl Match {
    pub fn new(source_index: usize, reference_index: usize, distance: f32) -> Self {
        Self {
            source_index,
            reference_index,
            distance,
        }
    }
}

/// Descriptors for a keypoint sequence, one row per keypoint in keypoint order.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorSet {
    Binary(Vec<BinaryDescriptor>),
    Float { dim: usize, data: Vec<f32> },
}

impl DescriptorSet {
    /// Float descriptors stored row-major, `data.len()` must be a multiple of `dim`.
    pub fn float(dim: usize, data: Vec<f32>) -> CoreResult<Self> {
        if dim == 0 || data.len() % dim != 0 {
            return Err(CoreError::InvalidDescriptorLayout { dim, len: data.len() });
        }
        Ok(DescriptorSet::Float { dim, data })
    }

    pub fn len(&self) -> usize {
        match self {
            DescriptorSet::Binary(rows) => rows.len(),
            DescriptorSet::Float { dim, data } => {
                if *dim == 0 {
                    0
                } else {
                    data.len() / dim
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, DescriptorSet::Binary(_))
    }

    /// Values per descriptor (bytes for binary sets).
    pub fn dim(&self) -> usize {
        match self {
            DescriptorSet::Binary(_) => BINARY_DESCRIPTOR_BYTES,
            DescriptorSet::Float { dim, .. } => *dim,
        }
    }

    pub fn binary_row(&self, idx: usize) -> Option<&BinaryDescriptor> {
        match self {
            DescriptorSet::Binary(rows) => rows.get(idx),
            DescriptorSet::Float { .. } => None,
        }
    }

    pub fn float_row(&self, idx: usize) -> Option<&[f32]> {
        match self {
            DescriptorSet::Binary(_) => None,
            DescriptorSet::Float { dim, data } => {
                let start = idx.checked_mul(*dim)?;
                data.get(start..start + dim)
            }
        }
    }

    /// Row-major `f32` view of every descriptor; binary bytes are widened to
    /// their integer value.
    pub fn float_values(&self) -> Cow<'_, [f32]> {
        match self {
            DescriptorSet::Binary(rows) => {
                Cow::Owned(rows.iter().flatten().map(|&b| f32::from(b)).collect())
            }
            DescriptorSet::Float { data, .. } => Cow::Borrowed(data),
        }
    }
}
