//! Voxel volumes.
//!
//! [`LabelVolume`] holds one `u8` label per voxel, x fastest; label 0 is
//! background. [`ColorVolume`] is the RGBA projection produced by a label
//! map.

use bytemuck::{Pod, Zeroable};
use smallvec::SmallVec;

use super::MetaData;
use crate::util::{Dimensions, Error, Result, MAX_RANK};

/// Label value reserved for voxels that belong to no object.
pub const BACKGROUND: u8 = 0;

/// Label volume with spacing and a metadata dictionary.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelVolume {
    dims: Dimensions,
    spacing: SmallVec<[f32; MAX_RANK]>,
    data: Vec<u8>,
    metadata: MetaData,
}

impl LabelVolume {
    /// Create a volume filled with background.
    pub fn new(dims: Dimensions) -> Self {
        Self::filled(dims, BACKGROUND)
    }

    /// Create a volume with every voxel set to `value`.
    pub fn filled(dims: Dimensions, value: u8) -> Self {
        let len = dims.num_voxels();
        let spacing = SmallVec::from_elem(1.0, dims.rank());
        Self { dims, spacing, data: vec![value; len], metadata: MetaData::new() }
    }

    /// Wrap an existing voxel buffer.
    pub fn from_vec(dims: Dimensions, data: Vec<u8>) -> Result<Self> {
        if dims.rank() > MAX_RANK {
            return Err(Error::DimensionMismatch(format!(
                "{} has more than {} axes",
                dims, MAX_RANK
            )));
        }
        if data.len() != dims.num_voxels() {
            return Err(Error::DimensionMismatch(format!(
                "{} voxels for dimensions {}",
                data.len(),
                dims
            )));
        }
        let spacing = SmallVec::from_elem(1.0, dims.rank());
        Ok(Self { dims, spacing, data, metadata: MetaData::new() })
    }

    /// A background-filled volume with the same shape and spacing.
    pub fn blank_like(&self) -> Self {
        Self {
            dims: self.dims.clone(),
            spacing: self.spacing.clone(),
            data: vec![BACKGROUND; self.data.len()],
            metadata: MetaData::new(),
        }
    }

    #[inline]
    pub fn dims(&self) -> &Dimensions {
        &self.dims
    }

    /// Voxel spacing per axis.
    pub fn spacing(&self) -> &[f32] {
        &self.spacing
    }

    pub fn set_spacing(&mut self, spacing: &[f32]) -> Result<()> {
        if spacing.len() != self.dims.rank() {
            return Err(Error::DimensionMismatch(format!(
                "{} spacing values for rank {}",
                spacing.len(),
                self.dims.rank()
            )));
        }
        self.spacing = SmallVec::from_slice(spacing);
        Ok(())
    }

    /// Number of voxels.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Label at the given coordinates.
    pub fn get(&self, coords: &[usize]) -> Option<u8> {
        self.dims.linear_index(coords).map(|i| self.data[i])
    }

    /// Set the label at the given coordinates.
    pub fn set(&mut self, coords: &[usize], label: u8) -> Result<()> {
        let i = self.dims.linear_index(coords).ok_or_else(|| {
            Error::DimensionMismatch(format!("coordinates {:?} outside {}", coords, self.dims))
        })?;
        self.data[i] = label;
        Ok(())
    }

    #[inline]
    pub fn metadata(&self) -> &MetaData {
        &self.metadata
    }

    #[inline]
    pub fn metadata_mut(&mut self) -> &mut MetaData {
        &mut self.metadata
    }

    /// Distinct nonzero labels in the order they are first met.
    pub fn distinct_labels(&self) -> Vec<u8> {
        let mut seen = [false; 256];
        let mut out = Vec::new();
        for &v in &self.data {
            if v != BACKGROUND && !seen[v as usize] {
                seen[v as usize] = true;
                out.push(v);
            }
        }
        out
    }

    /// Number of voxels carrying `label`.
    pub fn count(&self, label: u8) -> usize {
        self.data.iter().filter(|&&v| v == label).count()
    }

    /// Largest label present, 0 for an all-background volume.
    pub fn max_label(&self) -> u8 {
        self.data.iter().copied().max().unwrap_or(BACKGROUND)
    }
}

/// One color pixel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0 };

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Fully materialized color volume.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorVolume {
    dims: Dimensions,
    data: Vec<Rgba>,
}

impl ColorVolume {
    pub fn new(dims: Dimensions, data: Vec<Rgba>) -> Result<Self> {
        if data.len() != dims.num_voxels() {
            return Err(Error::DimensionMismatch(format!(
                "{} pixels for dimensions {}",
                data.len(),
                dims
            )));
        }
        Ok(Self { dims, data })
    }

    /// Map a label volume through a 256-entry lookup table.
    pub fn from_labels(labels: &LabelVolume, lut: &[Rgba; 256]) -> Self {
        let data = labels.data().iter().map(|&v| lut[v as usize]).collect();
        Self { dims: labels.dims().clone(), data }
    }

    #[inline]
    pub fn dims(&self) -> &Dimensions {
        &self.dims
    }

    #[inline]
    pub fn pixels(&self) -> &[Rgba] {
        &self.data
    }

    /// Pixel at the given coordinates.
    pub fn get(&self, coords: &[usize]) -> Option<Rgba> {
        self.dims.linear_index(coords).map(|i| self.data[i])
    }

    /// Interleaved RGBA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}
