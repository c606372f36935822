//! Volume shape.
//!
//! Dimensions describe the extent of a label volume along each axis,
//! x fastest. Object maps carry up to four axes (x, y, z, volume).

use smallvec::SmallVec;

/// Highest rank an object map can describe.
pub const MAX_RANK: usize = 4;

/// Extent of a voxel volume.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dimensions {
    /// Size of each axis, x first.
    dims: SmallVec<[usize; MAX_RANK]>,
}

impl Dimensions {
    /// Create 1D dimensions.
    pub fn d1(size: usize) -> Self {
        Self { dims: smallvec::smallvec![size] }
    }

    /// Create 2D dimensions.
    pub fn d2(width: usize, height: usize) -> Self {
        Self { dims: smallvec::smallvec![width, height] }
    }

    /// Create 3D dimensions.
    pub fn d3(width: usize, height: usize, depth: usize) -> Self {
        Self { dims: smallvec::smallvec![width, height, depth] }
    }

    /// Create 4D dimensions (a stack of 3D volumes).
    pub fn d4(width: usize, height: usize, depth: usize, volumes: usize) -> Self {
        Self { dims: smallvec::smallvec![width, height, depth, volumes] }
    }

    /// Create from a slice of sizes.
    pub fn from_slice(sizes: &[usize]) -> Self {
        Self { dims: SmallVec::from_slice(sizes) }
    }

    /// Number of axes.
    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Size of one axis, `None` past the rank.
    pub fn size(&self, dim: usize) -> Option<usize> {
        self.dims.get(dim).copied()
    }

    /// Size of one axis, treating axes past the rank as 1.
    #[inline]
    pub fn extent(&self, dim: usize) -> usize {
        self.size(dim).unwrap_or(1)
    }

    /// All axis sizes.
    pub fn sizes(&self) -> &[usize] {
        &self.dims
    }

    /// Total number of voxels.
    pub fn num_voxels(&self) -> usize {
        self.dims.iter().product()
    }

    /// Total number of voxels, `None` if it overflows `usize`.
    pub fn checked_num_voxels(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n))
    }

    /// Voxels per x/y slice.
    pub fn slice_len(&self) -> usize {
        self.extent(0) * self.extent(1)
    }

    /// Linear offset of a voxel, or `None` if any coordinate is out of range.
    pub fn linear_index(&self, coords: &[usize]) -> Option<usize> {
        if coords.len() != self.rank() {
            return None;
        }
        let mut index = 0;
        let mut stride = 1;
        for (&c, &n) in coords.iter().zip(self.dims.iter()) {
            if c >= n {
                return None;
            }
            index += c * stride;
            stride *= n;
        }
        Some(index)
    }

    /// Coordinates of a linear offset.
    pub fn coords(&self, mut index: usize) -> SmallVec<[usize; MAX_RANK]> {
        let mut out = SmallVec::new();
        for &n in &self.dims {
            out.push(index % n.max(1));
            index /= n.max(1);
        }
        out
    }
}

/// Formats as `XxYxZ`.
impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut axes = self.dims.iter();
        if let Some(first) = axes.next() {
            write!(f, "{}", first)?;
        }
        for n in axes {
            write!(f, "x{}", n)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_shape() {
        let d = Dimensions::d2(256, 192);
        assert_eq!(d.rank(), 2);
        assert_eq!(d.size(0), Some(256));
        assert_eq!(d.size(2), None);
        assert_eq!(d.extent(2), 1);
        assert_eq!(d.num_voxels(), 256 * 192);
        assert_eq!(d.slice_len(), 256 * 192);
        assert_eq!(d.to_string(), "256x192");
    }

    #[test]
    fn test_4d() {
        let d = Dimensions::d4(50, 20, 20, 3);
        assert_eq!(d.rank(), 4);
        assert_eq!(d.to_string(), "50x20x20x3");
        assert_eq!(d.num_voxels(), 60_000);
        assert_eq!(d.slice_len(), 1000);
        assert_eq!(d.checked_num_voxels(), Some(60_000));
    }

    #[test]
    fn test_checked_num_voxels_overflow() {
        let huge = i32::MAX as usize;
        let d = Dimensions::d4(huge, huge, huge, huge);
        assert_eq!(d.checked_num_voxels(), None);
    }

    #[test]
    fn test_index_roundtrip() {
        let d = Dimensions::d3(4, 3, 2);
        let idx = d.linear_index(&[1, 2, 1]).unwrap();
        assert_eq!(idx, 1 + 2 * 4 + 12);
        assert_eq!(d.coords(idx).as_slice(), &[1, 2, 1]);
        assert_eq!(d.linear_index(&[4, 0, 0]), None);
        assert_eq!(d.linear_index(&[0, 0]), None);
    }
}
