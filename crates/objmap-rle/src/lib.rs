//! Run-length codec for 8-bit voxel buffers.
//!
//! Analyze object maps store their label volume as a flat sequence of
//! `(count, value)` byte pairs. A run never exceeds 255 voxels and the
//! writer restarts runs at every slice boundary, so a decoder can stop
//! after any whole slice.

use thiserror::Error;

/// Longest run a single pair can describe.
pub const MAX_RUN: usize = u8::MAX as usize;

/// Size of one encoded pair in bytes.
pub const PAIR_SIZE: usize = 2;

/// Errors produced while decoding a run-length payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RleError {
    /// Payload ends in the middle of a pair
    #[error("RLE payload has a dangling byte at offset {0}")]
    DanglingByte(usize),

    /// Pair with a zero count
    #[error("RLE run of length zero at offset {0}")]
    ZeroRun(usize),

    /// Runs describe more voxels than the destination holds
    #[error("RLE payload overflows buffer of {capacity} voxels")]
    Overflow { capacity: usize },

    /// Runs ended before the destination was filled
    #[error("RLE payload decoded {decoded} of {expected} voxels")]
    Underflow { decoded: usize, expected: usize },
}

/// One decoded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub count: u8,
    pub value: u8,
}

impl Run {
    #[inline]
    pub fn len(&self) -> usize {
        self.count as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Encode `data` into `(count, value)` pairs.
///
/// `segment` is the slice length in voxels; runs are cut at every multiple
/// of it. Pass 0 to let runs span the whole buffer.
pub fn encode(data: &[u8], segment: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let segment = if segment == 0 { data.len().max(1) } else { segment };

    for chunk in data.chunks(segment) {
        let mut i = 0;
        while i < chunk.len() {
            let value = chunk[i];
            let mut count = 1;
            while i + count < chunk.len() && count < MAX_RUN && chunk[i + count] == value {
                count += 1;
            }
            out.push(count as u8);
            out.push(value);
            i += count;
        }
    }

    out
}

/// Iterator over the runs of an encoded payload, one pair per step.
pub struct Runs<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Runs<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Byte offset of the next pair.
    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }
}

impl Iterator for Runs<'_> {
    type Item = Result<Run, RleError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.data[self.pos..];
        match rest.len() {
            0 => None,
            1 => {
                let at = self.pos;
                self.pos = self.data.len();
                Some(Err(RleError::DanglingByte(at)))
            }
            _ => {
                let run = Run { count: rest[0], value: rest[1] };
                let at = self.pos;
                self.pos += PAIR_SIZE;
                if run.is_empty() {
                    Some(Err(RleError::ZeroRun(at)))
                } else {
                    Some(Ok(run))
                }
            }
        }
    }
}

/// Decode `data` into `out`, which must be filled exactly.
///
/// Returns the number of payload bytes consumed.
pub fn decode_into(data: &[u8], out: &mut [u8]) -> Result<usize, RleError> {
    let mut runs = Runs::new(data);
    let mut filled = 0;

    while filled < out.len() {
        let run = match runs.next() {
            Some(run) => run?,
            None => {
                return Err(RleError::Underflow { decoded: filled, expected: out.len() });
            }
        };
        let end = filled + run.len();
        if end > out.len() {
            return Err(RleError::Overflow { capacity: out.len() });
        }
        out[filled..end].fill(run.value);
        filled = end;
    }

    Ok(runs.offset())
}

/// Decode `data` into a freshly allocated buffer of `len` voxels.
pub fn decode(data: &[u8], len: usize) -> Result<Vec<u8>, RleError> {
    let mut out = vec![0u8; len];
    decode_into(data, &mut out)?;
    Ok(out)
}
