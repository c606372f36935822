//! Utility types shared by every layer.
//!
//! - [`Dimensions`] - Volume shape
//! - [`Error`] / [`Result`] - Error handling

mod dimensions;
mod error;

pub use dimensions::*;
pub use error::*;
