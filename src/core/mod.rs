//! Core layer - volumes and their metadata.
//!
//! This module provides:
//! - [`LabelVolume`] - One `u8` label per voxel
//! - [`ColorVolume`] / [`Rgba`] - Color projection of a label volume
//! - [`MetaData`] - Keyed metadata carried with a volume
//! - [`compression`] - Gzip wrapping of whole files

pub mod compression;
mod metadata;
mod volume;

pub use metadata::{MetaData, MetaValue, ENTRY_ARRAY_KEY};
pub use volume::{ColorVolume, LabelVolume, Rgba, BACKGROUND};
