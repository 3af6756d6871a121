//! Signal preparation
//!
//! This module contains utilities that run before any spectrum is computed:
//! - Window normalization and the engine-owned synthesis/overlap windows
//! - Frame scheduling over the input signal

pub mod frames;
pub mod window;

pub use frames::{FramePosition, FrameScheduler};
