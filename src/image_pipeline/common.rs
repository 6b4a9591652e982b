//! Common utilities module
//!
//! This module contains shared utilities used across the image pipeline.

pub mod cfa;
pub mod error;

pub use cfa::{CfaPattern, Channel, ChannelMasks};
pub use error::{CineError, Result};
