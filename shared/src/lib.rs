//! Flyt Shared Library
//!
//! Parameter maps, control-parameter extraction and the error taxonomy
//! used by the relay.

pub mod control;
pub mod error;
pub mod params;

pub use control::ControlParams;
pub use error::{Error, Result};
pub use params::ParamMap;
