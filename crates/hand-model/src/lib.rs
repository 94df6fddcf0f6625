//! Logical hand model: joints and their calibration, mapped onto a transport.

pub mod joint;
pub mod model;

pub use joint::*;
pub use model::*;
