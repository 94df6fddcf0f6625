//! Transport plane for the dexhand bridge.
//!
//! This crate provides:
//! - [`Transport`] capability trait shared by all transport variants
//! - [`RealTransport`] running the cyclic EtherCAT exchange on a worker thread
//! - [`SimulatedTransport`] in-memory loopback for hardware-free operation
//! - [`ProcessImage`] byte tables mirroring the slaves' I/O registers

pub mod image;
pub mod real;
pub mod simulated;

pub use image::*;
pub use real::*;
pub use simulated::*;

use hand_common::{HandResult, LinkState};
use serde::{Deserialize, Serialize};

/// A network adapter usable for fieldbus communication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterInfo {
    /// Platform name of the adapter (e.g. "enp3s0").
    pub name: String,
    /// Human-readable description.
    pub description: String,
}

impl AdapterInfo {
    /// Create a new adapter entry.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A discovered fieldbus slave and the sizes of its I/O images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaveInfo {
    /// Human-readable slave name.
    pub name: String,
    /// Bytes of input data (slave → master).
    pub input_len: usize,
    /// Bytes of output data (master → slave).
    pub output_len: usize,
}

impl SlaveInfo {
    /// Create a new slave entry.
    pub fn new(name: impl Into<String>, input_len: usize, output_len: usize) -> Self {
        Self {
            name: name.into(),
            input_len,
            output_len,
        }
    }
}

/// Capability interface of a process-data transport.
///
/// The variant (real hardware or simulated loopback) is selected once at
/// construction; no method branches on a mode flag. Joint control routes
/// through [`set_output`](Transport::set_output) /
/// [`get_input`](Transport::get_input), which address the process image by
/// `(slave index, byte offset)`.
pub trait Transport: Send {
    /// Enumerate adapters this transport can open. Pure query.
    fn list_adapters(&self) -> Vec<AdapterInfo>;

    /// Open the named adapter and bring the link up.
    ///
    /// # Errors
    ///
    /// Returns [`hand_common::HandError::Connection`] if the adapter cannot
    /// be opened or no slaves are discovered on the bus, and
    /// [`hand_common::HandError::InvalidTransition`] when the link is
    /// already running.
    fn start(&mut self, adapter: &str) -> HandResult<()>;

    /// Tear the link down. Idempotent; when a cyclic worker exists it is
    /// signaled and joined before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`hand_common::HandError::Fieldbus`] if the cyclic worker
    /// cannot be joined cleanly.
    fn stop(&mut self) -> HandResult<()>;

    /// Stage one byte into the output image, visible to a subsequent
    /// exchange cycle. Coordinates outside the slave table are silently
    /// ignored.
    fn set_output(&mut self, slave: usize, channel: usize, value: u8);

    /// Read one byte from the most recently refreshed input image. Unknown
    /// coordinates read as 0; this never fails.
    fn get_input(&self, slave: usize, channel: usize) -> u8;

    /// Current link state.
    fn state(&self) -> LinkState;
}
