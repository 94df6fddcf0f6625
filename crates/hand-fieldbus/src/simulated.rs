//! Simulated transport: in-memory loopback with no plant dynamics.

use std::collections::HashMap;

use hand_common::{HandResult, LinkState};
use tracing::debug;

use crate::{AdapterInfo, Transport};

/// Loopback transport for running the bridge without hardware.
///
/// Outputs staged with [`Transport::set_output`] echo straight back through
/// [`Transport::get_input`] for the same coordinate, with no delay and no
/// actuator model. There is no cyclic thread; `start()` is immediately
/// running. The simulator's job is to let the rest of the system operate,
/// not to model motion.
#[derive(Debug, Default)]
pub struct SimulatedTransport {
    adapter: Option<String>,
    state: LinkState,
    /// Open-ended cell map: any `(slave, channel)` coordinate is accepted.
    cells: HashMap<(usize, usize), u8>,
}

impl SimulatedTransport {
    /// Create a new loopback transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the adapter the link was started on, if any.
    #[must_use]
    pub fn adapter(&self) -> Option<&str> {
        self.adapter.as_deref()
    }
}

impl Transport for SimulatedTransport {
    fn list_adapters(&self) -> Vec<AdapterInfo> {
        vec![AdapterInfo::new("sim", "Simulated Adapter")]
    }

    fn start(&mut self, adapter: &str) -> HandResult<()> {
        self.state.transition_to(LinkState::Connecting)?;
        self.state.transition_to(LinkState::Running)?;
        self.adapter = Some(adapter.to_string());
        debug!(adapter, "Simulated link up");
        Ok(())
    }

    fn stop(&mut self) -> HandResult<()> {
        if self.state == LinkState::Running {
            self.state.transition_to(LinkState::Stopped)?;
            debug!("Simulated link stopped");
        }
        Ok(())
    }

    fn set_output(&mut self, slave: usize, channel: usize, value: u8) {
        self.cells.insert((slave, channel), value);
    }

    fn get_input(&self, slave: usize, channel: usize) -> u8 {
        self.cells.get(&(slave, channel)).copied().unwrap_or(0)
    }

    fn state(&self) -> LinkState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_synthetic_adapter() {
        let transport = SimulatedTransport::new();
        let adapters = transport.list_adapters();
        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0].name, "sim");
    }

    #[test]
    fn test_loopback() {
        let mut transport = SimulatedTransport::new();
        transport.start("sim").unwrap();

        transport.set_output(0, 2, 77);
        assert_eq!(transport.get_input(0, 2), 77);
    }

    #[test]
    fn test_unwritten_coordinate_reads_zero() {
        let transport = SimulatedTransport::new();
        assert_eq!(transport.get_input(3, 9), 0);
    }

    #[test]
    fn test_start_records_adapter_and_runs_immediately() {
        let mut transport = SimulatedTransport::new();
        assert_eq!(transport.state(), LinkState::Disconnected);

        transport.start("sim").unwrap();
        assert_eq!(transport.state(), LinkState::Running);
        assert_eq!(transport.adapter(), Some("sim"));
    }

    #[test]
    fn test_double_stop_is_idempotent() {
        let mut transport = SimulatedTransport::new();
        transport.start("sim").unwrap();

        transport.stop().unwrap();
        transport.stop().unwrap();
        assert_eq!(transport.state(), LinkState::Stopped);
    }

    #[test]
    fn test_restart_keeps_cells() {
        let mut transport = SimulatedTransport::new();
        transport.start("sim").unwrap();
        transport.set_output(1, 1, 42);
        transport.stop().unwrap();

        transport.start("sim").unwrap();
        assert_eq!(transport.get_input(1, 1), 42);
    }
}
