//! Real transport: cyclic exchange over a pluggable wire port.
//!
//! [`RealTransport`] owns the shared process image and a [`FieldbusPort`].
//! `start()` opens the named adapter, scans the bus, sizes the image from the
//! discovered slave table, and moves the port into a dedicated worker thread
//! running the push-outputs/pull-inputs round-trip. `stop()` signals the
//! worker, joins it, and recovers the closed port so a later `start()` can
//! reconnect. The SOEM-backed port lives behind the `soem` feature
//! (Linux only).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use hand_common::{HandError, HandResult, LinkState};
use tracing::{info, warn};

use crate::image::{CycleSnapshot, CycleStats, ProcessImage, SharedImage};
use crate::{AdapterInfo, SlaveInfo, Transport};

/// Wire-level port underneath the real transport.
///
/// Implementations carry the actual EtherCAT protocol (SOEM) or a test
/// double; the transport logic above them is identical. The port is moved
/// into the cyclic worker while the link is running.
pub trait FieldbusPort: Send {
    /// Enumerate adapters this port could open. Pure query.
    fn list_adapters(&self) -> Vec<AdapterInfo>;

    /// Open the named adapter.
    ///
    /// # Errors
    ///
    /// Returns [`HandError::Connection`] if the adapter cannot be opened.
    fn open(&mut self, adapter: &str) -> HandResult<()>;

    /// Scan the bus and return the discovered slave table.
    ///
    /// # Errors
    ///
    /// Returns [`HandError::Fieldbus`] if the scan itself fails. An empty
    /// bus is reported as an empty table, not an error; the transport
    /// decides what that means.
    fn discover(&mut self) -> HandResult<Vec<SlaveInfo>>;

    /// One process-data round-trip: push `outputs` to the bus, then block up
    /// to the port's receive timeout filling `inputs`.
    ///
    /// # Errors
    ///
    /// Returns [`HandError::Fieldbus`] on a failed round-trip.
    fn exchange(&mut self, outputs: &[Vec<u8>], inputs: &mut [Vec<u8>]) -> HandResult<()>;

    /// Release the adapter handle. Open may be called again afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`HandError::Fieldbus`] if teardown fails.
    fn close(&mut self) -> HandResult<()>;
}

/// Transport variant backed by real fieldbus hardware.
pub struct RealTransport {
    /// Wire port; `None` while the cyclic worker owns it.
    port: Option<Box<dyn FieldbusPort>>,
    image: SharedImage,
    stats: Arc<CycleStats>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<Box<dyn FieldbusPort>>>,
    state: LinkState,
    adapter: Option<String>,
}

impl std::fmt::Debug for RealTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealTransport")
            .field("state", &self.state)
            .field("adapter", &self.adapter)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

impl RealTransport {
    /// Create a transport over the given wire port. The link starts
    /// disconnected; call [`Transport::start`] to bring it up.
    #[must_use]
    pub fn new(port: Box<dyn FieldbusPort>) -> Self {
        Self {
            port: Some(port),
            image: SharedImage::default(),
            stats: Arc::new(CycleStats::default()),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            state: LinkState::Disconnected,
            adapter: None,
        }
    }

    /// Exchange statistics of the current (or last) run.
    #[must_use]
    pub fn stats(&self) -> CycleSnapshot {
        self.stats.snapshot()
    }

    fn abort_start(&mut self, mut port: Box<dyn FieldbusPort>) {
        if let Err(e) = port.close() {
            warn!(error = %e, "Failed to close port after aborted start");
        }
        self.port = Some(port);
        self.state = LinkState::Disconnected;
    }
}

impl Transport for RealTransport {
    fn list_adapters(&self) -> Vec<AdapterInfo> {
        match &self.port {
            Some(port) => port.list_adapters(),
            None => platform_adapters(),
        }
    }

    fn start(&mut self, adapter: &str) -> HandResult<()> {
        self.state.transition_to(LinkState::Connecting)?;

        let Some(mut port) = self.port.take() else {
            self.state = LinkState::Disconnected;
            return Err(HandError::Fieldbus("wire port unavailable".into()));
        };

        if let Err(e) = port.open(adapter) {
            self.abort_start(port);
            return Err(e);
        }

        let slaves = match port.discover() {
            Ok(slaves) => slaves,
            Err(e) => {
                self.abort_start(port);
                return Err(e);
            }
        };

        if slaves.is_empty() {
            self.abort_start(port);
            return Err(HandError::Connection(format!(
                "no slaves found on adapter {adapter}"
            )));
        }

        info!(adapter, slave_count = slaves.len(), "Fieldbus link up");

        self.image.reset(ProcessImage::from_slaves(&slaves));
        self.adapter = Some(adapter.to_string());
        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let image = self.image.clone();
        let stats = Arc::clone(&self.stats);

        let worker = std::thread::Builder::new()
            .name("hand-cycle".into())
            .spawn(move || cycle_loop(port, &image, &stats, &running))
            .map_err(|e| {
                self.state = LinkState::Disconnected;
                self.running.store(false, Ordering::SeqCst);
                HandError::Io(format!("failed to spawn cycle thread: {e}"))
            })?;

        self.worker = Some(worker);
        self.state.transition_to(LinkState::Running)?;
        Ok(())
    }

    fn stop(&mut self) -> HandResult<()> {
        self.running.store(false, Ordering::SeqCst);

        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(port) => self.port = Some(port),
                Err(_) => {
                    self.state = LinkState::Stopped;
                    return Err(HandError::Fieldbus("cycle thread panicked".into()));
                }
            }
            self.state.transition_to(LinkState::Stopped)?;

            let snap = self.stats.snapshot();
            info!(
                cycles = snap.cycles,
                errors = snap.errors,
                "Fieldbus link stopped"
            );
        }

        Ok(())
    }

    fn set_output(&mut self, slave: usize, channel: usize, value: u8) {
        self.image.set_output(slave, channel, value);
    }

    fn get_input(&self, slave: usize, channel: usize) -> u8 {
        self.image.get_input(slave, channel)
    }

    fn state(&self) -> LinkState {
        self.state
    }
}

/// Cyclic worker body: push outputs, pull inputs, repeat until signaled.
///
/// The worker is the only fieldbus-side reader of the output image and the
/// only writer of the input image. The cycle rate is the blocking round-trip
/// inside [`FieldbusPort::exchange`], not a scheduled tick. Returns the
/// closed port to the joining thread.
fn cycle_loop(
    mut port: Box<dyn FieldbusPort>,
    image: &SharedImage,
    stats: &CycleStats,
    running: &AtomicBool,
) -> Box<dyn FieldbusPort> {
    let mut inputs = image.blank_inputs();

    while running.load(Ordering::SeqCst) {
        let outputs = image.snapshot_outputs();
        let start = Instant::now();

        match port.exchange(&outputs, &mut inputs) {
            Ok(()) => {
                image.store_inputs(&inputs);
                stats.record_success(start.elapsed().as_micros() as u32);
            }
            Err(e) => {
                stats.record_error();
                warn!(error = %e, "Process data exchange failed");
                // keep a wedged port from spinning the CPU
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }

    if let Err(e) = port.close() {
        warn!(error = %e, "Failed to close fieldbus port");
    }
    port
}

/// Enumerate platform network adapters.
///
/// On Linux this walks `/sys/class/net`, skipping the loopback device; other
/// platforms report no adapters.
#[must_use]
pub fn platform_adapters() -> Vec<AdapterInfo> {
    #[cfg(target_os = "linux")]
    {
        let mut adapters = Vec::new();
        if let Ok(entries) = std::fs::read_dir("/sys/class/net") {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name == "lo" {
                    continue;
                }
                adapters.push(AdapterInfo::new(name, "network interface"));
            }
        }
        adapters.sort_by(|a, b| a.name.cmp(&b.name));
        adapters
    }
    #[cfg(not(target_os = "linux"))]
    {
        Vec::new()
    }
}

// SOEM-based wire port (feature-gated, Linux-only)
#[cfg(all(feature = "soem", target_os = "linux"))]
mod soem_port {
    //! SOEM-backed [`FieldbusPort`].
    //!
    //! Uses the `soem` crate, which wraps the Simple Open EtherCAT Master
    //! library. Requires raw socket capabilities (CAP_NET_RAW) or root.

    use super::{AdapterInfo, FieldbusPort, SlaveInfo};
    use hand_common::{HandError, HandResult};
    use std::ffi::c_int;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    /// Maximum number of slaves supported.
    const MAX_SLAVES: usize = 64;

    /// Maximum number of groups.
    const MAX_GROUPS: usize = 2;

    /// I/O map size (4KB as per SOEM API).
    const IO_MAP_SIZE: usize = 4096;

    /// Timeout for slave state transitions in microseconds.
    const STATE_TIMEOUT_US: c_int = 500_000;

    /// Linux capability bit for CAP_NET_RAW.
    const CAP_NET_RAW_BIT: u32 = 13;

    /// Placement of one slave's process data in the SOEM I/O map.
    #[derive(Debug, Clone, Copy, Default)]
    struct SlaveLayout {
        output_offset: usize,
        output_len: usize,
        input_offset: usize,
        input_len: usize,
    }

    /// SOEM-backed wire port.
    ///
    /// The SOEM context holds mutable references to this struct's buffers
    /// and is therefore created fresh per operation, never stored.
    pub struct SoemPort {
        interface: Option<String>,
        receive_timeout_us: c_int,
        port: soem::Port,
        slaves: Vec<soem::Slave>,
        slave_count: c_int,
        groups: Vec<soem::Group>,
        esibuf: Vec<soem::ESIBuf>,
        esimap: Vec<soem::ESIMap>,
        elist: Vec<soem::ERing>,
        idxstack: Vec<soem::IdxStack>,
        ecaterror: Vec<soem::Boolean>,
        dc_time: i64,
        sm_commtype: Vec<soem::SMCommType>,
        pdo_assign: Vec<soem::PDOAssign>,
        pdo_desc: Vec<soem::PDODesc>,
        eep_sm: Vec<soem::EEPROMSM>,
        eep_fmmu: Vec<soem::EEPROMFMMU>,
        io_map: Box<[u8; IO_MAP_SIZE]>,
        layout: Vec<SlaveLayout>,
    }

    impl SoemPort {
        /// Create a port with the given bound on the cyclic receive step.
        #[must_use]
        pub fn new(receive_timeout: Duration) -> Self {
            Self {
                interface: None,
                receive_timeout_us: receive_timeout.as_micros().min(c_int::MAX as u128) as c_int,
                port: soem::Port::default(),
                slaves: vec![soem::Slave::default(); MAX_SLAVES + 1], // +1 for master slot
                slave_count: 0,
                groups: vec![soem::Group::default(); MAX_GROUPS],
                esibuf: vec![soem::ESIBuf::default(); MAX_SLAVES],
                esimap: vec![soem::ESIMap::default(); MAX_SLAVES],
                elist: vec![soem::ERing::default(); MAX_SLAVES],
                idxstack: vec![soem::IdxStack::default(); MAX_SLAVES],
                ecaterror: vec![soem::Boolean::default(); MAX_SLAVES],
                dc_time: 0,
                sm_commtype: vec![soem::SMCommType::default(); MAX_SLAVES],
                pdo_assign: vec![soem::PDOAssign::default(); MAX_SLAVES],
                pdo_desc: vec![soem::PDODesc::default(); MAX_SLAVES],
                eep_sm: vec![soem::EEPROMSM::default(); MAX_SLAVES],
                eep_fmmu: vec![soem::EEPROMFMMU::default(); MAX_SLAVES],
                io_map: Box::new([0u8; IO_MAP_SIZE]),
                layout: Vec::new(),
            }
        }

        fn check_interface_exists(interface: &str) -> HandResult<()> {
            let path = format!("/sys/class/net/{interface}");
            if !Path::new(&path).exists() {
                return Err(HandError::Connection(format!(
                    "adapter '{interface}' not found (expected {path})"
                )));
            }
            Ok(())
        }

        fn has_cap_net_raw() -> bool {
            let status = match fs::read_to_string("/proc/self/status") {
                Ok(status) => status,
                Err(_) => return false,
            };

            for line in status.lines() {
                if let Some(value) = line.strip_prefix("CapEff:\t") {
                    if let Ok(bits) = u64::from_str_radix(value.trim(), 16) {
                        return (bits & (1u64 << CAP_NET_RAW_BIT)) != 0;
                    }
                    break;
                }
            }
            false
        }

        fn check_raw_socket_privilege() -> HandResult<()> {
            let is_root = unsafe { libc::geteuid() == 0 };
            if is_root || Self::has_cap_net_raw() {
                return Ok(());
            }

            Err(HandError::Connection(
                "EtherCAT requires CAP_NET_RAW (or root) to open raw sockets".into(),
            ))
        }

        /// Create a temporary SOEM context for one operation.
        ///
        /// SOEM's `Context` borrows every buffer mutably and does not
        /// implement `Clone`, so a fresh context is built around our storage
        /// each time.
        fn with_context<F, T>(&mut self, f: F) -> HandResult<T>
        where
            F: FnOnce(&mut soem::Context<'_>) -> HandResult<T>,
        {
            let Some(interface) = self.interface.clone() else {
                return Err(HandError::Connection("port not open".into()));
            };

            let mut context = soem::Context::new(
                &[&interface],
                &mut self.port,
                &mut self.slaves,
                &mut self.slave_count,
                &mut self.groups,
                &mut self.esibuf,
                &mut self.esimap,
                &mut self.elist,
                &mut self.idxstack,
                &mut self.ecaterror,
                &mut self.dc_time,
                &mut self.sm_commtype,
                &mut self.pdo_assign,
                &mut self.pdo_desc,
                &mut self.eep_sm,
                &mut self.eep_fmmu,
            )
            .map_err(|e| {
                HandError::Connection(format!("failed to create SOEM context on {interface}: {e:?}"))
            })?;

            f(&mut context)
        }
    }

    impl FieldbusPort for SoemPort {
        fn list_adapters(&self) -> Vec<AdapterInfo> {
            super::platform_adapters()
        }

        fn open(&mut self, adapter: &str) -> HandResult<()> {
            if adapter.is_empty() {
                return Err(HandError::Connection("adapter name cannot be empty".into()));
            }

            Self::check_interface_exists(adapter)?;
            Self::check_raw_socket_privilege()?;

            self.interface = Some(adapter.to_string());
            tracing::info!(adapter, "SOEM port open");
            Ok(())
        }

        fn discover(&mut self) -> HandResult<Vec<SlaveInfo>> {
            let Some(interface) = self.interface.clone() else {
                return Err(HandError::Connection("port not open".into()));
            };

            // The context is built inline here (not via with_context) so the
            // I/O map, a disjoint field, can be borrowed alongside it.
            let io_map: &mut [u8; IO_MAP_SIZE] = &mut self.io_map;
            let mut ctx = soem::Context::new(
                &[&interface],
                &mut self.port,
                &mut self.slaves,
                &mut self.slave_count,
                &mut self.groups,
                &mut self.esibuf,
                &mut self.esimap,
                &mut self.elist,
                &mut self.idxstack,
                &mut self.ecaterror,
                &mut self.dc_time,
                &mut self.sm_commtype,
                &mut self.pdo_assign,
                &mut self.pdo_desc,
                &mut self.eep_sm,
                &mut self.eep_fmmu,
            )
            .map_err(|e| {
                HandError::Connection(format!(
                    "failed to create SOEM context on {interface}: {e:?}"
                ))
            })?;

            let slave_count = ctx
                .config_init(false)
                .map_err(|e| HandError::Fieldbus(format!("slave scan failed: {e:?}")))?;

            if slave_count > 0 {
                // Map I/O for group 0 (default group)
                ctx.config_map_group(io_map, 0).map_err(|mut errors| {
                    if let Some(e) = errors.next() {
                        HandError::Fieldbus(format!("failed to map I/O: {e:?}"))
                    } else {
                        HandError::Fieldbus("failed to map I/O: unknown error".into())
                    }
                })?;

                // Request OP so process data flows
                ctx.set_state(soem::EtherCatState::Op, 0);
                ctx.write_state(0)
                    .map_err(|e| HandError::Fieldbus(format!("failed to request OP: {e:?}")))?;
                let reached = ctx.check_state(0, soem::EtherCatState::Op, STATE_TIMEOUT_US);
                if reached != soem::EtherCatState::Op {
                    tracing::warn!("Not all slaves reached OP");
                }
            }

            drop(ctx);

            // Build the slave table and I/O map layout outside the context.
            // SOEM packs group outputs first, inputs after; slots are 1-based
            // (0 is the master).
            let count = self.slave_count as usize;
            let mut slaves = Vec::with_capacity(count);
            let mut layout = Vec::with_capacity(count);
            let mut output_offset = 0usize;
            let mut input_len_total = 0usize;

            for idx in 1..=count.min(self.slaves.len().saturating_sub(1)) {
                let slave = &self.slaves[idx];
                let output_len = slave.output_size() as usize;
                let input_len = slave.input_size() as usize;

                slaves.push(SlaveInfo::new(slave.name().to_string(), input_len, output_len));
                layout.push(SlaveLayout {
                    output_offset,
                    output_len,
                    input_offset: input_len_total,
                    input_len,
                });
                output_offset += output_len;
                input_len_total += input_len;
            }

            let input_base = output_offset;
            for entry in &mut layout {
                entry.input_offset += input_base;
            }
            self.layout = layout;

            tracing::info!(
                slave_count = slaves.len(),
                output_bytes = output_offset,
                input_bytes = input_len_total,
                "SOEM discovery complete"
            );

            Ok(slaves)
        }

        fn exchange(&mut self, outputs: &[Vec<u8>], inputs: &mut [Vec<u8>]) -> HandResult<()> {
            // Stage outputs into the I/O map at each slave's slot.
            for (buf, entry) in outputs.iter().zip(self.layout.clone()) {
                let n = buf.len().min(entry.output_len);
                let end = entry.output_offset + n;
                if end <= IO_MAP_SIZE {
                    self.io_map[entry.output_offset..end].copy_from_slice(&buf[..n]);
                }
            }

            let timeout = self.receive_timeout_us;
            self.with_context(|ctx| {
                ctx.send_processdata();
                let wkc = ctx.receive_processdata(timeout);
                if wkc == 0 {
                    return Err(HandError::Fieldbus("no working counter received".into()));
                }
                Ok(())
            })?;

            // Copy inputs back out of the I/O map.
            for (buf, entry) in inputs.iter_mut().zip(self.layout.clone()) {
                let n = buf.len().min(entry.input_len);
                let end = entry.input_offset + n;
                if end <= IO_MAP_SIZE {
                    buf[..n].copy_from_slice(&self.io_map[entry.input_offset..end]);
                }
            }

            Ok(())
        }

        fn close(&mut self) -> HandResult<()> {
            if self.interface.is_some() {
                if let Err(e) = self.with_context(|ctx| {
                    ctx.set_state(soem::EtherCatState::Init, 0);
                    ctx.write_state(0)
                        .map_err(|e| HandError::Fieldbus(format!("failed to request INIT: {e:?}")))?;
                    Ok(())
                }) {
                    tracing::warn!(error = %e, "Failed to park slaves in INIT during close");
                }
            }

            self.interface = None;
            self.layout.clear();
            self.slave_count = 0;
            tracing::debug!("SOEM port closed");
            Ok(())
        }
    }

    impl std::fmt::Debug for SoemPort {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SoemPort")
                .field("interface", &self.interface)
                .field("slave_count", &self.slave_count)
                .finish_non_exhaustive()
        }
    }
}

#[cfg(all(feature = "soem", target_os = "linux"))]
pub use soem_port::SoemPort;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Port double: a fixed slave table and an echo plant that reflects
    /// each cycle's outputs back as inputs.
    struct EchoPort {
        slaves: Vec<SlaveInfo>,
    }

    impl EchoPort {
        fn with_slaves(slaves: Vec<SlaveInfo>) -> Self {
            Self { slaves }
        }
    }

    impl FieldbusPort for EchoPort {
        fn list_adapters(&self) -> Vec<AdapterInfo> {
            vec![AdapterInfo::new("mock0", "mock adapter")]
        }

        fn open(&mut self, adapter: &str) -> HandResult<()> {
            if adapter == "missing0" {
                return Err(HandError::Connection("adapter 'missing0' not found".into()));
            }
            Ok(())
        }

        fn discover(&mut self) -> HandResult<Vec<SlaveInfo>> {
            Ok(self.slaves.clone())
        }

        fn exchange(&mut self, outputs: &[Vec<u8>], inputs: &mut [Vec<u8>]) -> HandResult<()> {
            for (dst, src) in inputs.iter_mut().zip(outputs) {
                let n = dst.len().min(src.len());
                dst[..n].copy_from_slice(&src[..n]);
            }
            // stand in for the bounded blocking receive
            std::thread::sleep(Duration::from_micros(500));
            Ok(())
        }

        fn close(&mut self) -> HandResult<()> {
            Ok(())
        }
    }

    fn two_slave_port() -> Box<EchoPort> {
        Box::new(EchoPort::with_slaves(vec![
            SlaveInfo::new("slave0", 8, 8),
            SlaveInfo::new("slave1", 8, 8),
        ]))
    }

    fn wait_for_input(transport: &RealTransport, slave: usize, channel: usize, want: u8) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if transport.get_input(slave, channel) == want {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_start_fails_on_bad_adapter() {
        let mut transport = RealTransport::new(two_slave_port());
        let result = transport.start("missing0");
        assert!(matches!(result, Err(HandError::Connection(_))));
        assert_eq!(transport.state(), LinkState::Disconnected);
    }

    #[test]
    fn test_start_fails_on_empty_bus() {
        let mut transport = RealTransport::new(Box::new(EchoPort::with_slaves(Vec::new())));
        let result = transport.start("mock0");
        assert!(matches!(result, Err(HandError::Connection(_))));
        assert_eq!(transport.state(), LinkState::Disconnected);

        // a failed start leaves the port available for another attempt
        let result = transport.start("mock0");
        assert!(result.is_err());
    }

    #[test]
    fn test_cycle_echoes_outputs_to_inputs() {
        let mut transport = RealTransport::new(two_slave_port());
        transport.start("mock0").unwrap();
        assert_eq!(transport.state(), LinkState::Running);

        transport.set_output(0, 2, 77);
        transport.set_output(1, 5, 123);

        assert!(wait_for_input(&transport, 0, 2, 77));
        assert!(wait_for_input(&transport, 1, 5, 123));

        transport.stop().unwrap();
        assert_eq!(transport.state(), LinkState::Stopped);
        assert!(transport.stats().cycles > 0);
    }

    #[test]
    fn test_out_of_table_coordinates_are_forgiving() {
        let mut transport = RealTransport::new(two_slave_port());
        transport.start("mock0").unwrap();

        transport.set_output(9, 0, 1);
        assert_eq!(transport.get_input(9, 0), 0);

        transport.stop().unwrap();
    }

    #[test]
    fn test_double_stop_does_not_block() {
        let mut transport = RealTransport::new(two_slave_port());
        transport.start("mock0").unwrap();

        transport.stop().unwrap();
        // second stop has no worker to join and returns immediately
        transport.stop().unwrap();
        assert_eq!(transport.state(), LinkState::Stopped);
    }

    #[test]
    fn test_restart_after_stop() {
        let mut transport = RealTransport::new(two_slave_port());
        transport.start("mock0").unwrap();
        transport.stop().unwrap();

        transport.start("mock0").unwrap();
        assert_eq!(transport.state(), LinkState::Running);

        transport.set_output(0, 0, 9);
        assert!(wait_for_input(&transport, 0, 0, 9));
        transport.stop().unwrap();
    }

    #[test]
    fn test_start_while_running_is_rejected() {
        let mut transport = RealTransport::new(two_slave_port());
        transport.start("mock0").unwrap();

        let result = transport.start("mock0");
        assert!(matches!(result, Err(HandError::InvalidTransition { .. })));

        transport.stop().unwrap();
    }
}
