//! Process-data image shared between the caller and the cyclic worker.
//!
//! The image is the only resource the two threads share. All access goes
//! through [`SharedImage`], a mutex-guarded handle; per-byte access is never
//! shared unguarded across threads.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::SlaveInfo;

/// Byte tables mirroring the slaves' I/O registers.
///
/// One output and one input buffer per slave, addressed by
/// `(slave index, byte offset)`. Accesses outside the table are forgiving:
/// writes are dropped, reads return 0.
#[derive(Debug, Default)]
pub struct ProcessImage {
    /// Output data (application → fieldbus), one buffer per slave.
    outputs: Vec<Vec<u8>>,
    /// Input data (fieldbus → application), one buffer per slave.
    inputs: Vec<Vec<u8>>,
}

impl ProcessImage {
    /// Create an image sized from a discovered slave table.
    #[must_use]
    pub fn from_slaves(slaves: &[SlaveInfo]) -> Self {
        Self {
            outputs: slaves.iter().map(|s| vec![0; s.output_len]).collect(),
            inputs: slaves.iter().map(|s| vec![0; s.input_len]).collect(),
        }
    }

    /// Stage one output byte. Out-of-table coordinates are dropped.
    pub fn set_output(&mut self, slave: usize, channel: usize, value: u8) {
        if let Some(byte) = self.outputs.get_mut(slave).and_then(|s| s.get_mut(channel)) {
            *byte = value;
        }
    }

    /// Read one input byte. Out-of-table coordinates read as 0.
    #[must_use]
    pub fn get_input(&self, slave: usize, channel: usize) -> u8 {
        self.inputs
            .get(slave)
            .and_then(|s| s.get(channel))
            .copied()
            .unwrap_or(0)
    }

    /// Clone the per-slave output buffers for one exchange cycle.
    #[must_use]
    pub fn snapshot_outputs(&self) -> Vec<Vec<u8>> {
        self.outputs.clone()
    }

    /// Store the input buffers received by one exchange cycle. Each buffer
    /// is copied up to the smaller of the staged and received lengths.
    pub fn store_inputs(&mut self, received: &[Vec<u8>]) {
        for (dst, src) in self.inputs.iter_mut().zip(received) {
            let n = dst.len().min(src.len());
            dst[..n].copy_from_slice(&src[..n]);
        }
    }

    /// Zeroed per-slave input buffers, sized for the worker's receive scratch.
    #[must_use]
    pub fn blank_inputs(&self) -> Vec<Vec<u8>> {
        self.inputs.iter().map(|s| vec![0; s.len()]).collect()
    }

    /// Number of slaves in the table.
    #[must_use]
    pub fn slave_count(&self) -> usize {
        self.outputs.len()
    }
}

/// Cloneable, mutex-guarded handle to a [`ProcessImage`].
///
/// The caller thread stages outputs and reads inputs through one clone; the
/// cyclic worker snapshots outputs and stores inputs through another.
#[derive(Debug, Clone, Default)]
pub struct SharedImage {
    inner: Arc<Mutex<ProcessImage>>,
}

impl SharedImage {
    /// Wrap an image for cross-thread sharing.
    #[must_use]
    pub fn new(image: ProcessImage) -> Self {
        Self {
            inner: Arc::new(Mutex::new(image)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProcessImage> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the image wholesale (on reconnect, sized from a fresh scan).
    pub fn reset(&self, image: ProcessImage) {
        *self.lock() = image;
    }

    /// Stage one output byte. See [`ProcessImage::set_output`].
    pub fn set_output(&self, slave: usize, channel: usize, value: u8) {
        self.lock().set_output(slave, channel, value);
    }

    /// Read one input byte. See [`ProcessImage::get_input`].
    #[must_use]
    pub fn get_input(&self, slave: usize, channel: usize) -> u8 {
        self.lock().get_input(slave, channel)
    }

    /// Clone the output buffers for one exchange cycle.
    #[must_use]
    pub fn snapshot_outputs(&self) -> Vec<Vec<u8>> {
        self.lock().snapshot_outputs()
    }

    /// Store the received input buffers of one exchange cycle.
    pub fn store_inputs(&self, received: &[Vec<u8>]) {
        self.lock().store_inputs(received);
    }

    /// Zeroed receive scratch matching the current input layout.
    #[must_use]
    pub fn blank_inputs(&self) -> Vec<Vec<u8>> {
        self.lock().blank_inputs()
    }
}

/// Exchange statistics updated by the cyclic worker and read from any thread.
#[derive(Debug, Default)]
pub struct CycleStats {
    cycles: AtomicU64,
    errors: AtomicU64,
    last_rtt_us: AtomicU32,
    min_rtt_us: AtomicU32,
    max_rtt_us: AtomicU32,
}

impl CycleStats {
    /// Record a successful exchange round-trip.
    pub fn record_success(&self, rtt_us: u32) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.last_rtt_us.store(rtt_us, Ordering::Relaxed);

        // min of 0 means "no sample yet"
        let mut min = self.min_rtt_us.load(Ordering::Relaxed);
        while min == 0 || rtt_us < min {
            match self.min_rtt_us.compare_exchange_weak(
                min,
                rtt_us,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => min = current,
            }
        }

        let mut max = self.max_rtt_us.load(Ordering::Relaxed);
        while rtt_us > max {
            match self.max_rtt_us.compare_exchange_weak(
                max,
                rtt_us,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => max = current,
            }
        }
    }

    /// Record a failed exchange.
    pub fn record_error(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters.
    #[must_use]
    pub fn snapshot(&self) -> CycleSnapshot {
        CycleSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            last_rtt_us: self.last_rtt_us.load(Ordering::Relaxed),
            min_rtt_us: self.min_rtt_us.load(Ordering::Relaxed),
            max_rtt_us: self.max_rtt_us.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CycleStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSnapshot {
    /// Total exchange cycles attempted.
    pub cycles: u64,
    /// Cycles that failed.
    pub errors: u64,
    /// Round-trip time of the last successful cycle in microseconds.
    pub last_rtt_us: u32,
    /// Minimum observed round-trip time.
    pub min_rtt_us: u32,
    /// Maximum observed round-trip time.
    pub max_rtt_us: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_slave_image() -> ProcessImage {
        ProcessImage::from_slaves(&[
            SlaveInfo::new("slave0", 8, 8),
            SlaveInfo::new("slave1", 4, 4),
        ])
    }

    #[test]
    fn test_set_and_snapshot_outputs() {
        let mut image = two_slave_image();
        image.set_output(0, 2, 77);
        image.set_output(1, 3, 99);

        let outputs = image.snapshot_outputs();
        assert_eq!(outputs[0][2], 77);
        assert_eq!(outputs[1][3], 99);
    }

    #[test]
    fn test_out_of_table_write_is_dropped() {
        let mut image = two_slave_image();
        image.set_output(5, 0, 1);
        image.set_output(0, 100, 1);

        assert!(image.snapshot_outputs()[0].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_unknown_input_reads_zero() {
        let image = two_slave_image();
        assert_eq!(image.get_input(0, 0), 0);
        assert_eq!(image.get_input(9, 9), 0);
    }

    #[test]
    fn test_store_inputs() {
        let mut image = two_slave_image();
        let mut received = image.blank_inputs();
        received[0][1] = 42;
        image.store_inputs(&received);

        assert_eq!(image.get_input(0, 1), 42);
    }

    #[test]
    fn test_store_inputs_tolerates_short_buffers() {
        let mut image = two_slave_image();
        image.store_inputs(&[vec![7; 2]]);
        assert_eq!(image.get_input(0, 0), 7);
        assert_eq!(image.get_input(0, 2), 0);
    }

    #[test]
    fn test_shared_image_reset() {
        let shared = SharedImage::new(ProcessImage::default());
        assert_eq!(shared.get_input(0, 0), 0);

        shared.reset(two_slave_image());
        shared.set_output(0, 0, 5);
        assert_eq!(shared.snapshot_outputs()[0][0], 5);
    }

    #[test]
    fn test_cycle_stats() {
        let stats = CycleStats::default();
        stats.record_success(100);
        stats.record_success(150);
        stats.record_success(80);
        stats.record_error();

        let snap = stats.snapshot();
        assert_eq!(snap.cycles, 4);
        assert_eq!(snap.errors, 1);
        assert_eq!(snap.min_rtt_us, 80);
        assert_eq!(snap.max_rtt_us, 150);
        assert_eq!(snap.last_rtt_us, 80);
    }
}
