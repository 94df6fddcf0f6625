//! Ordered collection of joints with bulk transport operations.

use hand_common::JointRecord;
use hand_fieldbus::Transport;
use tracing::info;

use crate::joint::Joint;

/// The hand: an ordered joint sequence built from configuration.
///
/// Order is the display/control order and otherwise carries no meaning. The
/// model owns its joints exclusively; all reads and writes route through it.
/// A model with no topology loaded is explicitly empty — there is no
/// synthetic fallback topology. Duplicate `(slave, channel)` mappings are
/// permitted and alias the same underlying byte.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HandModel {
    joints: Vec<Joint>,
}

impl HandModel {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a joint to the sequence.
    pub fn add_joint(&mut self, joint: Joint) {
        self.joints.push(joint);
    }

    /// Replace the entire joint sequence from configuration records.
    ///
    /// The replacement is built in full before the old sequence is dropped;
    /// existing joints are discarded wholesale, never partially updated.
    pub fn load_from_config(&mut self, records: &[JointRecord]) {
        let joints: Vec<Joint> = records.iter().map(Joint::from_record).collect();
        info!(joint_count = joints.len(), "Joint topology loaded");
        self.joints = joints;
    }

    /// Refresh every joint's value from the transport, in sequence order.
    pub fn update_from_master(&mut self, transport: &dyn Transport) {
        for joint in &mut self.joints {
            joint.read_position(transport);
        }
    }

    /// Re-assert every joint's currently-held value onto the transport, in
    /// sequence order. Used to re-establish output state after a reconnect.
    pub fn write_to_master(&mut self, transport: &mut dyn Transport) {
        for joint in &mut self.joints {
            let value = joint.value();
            joint.write_position(transport, value);
        }
    }

    /// The joint sequence, for read-only iteration.
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Mutable access to one joint by sequence position.
    pub fn joint_mut(&mut self, index: usize) -> Option<&mut Joint> {
        self.joints.get_mut(index)
    }

    /// Number of joints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// True when no topology is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}
