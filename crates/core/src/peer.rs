//! Router/child table contract consumed during master-key replacement.
//!
//! The key manager mutates peer records only when [`SetMasterKey`] accepts a
//! new key (see `spec.md` §4.3): every router and every non-invalid child
//! has its key sequence and both frame counters reset to zero. The manager
//! never reads peer state otherwise, so the contract is deliberately
//! write-only from its point of view.

/// Lifecycle state of a child record, mirroring the "any state except
/// invalid" filter the collaborator applies before handing records to the
/// key manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildState {
    Invalid,
    ChildIdRequest,
    ChildIdResponse,
    LinkRequest,
    Valid,
}

/// A single peer's security-relevant fields.
///
/// Real router/child tables carry far more (addresses, timeouts, routing
/// costs); only the three fields the key manager touches are modeled here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerRecord {
    pub key_sequence: u32,
    pub link_frame_counter: u32,
    pub mle_frame_counter: u32,
}

impl PeerRecord {
    /// Reset the three fields the key manager owns, in response to a
    /// master-key replacement.
    pub fn reset_for_new_master_key(&mut self) {
        self.key_sequence = 0;
        self.link_frame_counter = 0;
        self.mle_frame_counter = 0;
    }
}

/// Router/child table access needed by [`SetMasterKey`](crate) peer resets.
///
/// Implementations are expected to apply the "any state except invalid"
/// filter to children themselves: `children_mut` only yields records the
/// key manager should touch.
pub trait PeerTable {
    /// The node's own parent, or `None` if this node has no parent (e.g. it
    /// is itself the Leader, or has not yet attached).
    fn parent_mut(&mut self) -> Option<&mut PeerRecord>;

    /// All router table entries.
    fn routers_mut(&mut self) -> Box<dyn Iterator<Item = &mut PeerRecord> + '_>;

    /// Child table entries in any state except invalid.
    fn children_mut(&mut self) -> Box<dyn Iterator<Item = &mut PeerRecord> + '_>;
}

/// Reference in-memory [`PeerTable`] for tests and small deployments.
#[derive(Debug, Default)]
pub struct InMemoryPeerTable {
    pub parent: Option<PeerRecord>,
    pub routers: Vec<PeerRecord>,
    pub children: Vec<(ChildState, PeerRecord)>,
}

impl PeerTable for InMemoryPeerTable {
    fn parent_mut(&mut self) -> Option<&mut PeerRecord> {
        self.parent.as_mut()
    }

    fn routers_mut(&mut self) -> Box<dyn Iterator<Item = &mut PeerRecord> + '_> {
        Box::new(self.routers.iter_mut())
    }

    fn children_mut(&mut self) -> Box<dyn Iterator<Item = &mut PeerRecord> + '_> {
        Box::new(
            self.children
                .iter_mut()
                .filter(|(state, _)| *state != ChildState::Invalid)
                .map(|(_, record)| record),
        )
    }
}
