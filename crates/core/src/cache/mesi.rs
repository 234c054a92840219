//! MESI snoop transition table.
//!
//! The reaction of a cache to a transaction observed on the bus is a pure
//! function of the line's current state and the transaction type. Keeping it
//! as a standalone table makes the protocol auditable in one place and lets
//! the controller stay free of coherence case analysis.

use super::line::MesiState;
use crate::bus::BusTransaction;

/// Result of snooping one bus transaction against one resident line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnoopOutcome {
    /// State the line moves to.
    pub next: MesiState,
    /// Whether this cache supplies the block to the requester. Only a
    /// Modified holder has data that memory does not.
    pub provides_data: bool,
    /// Whether the dirty block must be written back to memory first.
    pub writeback: bool,
}

impl SnoopOutcome {
    const fn stay(state: MesiState) -> Self {
        Self {
            next: state,
            provides_data: false,
            writeback: false,
        }
    }
}

/// Applies the MESI snoop table to `(state, tx)`.
///
/// `BusRd` is a peer asking for a shared copy, `BusRdX` a peer asking for an
/// exclusive copy; `BusUpgr` and `Invalidate` carry no data and only kill
/// copies. `Flush` is a write-back passing by and never affects other
/// caches. The function is total: Invalid lines ignore everything.
pub fn snoop_transition(state: MesiState, tx: BusTransaction) -> SnoopOutcome {
    use BusTransaction::*;
    use MesiState::*;

    match (state, tx) {
        (Invalid, _) | (_, Flush) => SnoopOutcome::stay(state),

        (Shared, BusRd) => SnoopOutcome::stay(Shared),
        (Shared, BusRdX) | (Shared, BusUpgr) | (Shared, Invalidate) => SnoopOutcome {
            next: Invalid,
            provides_data: false,
            writeback: false,
        },

        (Exclusive, BusRd) => SnoopOutcome {
            next: Shared,
            provides_data: false,
            writeback: false,
        },
        // An upgrade implies the requester held Shared, so no Exclusive copy
        // can exist; invalidate anyway to keep the table total.
        (Exclusive, BusRdX) | (Exclusive, BusUpgr) | (Exclusive, Invalidate) => SnoopOutcome {
            next: Invalid,
            provides_data: false,
            writeback: false,
        },

        (Modified, BusRd) => SnoopOutcome {
            next: Shared,
            provides_data: true,
            writeback: true,
        },
        (Modified, BusRdX) => SnoopOutcome {
            next: Invalid,
            provides_data: true,
            writeback: true,
        },
        (Modified, BusUpgr) | (Modified, Invalidate) => SnoopOutcome {
            next: Invalid,
            provides_data: false,
            writeback: true,
        },
    }
}
