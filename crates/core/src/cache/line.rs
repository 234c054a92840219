//! Cache line state.

use std::fmt;

/// MESI coherence state of one cache line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MesiState {
    /// Line holds no meaningful data.
    #[default]
    Invalid,
    /// Clean copy that may also exist in other caches.
    Shared,
    /// Clean copy, sole valid copy in the system.
    Exclusive,
    /// Dirty copy, sole valid copy in the system; must be written back on
    /// eviction.
    Modified,
}

impl fmt::Display for MesiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            MesiState::Invalid => 'I',
            MesiState::Shared => 'S',
            MesiState::Exclusive => 'E',
            MesiState::Modified => 'M',
        };
        write!(f, "{}", c)
    }
}

/// One way of a cache set.
///
/// The tag is only meaningful while `state != Invalid`; it is left in place
/// on invalidation and simply never compared. Block payloads are nominal and
/// not stored per line.
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheLine {
    /// MESI coherence state.
    pub state: MesiState,
    /// Tag bits of the resident block.
    pub tag: u32,
    /// Monotone recency stamp; larger means more recently used.
    pub lru: u64,
}

impl CacheLine {
    /// Whether the line holds a valid block (any state except Invalid).
    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        self.state != MesiState::Invalid
    }

    /// Whether eviction of this line requires a write-back.
    #[inline(always)]
    pub fn is_dirty(&self) -> bool {
        self.state == MesiState::Modified
    }
}
