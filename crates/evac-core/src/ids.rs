//! Strongly typed agent identity and its generator.
//!
//! `AgentId` is `Copy + Ord + Hash` so it can be used as a map key and sorted
//! without ceremony.  Unlike a SoA index it is *not* a position in any
//! collection: agents are removed from the live set as they evacuate, so the
//! simulator always resolves ids through a lookup.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID", equal to `<$inner>::MAX`.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Raw integer value.
            #[inline(always)]
            pub fn get(self) -> $inner {
                self.0
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<i64> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: i64) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Unique, stable identity of one agent for its whole lifetime.
    pub struct AgentId(u32);
}

// ── IdGenerator ───────────────────────────────────────────────────────────────

/// Hands out monotonically increasing [`AgentId`]s.
///
/// Owned by whoever creates agents (normally `AgentFactory`); there is no
/// process-wide counter.  The first id issued is `AgentId(1)`.
#[derive(Clone, Debug)]
pub struct IdGenerator {
    next: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Issue the next id.
    pub fn next_id(&mut self) -> AgentId {
        let id = AgentId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Make sure future ids are strictly greater than `seen`.
    pub fn observe(&mut self, seen: AgentId) {
        if seen != AgentId::INVALID && seen.0 >= self.next {
            self.next = seen.0.saturating_add(1);
        }
    }

    /// The id that the next call to [`next_id`](Self::next_id) returns.
    pub fn peek(&self) -> AgentId {
        AgentId(self.next)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
