//! Handles for agents, cells and events.
//!
//! Each handle is a plain integer newtype.  Spaces and schedules store
//! handles, never references, so ownership of agents stays with the model.
//! The integer is public; [`index`](CellId::index) is the usual way to turn a
//! handle into an arena slot.

use std::fmt;

macro_rules! handles {
    ($( $(#[$doc:meta])* $name:ident($repr:ty) = $label:literal; )+) => {$(
        $(#[$doc])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub $repr);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, " {}"), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;

            fn try_from(slot: usize) -> Result<Self, Self::Error> {
                Ok($name(<$repr>::try_from(slot)?))
            }
        }
    )+};
}

handles! {
    /// An agent owned by the model.
    AgentId(u32) = "agent";

    /// Arena slot of a cell.  Slots of removed cells are not handed out again.
    CellId(u32) = "cell";

    /// Sequence number of a scheduled event, the last tie-break in event
    /// ordering.
    EventId(u64) = "event";
}

impl EventId {
    /// The id issued after this one.
    #[inline]
    pub fn next(self) -> EventId {
        EventId(self.0 + 1)
    }
}
