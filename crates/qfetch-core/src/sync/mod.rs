//! Synchronization primitives the scheduler is built from.
//!
//! Every piece of shared mutable state in this crate lives inside a
//! [`GuardedState`]; [`TicketLock`] layers FIFO single-holder exclusion on top
//! of it for one-shot registrations.

mod guarded;
mod ticket;

pub use guarded::GuardedState;
pub use ticket::TicketLock;
