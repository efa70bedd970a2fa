//! Slot scheduling — interval/priority availability checking for ad spots.

pub mod allocator;

pub use allocator::{Candidate, SlotAllocator};
