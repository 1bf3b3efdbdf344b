// # Snapshot Store Implementations
//
// This module provides implementations of the SnapshotStore trait.

pub mod memory;

pub use memory::MemorySnapshotStore;
