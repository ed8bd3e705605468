//! Metadata service implementations.

pub mod memory;

pub use memory::{AppFixture, ClusterFixture, InMemoryMetaService};
