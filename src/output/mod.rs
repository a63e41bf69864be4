//! Durable artifact output: naming rules and atomic persistence.

mod naming;
mod writer;

pub use naming::ArtifactNaming;
pub use writer::{AtomicWriter, CollisionPolicy};
