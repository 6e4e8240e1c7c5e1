//! Node registry and built-in node implementations.

pub mod registry;
pub mod builtin;

pub use builtin::FreeDragCrop;
pub use registry::{FilterFactory, FilterRegistry, RegistryBuilder, RegistryEntry};
