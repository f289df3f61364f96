//! Concrete region providers

mod shared_memory;

pub use shared_memory::SharedMemoryProvider;
