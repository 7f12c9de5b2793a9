pub mod memory;
pub mod pending;
pub mod provider;

pub use memory::{InMemoryAdPlatform, InMemoryMappingStore, InMemoryRevenueSource};
pub use pending::PendingStateStore;
pub use provider::{AdPlatformClient, ClientRegistry, FetchWindow, MappingStore, RevenueSourceClient};
