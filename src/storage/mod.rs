pub mod traits;
pub mod ipfs;

pub use ipfs::{IpfsConfig, IpfsStorage};
pub use traits::StorageBackend;
