#![forbid(unsafe_code)]

pub mod identity;
pub mod memory;
pub mod repository;
pub mod sqlite;

pub use identity::{AuthError, IdentityProvider, InMemoryIdentityProvider, SignUpOutcome};
pub use memory::InMemoryRepository;
pub use repository::{Storage, StorageError};
