//! Process-local repository implementations

mod collab;
mod extension;

pub use collab::InMemoryCollabRepository;
pub use extension::InMemoryExtensionRepository;
