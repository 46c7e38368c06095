//! Schema and DTO mappers
//!
//! Stored and exchanged documents use snake_case (`*Schema`); API bodies
//! use camelCase (`*Dto`). Mappers translate between both and the domain
//! aggregates.

pub mod collab;
pub mod extension;

pub use collab::{CollabCreateDto, CollabMapper, CollabResponseDto, CollabSchema, CollabUpdateDto};
pub use extension::{ExtensionCreateDto, ExtensionMapper, ExtensionResponseDto, ExtensionSchema};
