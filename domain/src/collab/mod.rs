//! Collab subdomain: multi-participant coordination sessions.
//!
//! - [`entities::CollabEntity`]: aggregate root with participant and status invariants
//! - [`coordination::CollabCoordinationService`]: strategy advisor
//! - [`repository::CollabRepository`]: persistence port

pub mod coordination;
pub mod entities;
pub mod events;
pub mod repository;
pub mod value_objects;

pub use coordination::{CollabCoordinationService, StrategyRecommendation};
pub use entities::{
    CollabEntity, CollabParticipant, CollabSnapshot, MAX_PARTICIPANTS, MIN_PARTICIPANTS,
};
pub use events::{CollabDomainEvent, CollabEventKind};
pub use repository::{
    CollabListQuery, CollabListResult, CollabRepository, CollabSearchQuery, CollabSearchResult,
    CollabSortField, Pagination, SortOrder,
};
pub use value_objects::{
    CollabMode, CollabStatus, CoordinationStrategy, CoordinationType, DecisionMaking,
    ParticipantStatus,
};
