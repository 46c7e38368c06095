//! Collab repository trait and query types

use super::entities::CollabEntity;
use super::value_objects::{CollabMode, CollabStatus};
use crate::core::error::RepositoryError;
use crate::util::wire_enum;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

wire_enum! {
    /// Field a collaboration listing is sorted on
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
    pub enum CollabSortField {
        #[default]
        CreatedAt => "created_at",
        UpdatedAt => "updated_at",
        Name => "name",
        Status => "status",
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
    pub enum SortOrder {
        Asc => "asc",
        #[default]
        Desc => "desc",
    }
}

/// Filters, sorting, and pagination for [`CollabRepository::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollabListQuery {
    pub page: usize,
    pub limit: usize,
    pub status: Option<CollabStatus>,
    pub mode: Option<CollabMode>,
    pub context_id: Option<String>,
    pub plan_id: Option<String>,
    pub participant_id: Option<String>,
    pub sort_by: CollabSortField,
    pub sort_order: SortOrder,
}

impl Default for CollabListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            status: None,
            mode: None,
            context_id: None,
            plan_id: None,
            participant_id: None,
            sort_by: CollabSortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl CollabListQuery {
    /// Clamp page to at least 1 and limit to `1..=MAX_PAGE_SIZE`
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn offset(&self) -> usize {
        (self.page.max(1) - 1) * self.limit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl Pagination {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }

    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone)]
pub struct CollabListResult {
    pub items: Vec<CollabEntity>,
    pub pagination: Pagination,
}

/// Free-text search with optional filters
#[derive(Debug, Clone, Default)]
pub struct CollabSearchQuery {
    pub query: String,
    pub statuses: Vec<CollabStatus>,
    pub modes: Vec<CollabMode>,
    pub created_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct CollabSearchResult {
    pub items: Vec<CollabEntity>,
    pub pagination: Pagination,
    pub total_matches: usize,
    pub execution_time_ms: u64,
}

/// Repository trait for collaborations
///
/// One repository per aggregate root. Implementations live in the
/// infrastructure layer.
#[async_trait]
pub trait CollabRepository: Send + Sync {
    /// Insert a new collaboration; fails if the ID is taken
    async fn save(&self, entity: &CollabEntity) -> Result<(), RepositoryError>;

    /// Replace an existing collaboration; fails if it does not exist
    async fn update(&self, entity: &CollabEntity) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<CollabEntity>, RepositoryError>;

    /// Missing IDs are skipped
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<CollabEntity>, RepositoryError>;

    /// Delete by ID; fails if it does not exist
    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;

    async fn exists(&self, id: &str) -> Result<bool, RepositoryError>;

    async fn list(&self, query: &CollabListQuery) -> Result<CollabListResult, RepositoryError>;

    async fn search(&self, query: &CollabSearchQuery)
    -> Result<CollabSearchResult, RepositoryError>;

    /// Count matching collaborations, ignoring pagination
    async fn count(&self, query: Option<&CollabListQuery>) -> Result<usize, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_normalization() {
        let query = CollabListQuery {
            page: 0,
            limit: 500,
            ..Default::default()
        }
        .normalized();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, MAX_PAGE_SIZE);

        let query = CollabListQuery {
            limit: 0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(query.limit, 1);
    }

    #[test]
    fn test_offset() {
        let query = CollabListQuery {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn test_pagination_pages() {
        let pagination = Pagination::new(1, 10, 25);
        assert_eq!(pagination.total_pages, 3);
        assert!(pagination.has_more());
        assert!(!Pagination::new(3, 10, 25).has_more());
        assert_eq!(Pagination::new(1, 10, 0).total_pages, 0);
    }

    #[test]
    fn test_sort_defaults() {
        let query = CollabListQuery::default();
        assert_eq!(query.sort_by, CollabSortField::CreatedAt);
        assert_eq!(query.sort_order, SortOrder::Desc);
        assert_eq!("updated_at".parse::<CollabSortField>().unwrap(), CollabSortField::UpdatedAt);
    }
}
