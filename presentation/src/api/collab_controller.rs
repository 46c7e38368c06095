//! HTTP-facing collaboration operations
//!
//! Takes raw JSON bodies, maps them through the camelCase DTOs, calls
//! [`CollabManagementService`], and answers with `(status, envelope)`.

use super::envelope::{ACCESS_DENIED, COLLAB_NOT_FOUND, ControllerResponse};
use axum::http::StatusCode;
use mplp_application::services::collab_management::{CollabManagementService, CollabServiceError};
use mplp_application::services::collab_monitoring::CollabMonitoringService;
use mplp_application::services::collab_security::CollabSecurityService;
use mplp_domain::collab::{
    CollabListQuery, CollabMode, CollabSearchQuery, CollabSortField, CollabStatus, Pagination,
    SortOrder,
};
use mplp_infrastructure::mappers::collab::{CollabCreateDto, CollabMapper, CollabUpdateDto};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, warn};

/// Query string of `GET /collaborations`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollabListParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub status: Option<CollabStatus>,
    pub mode: Option<CollabMode>,
    pub context_id: Option<String>,
    pub plan_id: Option<String>,
    pub participant_id: Option<String>,
    pub sort_by: Option<CollabSortField>,
    pub sort_order: Option<SortOrder>,
}

/// Query string of `GET /collaborations/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollabSearchParams {
    pub q: String,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

pub struct CollabController {
    service: Arc<CollabManagementService>,
    security: Option<Arc<CollabSecurityService>>,
    monitoring: Option<Arc<CollabMonitoringService>>,
    default_user: String,
}

impl CollabController {
    pub fn new(service: Arc<CollabManagementService>) -> Self {
        Self {
            service,
            security: None,
            monitoring: None,
            default_user: "system".to_string(),
        }
    }

    /// Gate mutating operations on an existing collaboration behind
    /// access checks
    pub fn with_security(mut self, security: Arc<CollabSecurityService>) -> Self {
        self.security = Some(security);
        self
    }

    /// Start monitoring collaborations when they start, stop when they stop
    pub fn with_monitoring(mut self, monitoring: Arc<CollabMonitoringService>) -> Self {
        self.monitoring = Some(monitoring);
        self
    }

    pub fn with_default_user(mut self, user: impl Into<String>) -> Self {
        self.default_user = user.into();
        self
    }

    pub async fn create(&self, body: Value) -> ControllerResponse {
        let dto: CollabCreateDto = match serde_json::from_value(body) {
            Ok(dto) => dto,
            Err(e) => return ControllerResponse::bad_request(e.to_string()),
        };
        let request = CollabMapper::from_create_dto(dto, &self.default_user);
        match self.service.create_collaboration(request).await {
            Ok(collab) => ControllerResponse::ok(StatusCode::CREATED, &CollabMapper::to_response_dto(&collab)),
            Err(e) => Self::failure(e),
        }
    }

    pub async fn get(&self, id: &str) -> ControllerResponse {
        match self.service.get_collaboration(id).await {
            Ok(Some(collab)) => ControllerResponse::ok(StatusCode::OK, &CollabMapper::to_response_dto(&collab)),
            Ok(None) => Self::not_found(),
            Err(e) => Self::failure(e),
        }
    }

    pub async fn update(&self, id: &str, body: Value) -> ControllerResponse {
        let dto: CollabUpdateDto = match serde_json::from_value(body) {
            Ok(dto) => dto,
            Err(e) => return ControllerResponse::bad_request(e.to_string()),
        };
        let request = CollabMapper::from_update_dto(dto, &self.default_user);
        if let Some(denied) = self.authorize("update", id, &request.updated_by).await {
            return denied;
        }
        match self.service.update_collaboration(id, request).await {
            Ok(collab) => ControllerResponse::ok(StatusCode::OK, &CollabMapper::to_response_dto(&collab)),
            Err(e) => Self::failure(e),
        }
    }

    pub async fn delete(&self, id: &str) -> ControllerResponse {
        if let Some(denied) = self.authorize("delete", id, &self.default_user).await {
            return denied;
        }
        match self.service.delete_collaboration(id).await {
            Ok(()) => ControllerResponse::ok(
                StatusCode::OK,
                &json!({ "collaborationId": id, "deleted": true }),
            ),
            Err(e) => Self::failure(e),
        }
    }

    pub async fn list(&self, params: CollabListParams) -> ControllerResponse {
        let defaults = CollabListQuery {
            limit: self.service.policy().default_page_size,
            ..Default::default()
        };
        let query = CollabListQuery {
            page: params.page.unwrap_or(defaults.page),
            limit: params.limit.unwrap_or(defaults.limit),
            status: params.status,
            mode: params.mode,
            context_id: params.context_id,
            plan_id: params.plan_id,
            participant_id: params.participant_id,
            sort_by: params.sort_by.unwrap_or(defaults.sort_by),
            sort_order: params.sort_order.unwrap_or(defaults.sort_order),
        };
        match self.service.list_collaborations(query).await {
            Ok(result) => ControllerResponse::ok(
                StatusCode::OK,
                &json!({
                    "collaborations": CollabMapper::to_response_dto_array(&result.items),
                    "pagination": pagination_json(&result.pagination),
                }),
            ),
            Err(e) => Self::failure(e),
        }
    }

    pub async fn search(&self, params: CollabSearchParams) -> ControllerResponse {
        let query = CollabSearchQuery {
            query: params.q,
            page: params.page.unwrap_or(1),
            limit: params.limit.unwrap_or(0),
            ..Default::default()
        };
        match self.service.search_collaborations(query).await {
            Ok(result) => ControllerResponse::ok(
                StatusCode::OK,
                &json!({
                    "collaborations": CollabMapper::to_response_dto_array(&result.items),
                    "pagination": pagination_json(&result.pagination),
                    "totalMatches": result.total_matches,
                    "executionTimeMs": result.execution_time_ms,
                }),
            ),
            Err(e) => Self::failure(e),
        }
    }

    pub async fn start(&self, id: &str) -> ControllerResponse {
        if let Some(denied) = self.authorize("start", id, &self.default_user).await {
            return denied;
        }
        match self.service.start_collaboration(id, &self.default_user).await {
            Ok(collab) => {
                if let Some(monitoring) = &self.monitoring
                    && let Err(e) = monitoring.start_monitoring(id).await
                {
                    warn!("Monitoring not started for {}: {}", id, e);
                }
                ControllerResponse::ok(StatusCode::OK, &CollabMapper::to_response_dto(&collab))
            }
            Err(e) => Self::failure(e),
        }
    }

    pub async fn stop(&self, id: &str) -> ControllerResponse {
        if let Some(denied) = self.authorize("stop", id, &self.default_user).await {
            return denied;
        }
        match self.service.stop_collaboration(id, &self.default_user).await {
            Ok(collab) => {
                if let Some(monitoring) = &self.monitoring {
                    monitoring.stop_monitoring(id).await;
                }
                ControllerResponse::ok(StatusCode::OK, &CollabMapper::to_response_dto(&collab))
            }
            Err(e) => Self::failure(e),
        }
    }

    pub async fn status(&self, id: &str) -> ControllerResponse {
        match self.service.get_collaboration_status(id).await {
            Ok(report) => ControllerResponse::ok(
                StatusCode::OK,
                &json!({
                    "collaborationId": report.collaboration_id,
                    "status": report.status,
                    "participantCount": report.participant_count,
                    "activeParticipants": report.active_participants,
                    "lastActivity": report.last_activity,
                    "healthScore": report.health_score,
                }),
            ),
            Err(e) => Self::failure(e),
        }
    }

    /// `Some(403)` when the security service refuses `action`
    async fn authorize(&self, action: &str, id: &str, user: &str) -> Option<ControllerResponse> {
        let security = self.security.as_ref()?;
        let decision = security.validate_access(action, id, user).await;
        if decision.granted {
            return None;
        }
        Some(ControllerResponse::error(
            StatusCode::FORBIDDEN,
            ACCESS_DENIED,
            decision.reason.unwrap_or_else(|| "Access denied".to_string()),
        ))
    }

    fn not_found() -> ControllerResponse {
        ControllerResponse::error(StatusCode::NOT_FOUND, COLLAB_NOT_FOUND, "Collaboration not found")
    }

    fn failure(e: CollabServiceError) -> ControllerResponse {
        if e.is_not_found() {
            Self::not_found()
        } else if e.is_validation() {
            ControllerResponse::bad_request(e.to_string())
        } else {
            error!("Collaboration request failed: {}", e);
            ControllerResponse::internal()
        }
    }
}

fn pagination_json(p: &Pagination) -> Value {
    json!({
        "page": p.page,
        "limit": p.limit,
        "total": p.total,
        "totalPages": p.total_pages,
        "hasMore": p.has_more(),
    })
}
