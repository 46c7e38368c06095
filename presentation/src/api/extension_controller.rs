//! HTTP-facing extension operations

use super::envelope::{CONFLICT, ControllerResponse, EXTENSION_NOT_FOUND, MISSING_EXTENSION_ID};
use axum::http::StatusCode;
use mplp_application::services::extension_management::{
    ExtensionManagementService, ExtensionServiceError,
};
use mplp_domain::core::error::RepositoryError;
use mplp_domain::extension::{ExtensionQueryFilter, ExtensionStatus, ExtensionType};
use mplp_infrastructure::mappers::extension::{ExtensionCreateDto, ExtensionMapper};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::error;

/// Query string of `GET /extensions`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionListParams {
    pub context_id: Option<String>,
    pub extension_type: Option<ExtensionType>,
    pub status: Option<ExtensionStatus>,
    pub name: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl ExtensionListParams {
    fn filter(&self) -> ExtensionQueryFilter {
        ExtensionQueryFilter {
            context_id: self.context_id.clone(),
            extension_types: self.extension_type.into_iter().collect(),
            statuses: self.status.into_iter().collect(),
            name: self.name.clone(),
            ..Default::default()
        }
    }
}

/// Query string of `GET /extensions/statistics`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsParams {
    pub context_id: Option<String>,
}

pub struct ExtensionController {
    service: Arc<ExtensionManagementService>,
    default_user: String,
}

impl ExtensionController {
    pub fn new(service: Arc<ExtensionManagementService>) -> Self {
        Self {
            service,
            default_user: "system".to_string(),
        }
    }

    pub fn with_default_user(mut self, user: impl Into<String>) -> Self {
        self.default_user = user.into();
        self
    }

    pub async fn create(&self, body: Value) -> ControllerResponse {
        if let Some(field) = ExtensionMapper::missing_create_field(&body) {
            return ControllerResponse::bad_request(format!("Missing required field: {}", field));
        }
        let dto: ExtensionCreateDto = match serde_json::from_value(body) {
            Ok(dto) => dto,
            Err(e) => return ControllerResponse::bad_request(e.to_string()),
        };
        let (request, user) = ExtensionMapper::from_create_dto(dto, &self.default_user);
        match self.service.create_extension(request, &user).await {
            Ok(extension) => {
                let location = format!("/extensions/{}", extension.id());
                ControllerResponse::ok(StatusCode::CREATED, &ExtensionMapper::to_response_dto(&extension))
                    .with_location(location)
            }
            Err(e) => Self::failure(e, None),
        }
    }

    pub async fn get(&self, id: &str) -> ControllerResponse {
        if id.trim().is_empty() {
            return Self::missing_id();
        }
        match self.service.get_extension_by_id(id).await {
            Ok(extension) => ControllerResponse::ok(StatusCode::OK, &ExtensionMapper::to_response_dto(&extension)),
            Err(e) => Self::failure(e, Some(id)),
        }
    }

    pub async fn delete(&self, id: &str) -> ControllerResponse {
        if id.trim().is_empty() {
            return Self::missing_id();
        }
        match self.service.delete_extension(id).await {
            Ok(()) => ControllerResponse::no_content(),
            Err(e) => Self::failure(e, Some(id)),
        }
    }

    pub async fn list(&self, params: ExtensionListParams) -> ControllerResponse {
        let filter = params.filter();
        let result = self
            .service
            .query_extensions(&filter, params.page.unwrap_or(1), params.limit.unwrap_or(0))
            .await;
        match result {
            Ok(page) => ControllerResponse::ok(
                StatusCode::OK,
                &json!({
                    "extensions": ExtensionMapper::to_response_dto_array(&page.items),
                    "pagination": {
                        "page": page.page,
                        "limit": page.limit,
                        "total": page.total,
                        "totalPages": page.total_pages,
                    },
                }),
            ),
            Err(e) => Self::failure(e, None),
        }
    }

    pub async fn activate(&self, id: &str) -> ControllerResponse {
        match self.service.activate_extension(id, &self.default_user).await {
            Ok(extension) => ControllerResponse::ok(StatusCode::OK, &ExtensionMapper::to_response_dto(&extension)),
            Err(e) => Self::failure(e, Some(id)),
        }
    }

    pub async fn deactivate(&self, id: &str) -> ControllerResponse {
        match self.service.deactivate_extension(id, &self.default_user).await {
            Ok(extension) => ControllerResponse::ok(StatusCode::OK, &ExtensionMapper::to_response_dto(&extension)),
            Err(e) => Self::failure(e, Some(id)),
        }
    }

    pub async fn statistics(&self, params: StatisticsParams) -> ControllerResponse {
        match self.service.get_statistics(params.context_id.as_deref()).await {
            Ok(stats) => ControllerResponse::ok(StatusCode::OK, &stats),
            Err(e) => Self::failure(e, None),
        }
    }

    fn missing_id() -> ControllerResponse {
        ControllerResponse::error(StatusCode::BAD_REQUEST, MISSING_EXTENSION_ID, "Extension ID is required")
    }

    fn failure(e: ExtensionServiceError, id: Option<&str>) -> ControllerResponse {
        let conflict = matches!(
            e,
            ExtensionServiceError::Conflict(_)
                | ExtensionServiceError::Repository(RepositoryError::AlreadyExists(_))
        );
        if e.is_not_found() {
            let message = match id {
                Some(id) => format!("Extension with ID '{}' not found", id),
                None => e.to_string(),
            };
            ControllerResponse::error(StatusCode::NOT_FOUND, EXTENSION_NOT_FOUND, message)
        } else if conflict {
            ControllerResponse::error(StatusCode::CONFLICT, CONFLICT, e.to_string())
        } else if e.is_validation() {
            ControllerResponse::bad_request(e.to_string())
        } else {
            error!("Extension request failed: {}", e);
            ControllerResponse::internal()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;
    use axum::response::IntoResponse;
    use mplp_infrastructure::InMemoryExtensionRepository;

    fn controller() -> ExtensionController {
        let repo = Arc::new(InMemoryExtensionRepository::new());
        ExtensionController::new(Arc::new(ExtensionManagementService::new(repo)))
    }

    fn create_body(name: &str) -> Value {
        json!({
            "contextId": "ctx-1",
            "name": name,
            "displayName": "Audit Logger",
            "version": "1.2.0",
            "extensionType": "plugin"
        })
    }

    async fn created_id(controller: &ExtensionController, name: &str) -> String {
        let response = controller.create(create_body(name)).await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.data().unwrap()["extensionId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_sets_location() {
        let controller = controller();
        let response = controller.create(create_body("audit-logger")).await;
        assert_eq!(response.status, StatusCode::CREATED);
        let id = response.data().unwrap()["extensionId"].as_str().unwrap().to_string();
        assert_eq!(response.location.as_deref(), Some(format!("/extensions/{}", id).as_str()));
        assert_eq!(response.data().unwrap()["status"], "installed");

        let http = response.into_response();
        assert_eq!(http.headers()[LOCATION], format!("/extensions/{}", id));
    }

    #[tokio::test]
    async fn test_create_reports_missing_field() {
        let controller = controller();
        let mut body = create_body("audit-logger");
        body.as_object_mut().unwrap().remove("displayName");
        let response = controller.create(body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body.unwrap().error.unwrap().message,
            "Missing required field: displayName"
        );
    }

    #[tokio::test]
    async fn test_duplicate_name_is_conflict() {
        let controller = controller();
        created_id(&controller, "audit-logger").await;
        let response = controller.create(create_body("audit-logger")).await;
        assert_eq!(response.status, StatusCode::CONFLICT);
        assert_eq!(response.error_code(), Some("CONFLICT"));
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let controller = controller();
        let id = created_id(&controller, "audit-logger").await;

        assert_eq!(controller.get(&id).await.status, StatusCode::OK);

        let response = controller.get("  ").await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error_code(), Some("MISSING_EXTENSION_ID"));

        let response = controller.delete(&id).await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(response.body.is_none());

        let response = controller.get(&id).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.error_code(), Some("EXTENSION_NOT_FOUND"));
        assert_eq!(
            response.body.unwrap().error.unwrap().message,
            format!("Extension with ID '{}' not found", id)
        );
    }

    #[tokio::test]
    async fn test_active_extension_cannot_be_deleted() {
        let controller = controller();
        let id = created_id(&controller, "audit-logger").await;

        let response = controller.activate(&id).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.data().unwrap()["status"], "active");

        assert_eq!(controller.delete(&id).await.status, StatusCode::CONFLICT);

        let response = controller.deactivate(&id).await;
        assert_eq!(response.data().unwrap()["status"], "inactive");
        assert_eq!(controller.delete(&id).await.status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_list_and_statistics() {
        let controller = controller();
        created_id(&controller, "audit-logger").await;
        created_id(&controller, "metrics").await;

        let response = controller
            .list(ExtensionListParams {
                context_id: Some("ctx-1".into()),
                limit: Some(1),
                ..Default::default()
            })
            .await;
        let data = response.data().unwrap();
        assert_eq!(data["extensions"][0]["name"], "audit-logger");
        assert_eq!(data["pagination"]["totalPages"], 2);

        let response = controller.statistics(StatisticsParams::default()).await;
        assert_eq!(response.data().unwrap()["total_extensions"], 2);
        assert_eq!(response.data().unwrap()["by_type"]["plugin"], 2);
    }
}
