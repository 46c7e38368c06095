//! axum routes under `/api/v1`

use super::collab_controller::{CollabController, CollabListParams, CollabSearchParams};
use super::envelope::ControllerResponse;
use super::extension_controller::{ExtensionController, ExtensionListParams, StatisticsParams};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub collab: Arc<CollabController>,
    pub extension: Arc<ExtensionController>,
}

impl ApiState {
    pub fn new(collab: CollabController, extension: ExtensionController) -> Self {
        Self {
            collab: Arc::new(collab),
            extension: Arc::new(extension),
        }
    }
}

pub fn router(state: ApiState) -> Router {
    let api = Router::new()
        .route("/collaborations", post(create_collab).get(list_collabs))
        .route("/collaborations/search", get(search_collabs))
        .route(
            "/collaborations/{id}",
            get(get_collab).put(update_collab).delete(delete_collab),
        )
        .route("/collaborations/{id}/start", post(start_collab))
        .route("/collaborations/{id}/stop", post(stop_collab))
        .route("/collaborations/{id}/status", get(collab_status))
        .route("/extensions", post(create_extension).get(list_extensions))
        .route("/extensions/statistics", get(extension_statistics))
        .route("/extensions/{id}", get(get_extension).delete(delete_extension))
        .route("/extensions/{id}/activate", post(activate_extension))
        .route("/extensions/{id}/deactivate", post(deactivate_extension))
        .with_state(state);

    Router::new().nest("/api/v1", api)
}

// ==================== Collaborations ====================

async fn create_collab(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ControllerResponse {
    match body {
        Ok(Json(body)) => state.collab.create(body).await,
        Err(rejection) => ControllerResponse::bad_request(rejection.body_text()),
    }
}

async fn list_collabs(
    State(state): State<ApiState>,
    params: Result<Query<CollabListParams>, QueryRejection>,
) -> ControllerResponse {
    match params {
        Ok(Query(params)) => state.collab.list(params).await,
        Err(rejection) => ControllerResponse::bad_request(rejection.body_text()),
    }
}

async fn search_collabs(
    State(state): State<ApiState>,
    params: Result<Query<CollabSearchParams>, QueryRejection>,
) -> ControllerResponse {
    match params {
        Ok(Query(params)) => state.collab.search(params).await,
        Err(rejection) => ControllerResponse::bad_request(rejection.body_text()),
    }
}

async fn get_collab(State(state): State<ApiState>, Path(id): Path<String>) -> ControllerResponse {
    state.collab.get(&id).await
}

async fn update_collab(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ControllerResponse {
    match body {
        Ok(Json(body)) => state.collab.update(&id, body).await,
        Err(rejection) => ControllerResponse::bad_request(rejection.body_text()),
    }
}

async fn delete_collab(State(state): State<ApiState>, Path(id): Path<String>) -> ControllerResponse {
    state.collab.delete(&id).await
}

async fn start_collab(State(state): State<ApiState>, Path(id): Path<String>) -> ControllerResponse {
    state.collab.start(&id).await
}

async fn stop_collab(State(state): State<ApiState>, Path(id): Path<String>) -> ControllerResponse {
    state.collab.stop(&id).await
}

async fn collab_status(State(state): State<ApiState>, Path(id): Path<String>) -> ControllerResponse {
    state.collab.status(&id).await
}

// ==================== Extensions ====================

async fn create_extension(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ControllerResponse {
    match body {
        Ok(Json(body)) => state.extension.create(body).await,
        Err(rejection) => ControllerResponse::bad_request(rejection.body_text()),
    }
}

async fn list_extensions(
    State(state): State<ApiState>,
    params: Result<Query<ExtensionListParams>, QueryRejection>,
) -> ControllerResponse {
    match params {
        Ok(Query(params)) => state.extension.list(params).await,
        Err(rejection) => ControllerResponse::bad_request(rejection.body_text()),
    }
}

async fn extension_statistics(
    State(state): State<ApiState>,
    params: Result<Query<StatisticsParams>, QueryRejection>,
) -> ControllerResponse {
    match params {
        Ok(Query(params)) => state.extension.statistics(params).await,
        Err(rejection) => ControllerResponse::bad_request(rejection.body_text()),
    }
}

async fn get_extension(State(state): State<ApiState>, Path(id): Path<String>) -> ControllerResponse {
    state.extension.get(&id).await
}

async fn delete_extension(State(state): State<ApiState>, Path(id): Path<String>) -> ControllerResponse {
    state.extension.delete(&id).await
}

async fn activate_extension(State(state): State<ApiState>, Path(id): Path<String>) -> ControllerResponse {
    state.extension.activate(&id).await
}

async fn deactivate_extension(State(state): State<ApiState>, Path(id): Path<String>) -> ControllerResponse {
    state.extension.deactivate(&id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use mplp_application::services::collab_management::CollabManagementService;
    use mplp_application::services::extension_management::ExtensionManagementService;
    use mplp_infrastructure::{InMemoryCollabRepository, InMemoryExtensionRepository};
    use serde_json::json;
    use tower::ServiceExt;

    fn app() -> Router {
        let collab = CollabManagementService::new(Arc::new(InMemoryCollabRepository::new()));
        let extension = ExtensionManagementService::new(Arc::new(InMemoryExtensionRepository::new()));
        router(ApiState::new(
            CollabController::new(Arc::new(collab)),
            ExtensionController::new(Arc::new(extension)),
        ))
    }

    fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_collaboration_lifecycle_over_http() {
        let app = app();
        let body = json!({
            "contextId": "ctx-1",
            "planId": "plan-1",
            "name": "Release train",
            "mode": "sequential",
            "coordinationStrategy": {"type": "distributed", "decisionMaking": "consensus"},
            "participants": [
                {"agentId": "agent-1", "roleId": "lead"},
                {"agentId": "agent-2", "roleId": "dev"}
            ]
        });

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/collaborations", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["success"], true);
        let id = created["data"]["collaborationId"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(empty_request("GET", &format!("/api/v1/collaborations/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/api/v1/collaborations?page=1&limit=5"))
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed["data"]["pagination"]["total"], 1);

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", &format!("/api/v1/collaborations/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(empty_request("GET", &format!("/api/v1/collaborations/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let missing = body_json(response).await;
        assert_eq!(missing["success"], false);
        assert_eq!(missing["error"]["code"], "COLLAB_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/collaborations")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_extension_routes() {
        let app = app();
        let body = json!({
            "contextId": "ctx-1",
            "name": "audit-logger",
            "displayName": "Audit Logger",
            "version": "1.0.0",
            "extensionType": "plugin"
        });

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/extensions", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
        let created = body_json(response).await;
        let id = created["data"]["extensionId"].as_str().unwrap().to_string();
        assert_eq!(location, format!("/extensions/{}", id));

        let response = app
            .clone()
            .oneshot(empty_request("POST", &format!("/api/v1/extensions/{}/activate", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/api/v1/extensions/statistics?contextId=ctx-1"))
            .await
            .unwrap();
        let stats = body_json(response).await;
        assert_eq!(stats["data"]["active_extensions"], 1);

        let response = app
            .clone()
            .oneshot(empty_request("POST", &format!("/api/v1/extensions/{}/deactivate", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", &format!("/api/v1/extensions/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(empty_request("GET", &format!("/api/v1/extensions/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
