//! Registry list routes

use axum::Json;
use axum::Router;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use registry_client::{Credential, ProbeOutcome, RegistryUrl};
use registry_store::{NewRegistry, Registry};
use serde::Deserialize;

use crate::api::Hub;
use crate::envelope::{self, ApiResult};
use crate::error::HubResult;

/// Router for the registry list
pub(crate) fn router() -> Router<Hub> {
    Router::new()
        .route(
            "/api/registry",
            get(list_registries)
                .post(create_registry)
                .fallback(unsupported_method),
        )
        .route(
            "/api/registry/{id}",
            get(get_registry).fallback(unsupported_method),
        )
}

/// Body of a registry creation request
#[derive(Debug, Deserialize)]
struct CreateRegistry {
    name: String,
    url: String,
}

/// List every registry, as a bare array
async fn list_registries(State(hub): State<Hub>) -> Json<Vec<Registry>> {
    Json(hub.store.list().await)
}

/// Validate a registry and store it
#[tracing::instrument(skip_all)]
async fn create_registry(
    State(hub): State<Hub>,
    headers: HeaderMap,
    body: Result<Json<CreateRegistry>, JsonRejection>,
) -> HubResult<Response> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(%rejection, "rejected registry body");
            return Ok(ApiResult::failure(StatusCode::BAD_REQUEST, envelope::INVALID_BODY)
                .into_response());
        }
    };

    let url = match RegistryUrl::parse(&request.url) {
        Ok(url) => url,
        Err(error) => {
            tracing::debug!(url = %request.url, %error, "rejected registry url");
            return Ok(invalid_url());
        }
    };

    let credential = match headers
        .get(header::AUTHORIZATION)
        .map(Credential::from_header)
        .transpose()
    {
        Ok(credential) => credential,
        Err(error) => {
            tracing::debug!(%error, "rejected authorization header");
            return Ok(unauthorized());
        }
    };

    match hub.client.probe(&url, credential.as_ref()).await {
        ProbeOutcome::Reachable => {
            let mut entry = NewRegistry::new(request.name, url.base());
            if let Some(token) = credential.as_ref().and_then(Credential::token) {
                entry = entry.token(token.clone());
            }

            let registry = hub.store.append(entry).await?;
            Ok(ApiResult::success(registry).into_response())
        }
        ProbeOutcome::Unauthorized => Ok(unauthorized()),
        ProbeOutcome::InvalidUrl => Ok(invalid_url()),
        ProbeOutcome::OtherFailure(failure) => Err(failure.into()),
    }
}

/// Look up one registry
async fn get_registry(
    State(hub): State<Hub>,
    id: Result<Path<u64>, PathRejection>,
) -> Response {
    let registry = match id {
        Ok(Path(id)) => hub.store.get(id).await,
        Err(rejection) => {
            tracing::debug!(%rejection, "rejected registry id");
            None
        }
    };

    match registry {
        Some(registry) => ApiResult::success(registry).into_response(),
        None => {
            ApiResult::failure(StatusCode::NOT_FOUND, envelope::REGISTRY_NOT_FOUND).into_response()
        }
    }
}

async fn unsupported_method() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn unauthorized() -> Response {
    ApiResult::failure(StatusCode::UNAUTHORIZED, envelope::UNAUTHORIZED).into_response()
}

fn invalid_url() -> Response {
    ApiResult::failure(StatusCode::BAD_REQUEST, envelope::INVALID_URL).into_response()
}
