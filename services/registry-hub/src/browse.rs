//! Image and tag routes, proxied to stored registries

use axum::Router;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use registry_client::RegistryUrl;
use registry_store::Registry;
use serde::Serialize;

use crate::api::Hub;
use crate::envelope::{self, ApiResult};
use crate::error::{HubError, HubResult};

/// Router for browsing stored registries
pub(crate) fn router() -> Router<Hub> {
    Router::new()
        .route("/api/images/{id}", get(list_images))
        .route("/api/tags/{id}/{*name}", get(list_tags))
        .route("/api/image/{id}/{*name}", get(image_detail))
}

/// A tag of an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    /// Tag name
    pub name: String,
}

/// An image and its tags
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Repository name
    pub name: String,

    /// Tags, highest name first
    pub tags: Vec<Tag>,

    /// `docker pull` command for the first tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_command: Option<String>,

    /// Source repository of the first tag, from its image config labels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_repository_url: Option<String>,
}

/// Sort tags by name, highest first.
fn sorted_tags(names: Vec<String>) -> Vec<Tag> {
    let mut tags: Vec<Tag> = names.into_iter().map(|name| Tag { name }).collect();
    tags.sort_by(|a, b| b.name.cmp(&a.name));
    tags
}

fn pull_command(registry: &Registry, name: &str, tags: &[Tag]) -> Option<String> {
    let tag = tags.first()?;
    let reference = RegistryUrl::parse(&registry.url)
        .map(|url| url.reference().to_owned())
        .unwrap_or_else(|_| registry.url.clone());
    Some(format!("docker pull {reference}/{name}:{}", tag.name))
}

/// Turn a browse failure into either an envelope or a bare error status.
fn upstream_failure(error: registry_client::Error) -> HubResult<Response> {
    use registry_client::Error;

    let (status, message) = match error {
        Error::Unauthorized => (StatusCode::UNAUTHORIZED, envelope::UNAUTHORIZED),
        Error::NotFound => (StatusCode::NOT_FOUND, envelope::IMAGE_NOT_FOUND),
        Error::InvalidRepository(_) => (StatusCode::BAD_REQUEST, envelope::INVALID_IMAGE),
        error => return Err(HubError::Upstream(error)),
    };

    Ok(ApiResult::failure(status, message).into_response())
}

fn registry_not_found() -> HubResult<Response> {
    Ok(ApiResult::failure(StatusCode::NOT_FOUND, envelope::REGISTRY_NOT_FOUND).into_response())
}

/// Look up the source repository for a tag, treating any failure as unknown.
async fn source_repository(
    hub: &Hub,
    registry: &Registry,
    name: &str,
    tag: &Tag,
) -> Option<String> {
    match hub.client.source_repository(registry, name, &tag.name).await {
        Ok(source) => source,
        Err(error) => {
            tracing::warn!(%error, tag = %tag.name, "could not read image config");
            None
        }
    }
}

/// List the repositories of a registry
#[tracing::instrument(skip(hub))]
async fn list_images(
    State(hub): State<Hub>,
    id: Result<Path<u64>, PathRejection>,
) -> HubResult<Response> {
    let Ok(Path(id)) = id else {
        return registry_not_found();
    };
    let Some(registry) = hub.store.get(id).await else {
        return registry_not_found();
    };

    match hub.client.catalog(&registry).await {
        Ok(repositories) => Ok(ApiResult::success(repositories).into_response()),
        Err(error) => upstream_failure(error),
    }
}

/// List the tags of a repository
#[tracing::instrument(skip(hub))]
async fn list_tags(
    State(hub): State<Hub>,
    path: Result<Path<(u64, String)>, PathRejection>,
) -> HubResult<Response> {
    let Ok(Path((id, name))) = path else {
        return registry_not_found();
    };
    let Some(registry) = hub.store.get(id).await else {
        return registry_not_found();
    };

    match hub.client.tags(&registry, &name).await {
        Ok(tags) => Ok(ApiResult::success(sorted_tags(tags)).into_response()),
        Err(error) => upstream_failure(error),
    }
}

/// Describe a repository: its tags and how to pull it
#[tracing::instrument(skip(hub))]
async fn image_detail(
    State(hub): State<Hub>,
    path: Result<Path<(u64, String)>, PathRejection>,
) -> HubResult<Response> {
    let Ok(Path((id, name))) = path else {
        return registry_not_found();
    };
    let Some(registry) = hub.store.get(id).await else {
        return registry_not_found();
    };

    let tags = match hub.client.tags(&registry, &name).await {
        Ok(tags) => sorted_tags(tags),
        Err(error) => return upstream_failure(error),
    };

    let source_repository_url = match tags.first() {
        Some(tag) => source_repository(&hub, &registry, &name, tag).await,
        None => None,
    };

    let image = Image {
        pull_command: pull_command(&registry, &name, &tags),
        source_repository_url,
        name,
        tags,
    };
    Ok(ApiResult::success(image).into_response())
}
