//! Artifact API routes
//!
//! - `GET /v1/artifacts` - List artifacts (`read`)
//! - `POST /v1/artifacts` - Create an artifact (`write`)
//! - `GET|PUT|DELETE /v1/artifacts/:id` - Show, replace, delete
//! - `GET /v1/researchers/:id/artifacts` - Artifacts recovered by one researcher (`read`)

use axum::{extract::State, routing::get, Router};

use super::{validate_artifact, ArtifactFilter, ArtifactInput, SORT_SAFELIST};
use crate::api::extract::{IdParam, JsonBody};
use crate::api::response::Envelope;
use crate::api::AppState;
use crate::auth::{Read, RequirePermission, Write};
use crate::error::AppResult;
use crate::features::shared::{Filters, QueryParams, Validator};

pub fn artifacts_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/artifacts", get(list_artifacts).post(create_artifact))
        .route(
            "/v1/artifacts/:id",
            get(show_artifact).put(update_artifact).delete(delete_artifact),
        )
        .route("/v1/researchers/:id/artifacts", get(list_researcher_artifacts))
}

fn read_list_query(qs: &QueryParams) -> AppResult<(ArtifactFilter, Filters)> {
    let mut v = Validator::new();
    let filter = ArtifactFilter {
        title: qs.string("title"),
        location: qs.string("location"),
        age: qs.optional_int("age", &mut v),
    };
    let filters = Filters::parse(qs, &SORT_SAFELIST, &mut v);
    v.into_result()?;
    Ok((filter, filters))
}

/// List artifacts
///
/// # Query Parameters
///
/// - `title`, `location` - full-text filters
/// - `age` - exact age
/// - `page`, `page_size`, `sort`
///
/// # Response
///
/// - `200 OK` - `{"artifacts": [...], "metadata": {...}}`
/// - `422 Unprocessable Entity` - bad paging values or a sort outside the safelist
#[tracing::instrument(skip_all)]
async fn list_artifacts(
    _: RequirePermission<Read>,
    State(state): State<AppState>,
    qs: QueryParams,
) -> AppResult<Envelope> {
    let (filter, filters) = read_list_query(&qs)?;
    let page = state.artifacts.get_all(&filter, &filters).await?;

    Envelope::ok()
        .with("artifacts", &page.items)?
        .with("metadata", &page.metadata)
}

#[tracing::instrument(skip_all, fields(researcher_id = researcher_id))]
async fn list_researcher_artifacts(
    _: RequirePermission<Read>,
    State(state): State<AppState>,
    IdParam(researcher_id): IdParam,
    qs: QueryParams,
) -> AppResult<Envelope> {
    let (filter, filters) = read_list_query(&qs)?;
    let page = state
        .artifacts
        .get_all_for_researcher(researcher_id, &filter, &filters)
        .await?;

    Envelope::ok()
        .with("artifacts", &page.items)?
        .with("metadata", &page.metadata)
}

/// Create an artifact
///
/// # Request Body
///
/// ```json
/// { "title": "Vase", "age": 500, "location": "Site 4", "researcher_id": 1 }
/// ```
#[tracing::instrument(skip_all)]
async fn create_artifact(
    _: RequirePermission<Write>,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ArtifactInput>,
) -> AppResult<Envelope> {
    let mut v = Validator::new();
    validate_artifact(&mut v, &input);
    v.into_result()?;

    let artifact = state.artifacts.insert(&input).await?;

    tracing::info!(
        artifact_id = artifact.id,
        researcher_id = artifact.researcher_id,
        "Artifact created"
    );

    Envelope::created(format!("/v1/artifacts/{}", artifact.id)).with("artifact", &artifact)
}

#[tracing::instrument(skip_all, fields(artifact_id = id))]
async fn show_artifact(
    _: RequirePermission<Read>,
    State(state): State<AppState>,
    IdParam(id): IdParam,
) -> AppResult<Envelope> {
    let artifact = state.artifacts.get(id).await?;
    Envelope::ok().with("artifact", &artifact)
}

#[tracing::instrument(skip_all, fields(artifact_id = id))]
async fn update_artifact(
    _: RequirePermission<Write>,
    State(state): State<AppState>,
    IdParam(id): IdParam,
    JsonBody(input): JsonBody<ArtifactInput>,
) -> AppResult<Envelope> {
    let existing = state.artifacts.get(id).await?;

    let mut v = Validator::new();
    validate_artifact(&mut v, &input);
    v.into_result()?;

    let artifact = state.artifacts.update(&input.into_artifact(existing.id)).await?;

    tracing::info!(artifact_id = artifact.id, "Artifact updated");

    Envelope::ok().with("artifact", &artifact)
}

#[tracing::instrument(skip_all, fields(artifact_id = id))]
async fn delete_artifact(
    _: RequirePermission<Write>,
    State(state): State<AppState>,
    IdParam(id): IdParam,
) -> AppResult<Envelope> {
    state.artifacts.delete(id).await?;

    tracing::info!(artifact_id = id, "Artifact deleted");

    Ok(Envelope::message("artifact successfully deleted"))
}
