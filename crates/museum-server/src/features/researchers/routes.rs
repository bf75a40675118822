//! Researcher API routes
//!
//! - `GET /v1/researchers` - List researchers (`read`)
//! - `POST /v1/researchers` - Create a researcher (`write`)
//! - `GET /v1/researchers/:id` - Show one researcher (`read`)
//! - `PUT /v1/researchers/:id` - Replace a researcher (`write`)
//! - `DELETE /v1/researchers/:id` - Delete a researcher and everything they own (`write`)

use axum::{extract::State, routing::get, Router};

use super::{validate_researcher, ResearcherFilter, ResearcherInput, SORT_SAFELIST};
use crate::api::extract::{IdParam, JsonBody};
use crate::api::response::Envelope;
use crate::api::AppState;
use crate::auth::{Read, RequirePermission, Write};
use crate::error::AppResult;
use crate::features::shared::{Filters, QueryParams, Validator};

pub fn researchers_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/researchers", get(list_researchers).post(create_researcher))
        .route(
            "/v1/researchers/:id",
            get(show_researcher)
                .put(update_researcher)
                .delete(delete_researcher),
        )
}

/// List researchers
///
/// # Query Parameters
///
/// - `name`, `specialization` - full-text filters
/// - `page`, `page_size`, `sort` - see [`Filters`]
#[tracing::instrument(skip_all)]
async fn list_researchers(
    _: RequirePermission<Read>,
    State(state): State<AppState>,
    qs: QueryParams,
) -> AppResult<Envelope> {
    let mut v = Validator::new();
    let filter = ResearcherFilter {
        name: qs.string("name"),
        specialization: qs.string("specialization"),
    };
    let filters = Filters::parse(&qs, &SORT_SAFELIST, &mut v);
    v.into_result()?;

    let page = state.researchers.get_all(&filter, &filters).await?;

    Envelope::ok()
        .with("researchers", &page.items)?
        .with("metadata", &page.metadata)
}

/// Create a researcher
///
/// # Request Body
///
/// ```json
/// { "name": "A. Lee", "specialization": "ceramics", "project": "Dig Site 4" }
/// ```
///
/// # Response
///
/// - `201 Created` with `Location: /v1/researchers/{id}`
/// - `400 Bad Request` - malformed JSON or unknown field
/// - `422 Unprocessable Entity` - validation error
#[tracing::instrument(skip_all)]
async fn create_researcher(
    _: RequirePermission<Write>,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ResearcherInput>,
) -> AppResult<Envelope> {
    let mut v = Validator::new();
    validate_researcher(&mut v, &input);
    v.into_result()?;

    let researcher = state.researchers.insert(&input).await?;

    tracing::info!(researcher_id = researcher.id, "Researcher created");

    Envelope::created(format!("/v1/researchers/{}", researcher.id))
        .with("researcher", &researcher)
}

#[tracing::instrument(skip_all, fields(researcher_id = id))]
async fn show_researcher(
    _: RequirePermission<Read>,
    State(state): State<AppState>,
    IdParam(id): IdParam,
) -> AppResult<Envelope> {
    let researcher = state.researchers.get(id).await?;
    Envelope::ok().with("researcher", &researcher)
}

/// Replace all fields of a researcher
///
/// # Response
///
/// - `200 OK` - updated record
/// - `404 Not Found` - no researcher with this id
/// - `422 Unprocessable Entity` - validation error
#[tracing::instrument(skip_all, fields(researcher_id = id))]
async fn update_researcher(
    _: RequirePermission<Write>,
    State(state): State<AppState>,
    IdParam(id): IdParam,
    JsonBody(input): JsonBody<ResearcherInput>,
) -> AppResult<Envelope> {
    let existing = state.researchers.get(id).await?;

    let mut v = Validator::new();
    validate_researcher(&mut v, &input);
    v.into_result()?;

    let researcher = state
        .researchers
        .update(&input.into_researcher(existing.id))
        .await?;

    tracing::info!(researcher_id = researcher.id, "Researcher updated");

    Envelope::ok().with("researcher", &researcher)
}

#[tracing::instrument(skip_all, fields(researcher_id = id))]
async fn delete_researcher(
    _: RequirePermission<Write>,
    State(state): State<AppState>,
    IdParam(id): IdParam,
) -> AppResult<Envelope> {
    state.researchers.delete(id).await?;

    tracing::info!(researcher_id = id, "Researcher deleted");

    Ok(Envelope::message("researcher successfully deleted"))
}
