//! Expedition API routes
//!
//! - `GET /v1/expeditions` - List expeditions (`read`)
//! - `POST /v1/expeditions` - Create an expedition (`write`)
//! - `GET|PUT|DELETE /v1/expeditions/:id` - Show, replace, delete
//! - `GET /v1/researchers/:id/expeditions` - Expeditions led by one researcher (`read`)

use axum::{extract::State, routing::get, Router};

use super::{validate_expedition, ExpeditionFilter, ExpeditionInput, SORT_SAFELIST};
use crate::api::extract::{IdParam, JsonBody};
use crate::api::response::Envelope;
use crate::api::AppState;
use crate::auth::{Read, RequirePermission, Write};
use crate::error::AppResult;
use crate::features::shared::{Filters, QueryParams, Validator};

pub fn expeditions_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/expeditions", get(list_expeditions).post(create_expedition))
        .route(
            "/v1/expeditions/:id",
            get(show_expedition)
                .put(update_expedition)
                .delete(delete_expedition),
        )
        .route("/v1/researchers/:id/expeditions", get(list_researcher_expeditions))
}

/// Shared query-string handling of both list endpoints
fn read_list_query(qs: &QueryParams) -> AppResult<(ExpeditionFilter, Filters)> {
    let mut v = Validator::new();
    let filter = ExpeditionFilter {
        title: qs.string("title"),
        expedition_year: qs.optional_int("expedition_year", &mut v),
    };
    let filters = Filters::parse(qs, &SORT_SAFELIST, &mut v);
    v.into_result()?;
    Ok((filter, filters))
}

/// List expeditions
///
/// # Query Parameters
///
/// - `title` - full-text filter
/// - `expedition_year` - exact year
/// - `page`, `page_size`, `sort`
#[tracing::instrument(skip_all)]
async fn list_expeditions(
    _: RequirePermission<Read>,
    State(state): State<AppState>,
    qs: QueryParams,
) -> AppResult<Envelope> {
    let (filter, filters) = read_list_query(&qs)?;
    let page = state.expeditions.get_all(&filter, &filters).await?;

    Envelope::ok()
        .with("expeditions", &page.items)?
        .with("metadata", &page.metadata)
}

#[tracing::instrument(skip_all, fields(researcher_id = researcher_id))]
async fn list_researcher_expeditions(
    _: RequirePermission<Read>,
    State(state): State<AppState>,
    IdParam(researcher_id): IdParam,
    qs: QueryParams,
) -> AppResult<Envelope> {
    let (filter, filters) = read_list_query(&qs)?;
    let page = state
        .expeditions
        .get_all_for_researcher(researcher_id, &filter, &filters)
        .await?;

    Envelope::ok()
        .with("expeditions", &page.items)?
        .with("metadata", &page.metadata)
}

/// Create an expedition
///
/// # Request Body
///
/// ```json
/// { "title": "Delta Survey", "expeditionYear": 1998, "researcher_id": 3 }
/// ```
///
/// # Response
///
/// - `201 Created` with `Location: /v1/expeditions/{id}`
/// - `422 Unprocessable Entity` - validation error or unknown `researcher_id`
#[tracing::instrument(skip_all)]
async fn create_expedition(
    _: RequirePermission<Write>,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ExpeditionInput>,
) -> AppResult<Envelope> {
    let mut v = Validator::new();
    validate_expedition(&mut v, &input);
    v.into_result()?;

    let expedition = state.expeditions.insert(&input).await?;

    tracing::info!(
        expedition_id = expedition.id,
        researcher_id = expedition.researcher_id,
        "Expedition created"
    );

    Envelope::created(format!("/v1/expeditions/{}", expedition.id))
        .with("expedition", &expedition)
}

#[tracing::instrument(skip_all, fields(expedition_id = id))]
async fn show_expedition(
    _: RequirePermission<Read>,
    State(state): State<AppState>,
    IdParam(id): IdParam,
) -> AppResult<Envelope> {
    let expedition = state.expeditions.get(id).await?;
    Envelope::ok().with("expedition", &expedition)
}

#[tracing::instrument(skip_all, fields(expedition_id = id))]
async fn update_expedition(
    _: RequirePermission<Write>,
    State(state): State<AppState>,
    IdParam(id): IdParam,
    JsonBody(input): JsonBody<ExpeditionInput>,
) -> AppResult<Envelope> {
    let existing = state.expeditions.get(id).await?;

    let mut v = Validator::new();
    validate_expedition(&mut v, &input);
    v.into_result()?;

    let expedition = state
        .expeditions
        .update(&input.into_expedition(existing.id))
        .await?;

    tracing::info!(expedition_id = expedition.id, "Expedition updated");

    Envelope::ok().with("expedition", &expedition)
}

#[tracing::instrument(skip_all, fields(expedition_id = id))]
async fn delete_expedition(
    _: RequirePermission<Write>,
    State(state): State<AppState>,
    IdParam(id): IdParam,
) -> AppResult<Envelope> {
    state.expeditions.delete(id).await?;

    tracing::info!(expedition_id = id, "Expedition deleted");

    Ok(Envelope::message("expedition successfully deleted"))
}
