//! Entry API endpoints

use api_types::{
    PageQuery,
    entry::{EntryListResponse, EntryView},
};
use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    ServerError,
    server::ServerState,
    views::{entry_view, page_from_query},
};

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<EntryView>, ServerError> {
    let entry = state.engine.entry(id).await?;
    Ok(Json(entry_view(entry)))
}

/// Handle requests for the postings of one account, oldest first
pub async fn list_for_account(
    State(state): State<ServerState>,
    Path(account_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<EntryListResponse>, ServerError> {
    let page = page_from_query(query)?;
    // 404 for unknown accounts instead of an empty page.
    state.engine.account(account_id).await?;
    let entries = state.engine.entries(account_id, page).await?;

    Ok(Json(EntryListResponse {
        entries: entries.into_iter().map(entry_view).collect(),
    }))
}
