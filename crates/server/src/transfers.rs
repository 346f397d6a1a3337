//! Transfer API endpoints

use api_types::{
    PageQuery,
    transfer::{TransferCreated, TransferListResponse, TransferNew, TransferView},
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use engine::TransferCmd;

use crate::{
    ServerError,
    server::ServerState,
    views::{account_view, engine_currency, entry_view, page_from_query, transfer_view},
};

/// Handle requests for moving money between two accounts.
///
/// Both accounts must exist and hold the requested currency before the
/// transfer is attempted.
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<Json<TransferCreated>, ServerError> {
    let currency = engine_currency(payload.currency);
    state
        .engine
        .check_account(payload.from_account_id, currency)
        .await?;
    state
        .engine
        .check_account(payload.to_account_id, currency)
        .await?;

    let result = state
        .engine
        .transfer_funds(TransferCmd::new(
            payload.from_account_id,
            payload.to_account_id,
            payload.amount,
        ))
        .await?;

    Ok(Json(TransferCreated {
        transfer: transfer_view(result.transfer),
        from_entry: entry_view(result.from_entry),
        to_entry: entry_view(result.to_entry),
        from_account: account_view(result.from_account),
        to_account: account_view(result.to_account),
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<TransferView>, ServerError> {
    let transfer = state.engine.transfer(id).await?;
    Ok(Json(transfer_view(transfer)))
}

/// Handle requests for transfers where the account is source or destination
pub async fn list_for_account(
    State(state): State<ServerState>,
    Path(account_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<TransferListResponse>, ServerError> {
    let page = page_from_query(query)?;
    state.engine.account(account_id).await?;
    let transfers = state.engine.transfers(account_id, page).await?;

    Ok(Json(TransferListResponse {
        transfers: transfers.into_iter().map(transfer_view).collect(),
    }))
}
