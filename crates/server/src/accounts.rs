//! Account API endpoints

use api_types::account::{AccountList, AccountListResponse, AccountNew, AccountView};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use engine::NewAccount;

use crate::{
    ServerError,
    server::ServerState,
    views::{account_view, engine_currency, page},
};

/// Handle requests for opening a new account
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<Json<AccountView>, ServerError> {
    let new = NewAccount::new(payload.owner, engine_currency(payload.currency))
        .with_balance(payload.balance.unwrap_or(0));
    let account = state.engine.create_account(new).await?;

    Ok(Json(account_view(account)))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.account(id).await?;
    Ok(Json(account_view(account)))
}

/// Handle requests for listing the accounts of one owner
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<AccountList>,
) -> Result<Json<AccountListResponse>, ServerError> {
    let page = page(query.page, query.limit)?;
    let accounts = state.engine.accounts(query.owner, page).await?;

    Ok(Json(AccountListResponse {
        accounts: accounts.into_iter().map(account_view).collect(),
    }))
}
