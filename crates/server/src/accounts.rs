//! Accounts API endpoints

use api_types::account::{
    AccountAdjusted, AccountDetailView, AccountListResponse, AccountNew, AccountUpdate,
    AccountView, BalanceView, ReconciliationView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::Money;

use crate::{
    LISTED_RECENT_ENTRIES, RECENT_ENTRIES, ServerError,
    server::{Caller, ServerState},
    views::{account_detail_view, account_view, entry_view, reconciliation_view},
};

pub async fn account_new(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let account = state
        .engine
        .create_account(user_id, Money::new(payload.balance_minor))
        .await?;

    Ok((StatusCode::CREATED, Json(account_view(account))))
}

pub async fn list(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<AccountListResponse>, ServerError> {
    let accounts = state
        .engine
        .list_accounts(user_id, LISTED_RECENT_ENTRIES)
        .await?;

    Ok(Json(AccountListResponse {
        accounts: accounts.into_iter().map(account_detail_view).collect(),
    }))
}

pub async fn detail(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<AccountDetailView>, ServerError> {
    let detail = state
        .engine
        .account_detail(user_id, id, RECENT_ENTRIES)
        .await?;

    Ok(Json(account_detail_view(detail)))
}

/// Moves the balance to the requested value through a ledger entry.
pub async fn adjust(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<AccountAdjusted>, ServerError> {
    let engine = &state.engine;
    let adjusted = engine
        .adjust_balance(user_id, id, Money::new(payload.balance_minor))
        .await?;

    let body = match adjusted {
        Some(movement) => AccountAdjusted {
            account: account_view(movement.account),
            transaction: Some(entry_view(movement.entry)),
        },
        None => AccountAdjusted {
            account: account_view(engine.account(user_id, id).await?),
            transaction: None,
        },
    };
    Ok(Json(body))
}

pub async fn remove(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.remove_account(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn balance(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<BalanceView>, ServerError> {
    let balance = state.engine.balance(user_id, id).await?;

    Ok(Json(BalanceView {
        account_id: id,
        balance_minor: balance.minor(),
    }))
}

pub async fn reconciliation(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<ReconciliationView>, ServerError> {
    let reconciliation = state.engine.reconcile(user_id, id).await?;
    Ok(Json(reconciliation_view(reconciliation)))
}
