//! Transactions API endpoints

use api_types::transaction::{
    DepositNew, LedgerEntryView, MovementView, TransactionList, TransactionListResponse,
    TransferNew, TransferView, WithdrawNew,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{DepositCmd, LedgerFilter, Money, TransferCmd, WithdrawCmd};

use crate::{
    ServerError,
    server::{Caller, ServerState},
    views::{entry_view, movement_view, transfer_view, unmap_kind},
};

pub async fn deposit(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<DepositNew>,
) -> Result<(StatusCode, Json<MovementView>), ServerError> {
    let cmd = DepositCmd::new(
        user_id,
        payload.account_id,
        Money::new(payload.amount_minor),
    );
    let movement = state.engine.deposit(cmd).await?;

    Ok((StatusCode::CREATED, Json(movement_view(movement))))
}

pub async fn withdraw(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<WithdrawNew>,
) -> Result<(StatusCode, Json<MovementView>), ServerError> {
    let cmd = WithdrawCmd::new(
        user_id,
        payload.account_id,
        Money::new(payload.amount_minor),
    );
    let movement = state.engine.withdraw(cmd).await?;

    Ok((StatusCode::CREATED, Json(movement_view(movement))))
}

pub async fn transfer(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransferView>), ServerError> {
    let cmd = TransferCmd::new(
        user_id,
        payload.from_account_id,
        payload.to_account_id,
        Money::new(payload.amount_minor),
    );
    let receipt = state.engine.transfer(cmd).await?;

    Ok((StatusCode::CREATED, Json(transfer_view(receipt))))
}

pub async fn list(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = LedgerFilter {
        account_id: query.account_id,
        kinds: query.kind.map(|kind| vec![unmap_kind(kind)]),
        limit: query.limit,
    };
    let entries = state
        .engine
        .list_transactions_filtered(user_id, &filter)
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: entries.into_iter().map(entry_view).collect(),
    }))
}

pub async fn get(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<LedgerEntryView>, ServerError> {
    let entry = state.engine.transaction(user_id, id).await?;
    Ok(Json(entry_view(entry)))
}
