//! Mapping between engine values and API bodies.

use api_types::{
    account::{AccountDetailView, AccountView, ReconciliationView},
    transaction::{EntryKind as ApiKind, LedgerEntryView, MovementView, TransferView},
    user::UserView,
};

pub(crate) fn map_kind(kind: engine::EntryKind) -> ApiKind {
    match kind {
        engine::EntryKind::Deposit => ApiKind::Deposit,
        engine::EntryKind::Withdrawal => ApiKind::Withdrawal,
        engine::EntryKind::TransferOut => ApiKind::TransferOut,
        engine::EntryKind::TransferIn => ApiKind::TransferIn,
    }
}

pub(crate) fn unmap_kind(kind: ApiKind) -> engine::EntryKind {
    match kind {
        ApiKind::Deposit => engine::EntryKind::Deposit,
        ApiKind::Withdrawal => engine::EntryKind::Withdrawal,
        ApiKind::TransferOut => engine::EntryKind::TransferOut,
        ApiKind::TransferIn => engine::EntryKind::TransferIn,
    }
}

pub(crate) fn account_view(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        user_id: account.user_id,
        balance_minor: account.balance.minor(),
        created_at: account.created_at,
        updated_at: account.updated_at,
    }
}

pub(crate) fn account_detail_view(detail: engine::AccountDetail) -> AccountDetailView {
    AccountDetailView {
        account: account_view(detail.account),
        recent_transactions: detail.recent_entries.into_iter().map(entry_view).collect(),
    }
}

pub(crate) fn user_view(user: engine::User) -> UserView {
    UserView {
        id: user.id,
        name: user.name,
        email: user.email,
        created_at: user.created_at,
    }
}

pub(crate) fn entry_view(entry: engine::LedgerEntry) -> LedgerEntryView {
    LedgerEntryView {
        id: entry.id,
        account_id: entry.account_id,
        kind: map_kind(entry.kind),
        amount_minor: entry.amount.minor(),
        created_at: entry.created_at,
    }
}

pub(crate) fn movement_view(movement: engine::Movement) -> MovementView {
    MovementView {
        transaction: entry_view(movement.entry),
        account: account_view(movement.account),
    }
}

pub(crate) fn transfer_view(receipt: engine::TransferReceipt) -> TransferView {
    TransferView {
        transfer_out: entry_view(receipt.transfer_out),
        transfer_in: entry_view(receipt.transfer_in),
        account: account_view(receipt.account),
    }
}

pub(crate) fn reconciliation_view(reconciliation: engine::Reconciliation) -> ReconciliationView {
    ReconciliationView {
        account_id: reconciliation.account_id,
        stored_balance_minor: reconciliation.stored_balance.minor(),
        ledger_balance_minor: reconciliation.ledger_balance.minor(),
        entries: reconciliation.entries,
        balanced: reconciliation.is_balanced(),
    }
}
