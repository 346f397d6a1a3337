use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Cad,
    Vnd,
}

/// Pagination query shared by every list endpoint.
///
/// Both fields start at 1. Missing values fall back to page 1 and the
/// server's default page size.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub owner: i64,
        pub currency: Currency,
        /// Opening balance in minor units. Defaults to 0.
        pub balance: Option<i64>,
    }

    /// Query string of `GET /accounts`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountList {
        pub owner: i64,
        pub page: Option<u64>,
        pub limit: Option<u64>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: i64,
        pub owner: i64,
        pub currency: Currency,
        pub balance: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountListResponse {
        pub accounts: Vec<AccountView>,
    }
}

pub mod entry {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct EntryView {
        pub id: i64,
        pub account_id: i64,
        /// Transfer that produced the entry, if any.
        pub transfer_id: Option<i64>,
        /// Signed amount: negative debits, positive credits.
        pub amount: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryListResponse {
        pub entries: Vec<EntryView>,
    }
}

pub mod transfer {
    use super::*;
    use crate::{account::AccountView, entry::EntryView};

    /// Request body of `POST /transfers`.
    ///
    /// `currency` must match the currency of both accounts.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub from_account_id: i64,
        pub to_account_id: i64,
        /// Must be > 0, in minor units.
        pub amount: i64,
        pub currency: Currency,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TransferView {
        pub id: i64,
        pub from_account_id: i64,
        pub to_account_id: i64,
        pub amount: i64,
        pub created_at: DateTime<Utc>,
    }

    /// Everything a committed transfer wrote, with post-transfer balances.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferCreated {
        pub transfer: TransferView,
        pub from_entry: EntryView,
        pub to_entry: EntryView,
        pub from_account: AccountView,
        pub to_account: AccountView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferListResponse {
        pub transfers: Vec<TransferView>,
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
