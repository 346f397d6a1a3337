use std::time::Duration;

use sea_orm::DatabaseConnection;

pub use accounts::{Account, NewAccount};
pub use audit::LedgerAudit;
pub use currency::Currency;
pub use entries::Entry;
pub use error::EngineError;
pub use queries::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, Page, Queries};
pub use store::{AtomicFuture, LedgerStore};
pub use transfer::{BalanceDelta, TransferCmd, TransferResult, balance_updates_in_lock_order};
pub use transfers::Transfer;

pub mod accounts;
mod audit;
mod currency;
pub mod entries;
mod error;
mod queries;
mod store;
mod transfer;
pub mod transfers;

pub type ResultEngine<T> = Result<T, EngineError>;

/// The ledger engine.
///
/// Cheap to clone: it only holds the [`LedgerStore`], which wraps the
/// connection pool.
#[derive(Clone, Debug)]
pub struct Engine {
    store: LedgerStore,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Open a new account.
    pub async fn create_account(&self, new: NewAccount) -> ResultEngine<Account> {
        let account = self.store.queries().create_account(&new).await?;
        tracing::info!(
            account_id = account.id,
            owner = account.owner,
            currency = %account.currency,
            "account created"
        );
        Ok(account)
    }

    /// Return an account snapshot from DB.
    pub async fn account(&self, id: i64) -> ResultEngine<Account> {
        self.store.queries().account(id).await
    }

    /// Return the account if it exists and holds `currency`.
    pub async fn check_account(&self, id: i64, currency: Currency) -> ResultEngine<Account> {
        let account = self.account(id).await?;
        if account.currency != currency {
            return Err(EngineError::CurrencyMismatch(format!(
                "account {id} currency is {}, got {currency}",
                account.currency
            )));
        }
        Ok(account)
    }

    pub async fn accounts(&self, owner: i64, page: Page) -> ResultEngine<Vec<Account>> {
        self.store.queries().list_accounts(owner, page).await
    }

    pub async fn entry(&self, id: i64) -> ResultEngine<Entry> {
        self.store.queries().entry(id).await
    }

    pub async fn entries(&self, account_id: i64, page: Page) -> ResultEngine<Vec<Entry>> {
        self.store.queries().list_entries(account_id, page).await
    }

    pub async fn transfer(&self, id: i64) -> ResultEngine<Transfer> {
        self.store.queries().transfer(id).await
    }

    pub async fn transfers(&self, account_id: i64, page: Page) -> ResultEngine<Vec<Transfer>> {
        self.store.queries().list_transfers(account_id, page).await
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    transaction_timeout: Option<Duration>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Roll back transactions that run longer than `timeout`.
    pub fn transaction_timeout(mut self, timeout: Duration) -> EngineBuilder {
        self.transaction_timeout = Some(timeout);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        let mut store = LedgerStore::new(self.database);
        if let Some(timeout) = self.transaction_timeout {
            store = store.with_transaction_timeout(timeout);
        }
        Engine { store }
    }
}
