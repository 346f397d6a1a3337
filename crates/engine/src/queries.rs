//! Row-level data accessors.
//!
//! [`Queries`] wraps any sea-orm connection: the pool itself for standalone
//! reads, or a [`DatabaseTransaction`](sea_orm::DatabaseTransaction) handed
//! out by [`LedgerStore::execute_atomic`](crate::LedgerStore::execute_atomic)
//! when several writes must commit together.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};

use crate::{
    Account, EngineError, Entry, NewAccount, ResultEngine, Transfer, accounts, entries, transfers,
};

/// Default page size, matching the public API default.
pub const DEFAULT_PAGE_LIMIT: u64 = 5;
/// Upper bound for a single page.
pub const MAX_PAGE_LIMIT: u64 = 100;

/// One-based pagination window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    /// Validates a page request. `page` and `limit` start at 1.
    pub fn new(page: u64, limit: u64) -> ResultEngine<Self> {
        if page < 1 || limit < 1 {
            return Err(EngineError::Validation(
                "page and limit must be greater than 0".to_string(),
            ));
        }
        if limit > MAX_PAGE_LIMIT {
            return Err(EngineError::Validation(format!(
                "limit must be at most {MAX_PAGE_LIMIT}"
            )));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(self) -> u64 {
        (self.page - 1) * self.limit
    }
}

/// Data accessor bound to one connection or transaction.
#[derive(Debug)]
pub struct Queries<'c, C> {
    conn: &'c C,
}

impl<C> Clone for Queries<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Queries<'_, C> {}

impl<'c, C> Queries<'c, C>
where
    C: ConnectionTrait,
{
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// The underlying connection, for queries not covered here.
    pub fn connection(&self) -> &'c C {
        self.conn
    }

    pub async fn create_account(&self, new: &NewAccount) -> ResultEngine<Account> {
        if new.balance < 0 {
            return Err(EngineError::Validation(
                "opening balance must not be negative".to_string(),
            ));
        }
        let model = accounts::ActiveModel::from(new).insert(self.conn).await?;
        Account::try_from(model)
    }

    pub async fn account(&self, id: i64) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("account {id}")))?;
        Account::try_from(model)
    }

    pub async fn list_accounts(&self, owner: i64, page: Page) -> ResultEngine<Vec<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::Owner.eq(owner))
            .order_by_asc(accounts::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.conn)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    /// Adds `delta` to the stored balance with a single
    /// `UPDATE accounts SET balance = balance + $delta WHERE id = $id`.
    ///
    /// The increment is evaluated by the store against the locked row, so it
    /// never depends on a balance read earlier. The post-update snapshot is
    /// read back on the same connection, while the row lock is still held.
    pub async fn update_account_balance(&self, account_id: i64, delta: i64) -> ResultEngine<Account> {
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(delta),
            )
            .filter(accounts::Column::Id.eq(account_id))
            .exec(self.conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(format!("account {account_id}")));
        }
        self.account(account_id).await
    }

    pub async fn create_transfer(
        &self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> ResultEngine<Transfer> {
        let model = transfers::new_row(from_account_id, to_account_id, amount)
            .insert(self.conn)
            .await?;
        Ok(Transfer::from(model))
    }

    pub async fn transfer(&self, id: i64) -> ResultEngine<Transfer> {
        transfers::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .map(Transfer::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("transfer {id}")))
    }

    /// Transfers where `account_id` is either the source or the destination.
    pub async fn list_transfers(&self, account_id: i64, page: Page) -> ResultEngine<Vec<Transfer>> {
        let models = transfers::Entity::find()
            .filter(
                Condition::any()
                    .add(transfers::Column::FromAccountId.eq(account_id))
                    .add(transfers::Column::ToAccountId.eq(account_id)),
            )
            .order_by_asc(transfers::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(Transfer::from).collect())
    }

    pub async fn create_entry(
        &self,
        account_id: i64,
        transfer_id: Option<i64>,
        amount: i64,
    ) -> ResultEngine<Entry> {
        let model = entries::new_row(account_id, transfer_id, amount)
            .insert(self.conn)
            .await?;
        Ok(Entry::from(model))
    }

    pub async fn entry(&self, id: i64) -> ResultEngine<Entry> {
        entries::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .map(Entry::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("entry {id}")))
    }

    pub async fn list_entries(&self, account_id: i64, page: Page) -> ResultEngine<Vec<Entry>> {
        let models = entries::Entity::find()
            .filter(entries::Column::AccountId.eq(account_id))
            .order_by_asc(entries::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.conn)
            .await?;
        Ok(models.into_iter().map(Entry::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offset_is_one_based() {
        assert_eq!(Page::new(1, 5).unwrap().offset(), 0);
        assert_eq!(Page::new(3, 10).unwrap().offset(), 20);
    }

    #[test]
    fn page_rejects_zero_values() {
        assert!(matches!(Page::new(0, 5), Err(EngineError::Validation(_))));
        assert!(matches!(Page::new(1, 0), Err(EngineError::Validation(_))));
    }

    #[test]
    fn page_caps_limit() {
        assert!(Page::new(1, MAX_PAGE_LIMIT).is_ok());
        assert!(Page::new(1, MAX_PAGE_LIMIT + 1).is_err());
    }

    #[test]
    fn default_page_matches_api_default() {
        assert_eq!(Page::default(), Page { page: 1, limit: 5 });
    }
}
