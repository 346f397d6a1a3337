//! Fund transfers between two accounts.
//!
//! A transfer writes, inside one database transaction:
//!
//! 1. the [`Transfer`] header,
//! 2. a negative [`Entry`] on the source account,
//! 3. a positive [`Entry`] on the destination account,
//! 4. a delta update on both account balances, **in ascending account id
//!    order**.
//!
//! ## Lock ordering
//!
//! Each balance `UPDATE` takes a row lock that is held until commit. Two
//! transfers `A → B` and `B → A` running concurrently would deadlock if each
//! locked its own source row first. Updating the lower id first, whatever the
//! direction, gives every transaction the same acquisition order, so no cycle
//! of waiters can form. Do not reorder the updates by direction.

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::{Account, Engine, EngineError, Entry, ResultEngine, Transfer};

/// Request to move `amount` minor units from one account to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCmd {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

impl TransferCmd {
    pub fn new(from_account_id: i64, to_account_id: i64, amount: i64) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
        }
    }

    fn validate(&self) -> ResultEngine<()> {
        if self.from_account_id == self.to_account_id {
            return Err(EngineError::Validation(
                "from_account_id and to_account_id must differ".to_string(),
            ));
        }
        if self.amount <= 0 {
            return Err(EngineError::Validation(
                "amount must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything a committed transfer wrote, with post-update balances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    pub transfer: Transfer,
    pub from_entry: Entry,
    pub to_entry: Entry,
    pub from_account: Account,
    pub to_account: Account,
}

/// A signed balance change for one account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceDelta {
    pub account_id: i64,
    pub delta: i64,
}

/// Returns the two balance updates of a transfer in the order they must be
/// applied: ascending account id, independent of the transfer direction.
///
/// This ordering is what keeps concurrent opposite transfers deadlock free.
pub fn balance_updates_in_lock_order(
    from_account_id: i64,
    to_account_id: i64,
    amount: i64,
) -> [BalanceDelta; 2] {
    let debit = BalanceDelta {
        account_id: from_account_id,
        delta: -amount,
    };
    let credit = BalanceDelta {
        account_id: to_account_id,
        delta: amount,
    };
    if from_account_id < to_account_id {
        [debit, credit]
    } else {
        [credit, debit]
    }
}

impl Engine {
    /// Moves `cmd.amount` from `cmd.from_account_id` to `cmd.to_account_id`.
    ///
    /// Invalid input is rejected before a transaction is opened. Any storage
    /// failure rolls the whole transfer back and is returned as is; retrying is
    /// up to the caller (see [`EngineError::is_transient`]).
    pub async fn transfer_funds(&self, cmd: TransferCmd) -> ResultEngine<TransferResult> {
        cmd.validate()?;
        let TransferCmd {
            from_account_id,
            to_account_id,
            amount,
        } = cmd;

        let span = tracing::debug_span!("transfer_funds", from_account_id, to_account_id, amount);
        let result = self
            .store
            .execute_atomic(move |q| {
                Box::pin(async move {
                    let transfer = q
                        .create_transfer(from_account_id, to_account_id, amount)
                        .await?;
                    let from_entry = q
                        .create_entry(from_account_id, Some(transfer.id), -amount)
                        .await?;
                    let to_entry = q
                        .create_entry(to_account_id, Some(transfer.id), amount)
                        .await?;

                    let [first, second] =
                        balance_updates_in_lock_order(from_account_id, to_account_id, amount);
                    let first_account = q
                        .update_account_balance(first.account_id, first.delta)
                        .await?;
                    let second_account = q
                        .update_account_balance(second.account_id, second.delta)
                        .await?;
                    let (from_account, to_account) = if first.account_id == from_account_id {
                        (first_account, second_account)
                    } else {
                        (second_account, first_account)
                    };

                    Ok(TransferResult {
                        transfer,
                        from_entry,
                        to_entry,
                        from_account,
                        to_account,
                    })
                })
            })
            .instrument(span)
            .await;

        match &result {
            Ok(done) => tracing::info!(transfer_id = done.transfer.id, "transfer committed"),
            Err(err) => tracing::debug!(error = %err, "transfer failed"),
        }
        result
    }
}
