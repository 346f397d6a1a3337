use std::collections::HashMap;

use sea_orm::{EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::{Engine, ResultEngine, entries, transfers};

/// Result of replaying the ledger against the double-entry invariants.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAudit {
    /// Sum of every entry ever written. Zero for a conserving ledger.
    pub entry_total: i64,
    pub transfers_checked: u64,
    /// Transfers whose entries are not exactly `(-amount on from, +amount on to)`.
    pub unbalanced_transfers: Vec<i64>,
}

impl LedgerAudit {
    pub fn is_balanced(&self) -> bool {
        self.entry_total == 0 && self.unbalanced_transfers.is_empty()
    }
}

impl Engine {
    /// Replays transfers and entries and reports any violation of:
    ///
    /// - every transfer has exactly one debit of `-amount` on its source and
    ///   one credit of `+amount` on its destination,
    /// - entries sum to zero across the whole ledger.
    ///
    /// Runs in one read transaction so it sees a consistent snapshot.
    pub async fn audit(&self) -> ResultEngine<LedgerAudit> {
        self.store
            .execute_atomic(|q| {
                Box::pin(async move {
                    let db_tx = q.connection();
                    let transfer_models = transfers::Entity::find()
                        .order_by_asc(transfers::Column::Id)
                        .all(db_tx)
                        .await?;
                    let entry_models = entries::Entity::find()
                        .order_by_asc(entries::Column::Id)
                        .all(db_tx)
                        .await?;

                    let mut audit = LedgerAudit::default();
                    let mut by_transfer: HashMap<i64, Vec<entries::Model>> = HashMap::new();
                    for entry in entry_models {
                        audit.entry_total += entry.amount;
                        if let Some(transfer_id) = entry.transfer_id {
                            by_transfer.entry(transfer_id).or_default().push(entry);
                        }
                    }

                    for transfer in transfer_models {
                        audit.transfers_checked += 1;
                        let legs = by_transfer.remove(&transfer.id).unwrap_or_default();
                        if !is_balanced_pair(&transfer, &legs) {
                            tracing::warn!(transfer_id = transfer.id, "unbalanced transfer");
                            audit.unbalanced_transfers.push(transfer.id);
                        }
                    }

                    Ok(audit)
                })
            })
            .await
    }
}

fn is_balanced_pair(transfer: &transfers::Model, legs: &[entries::Model]) -> bool {
    let [a, b] = legs else {
        return false;
    };
    let debit_credit = |debit: &entries::Model, credit: &entries::Model| {
        debit.account_id == transfer.from_account_id
            && debit.amount == -transfer.amount
            && credit.account_id == transfer.to_account_id
            && credit.amount == transfer.amount
    };
    debit_credit(a, b) || debit_credit(b, a)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn transfer(amount: i64) -> transfers::Model {
        transfers::Model {
            id: 1,
            from_account_id: 10,
            to_account_id: 20,
            amount,
            created_at: Utc::now(),
        }
    }

    fn entry(id: i64, account_id: i64, amount: i64) -> entries::Model {
        entries::Model {
            id,
            account_id,
            transfer_id: Some(1),
            amount,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn matching_pair_is_balanced() {
        let legs = [entry(1, 10, -200), entry(2, 20, 200)];
        assert!(is_balanced_pair(&transfer(200), &legs));
    }

    #[test]
    fn pair_order_does_not_matter() {
        let legs = [entry(2, 20, 200), entry(1, 10, -200)];
        assert!(is_balanced_pair(&transfer(200), &legs));
    }

    #[test]
    fn missing_or_wrong_legs_are_unbalanced() {
        assert!(!is_balanced_pair(&transfer(200), &[entry(1, 10, -200)]));
        assert!(!is_balanced_pair(
            &transfer(200),
            &[entry(1, 10, -150), entry(2, 20, 200)]
        ));
        assert!(!is_balanced_pair(
            &transfer(200),
            &[entry(1, 20, -200), entry(2, 10, 200)]
        ));
    }

    #[test]
    fn empty_audit_is_balanced() {
        assert!(LedgerAudit::default().is_balanced());
    }
}
