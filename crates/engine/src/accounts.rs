//! The module contains `Account` struct and its storage entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError};

/// An account.
///
/// The balance is a denormalized sum: it only changes together with the
/// entries that explain the change, inside the same database transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub owner: i64,
    pub currency: Currency,
    /// Balance in minor units of `currency`.
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

/// Input for opening a new account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewAccount {
    pub owner: i64,
    pub currency: Currency,
    /// Opening balance in minor units. Must not be negative.
    pub balance: i64,
}

impl NewAccount {
    pub fn new(owner: i64, currency: Currency) -> Self {
        Self {
            owner,
            currency,
            balance: 0,
        }
    }

    pub fn with_balance(mut self, balance: i64) -> Self {
        self.balance = balance;
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub owner: i64,
    pub currency: String,
    pub balance: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&NewAccount> for ActiveModel {
    fn from(value: &NewAccount) -> Self {
        Self {
            id: ActiveValue::NotSet,
            owner: ActiveValue::Set(value.owner),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            balance: ActiveValue::Set(value.balance),
            created_at: ActiveValue::Set(Utc::now()),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            owner: model.owner,
            currency: Currency::try_from(model.currency.as_str())?,
            balance: model.balance,
            created_at: model.created_at,
        })
    }
}
