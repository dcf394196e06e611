//! The module contains `Account` struct and its implementation.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Checking,
    Investment,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Investment => "investment",
        }
    }

    #[must_use]
    pub fn default_icon(self) -> &'static str {
        match self {
            Self::Checking => "🏦",
            Self::Investment => "📈",
        }
    }

    #[must_use]
    pub fn default_color(self) -> &'static str {
        match self {
            Self::Checking => "#2563EB",
            Self::Investment => "#10B981",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "checking" => Ok(Self::Checking),
            "investment" => Ok(Self::Investment),
            other => Err(EngineError::invalid(
                "account_type",
                format!("is not included in the list: {other}"),
            )),
        }
    }
}

/// An account.
///
/// An account is a place where the family keeps money: a checking account or
/// an investment. `balance` is derived from `initial_balance` and the
/// account's transactions and is only written by the balance recalculation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance: MoneyCents,
    pub balance: MoneyCents,
    pub icon: String,
    pub color: String,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub family_id: Uuid,
    pub name: String,
    pub account_type: String,
    pub initial_balance_cents: i64,
    pub balance_cents: i64,
    pub icon: String,
    pub color: String,
    pub archived_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::families::Entity",
        from = "Column::FamilyId",
        to = "super::families::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Family,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::families::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Family.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id),
            family_id: ActiveValue::Set(account.family_id),
            name: ActiveValue::Set(account.name.clone()),
            account_type: ActiveValue::Set(account.kind.as_str().to_string()),
            initial_balance_cents: ActiveValue::Set(account.initial_balance.cents()),
            balance_cents: ActiveValue::Set(account.balance.cents()),
            icon: ActiveValue::Set(account.icon.clone()),
            color: ActiveValue::Set(account.color.clone()),
            archived_at: ActiveValue::Set(account.archived_at),
            created_at: ActiveValue::Set(account.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            family_id: model.family_id,
            name: model.name,
            kind: AccountKind::try_from(model.account_type.as_str())?,
            initial_balance: MoneyCents::new(model.initial_balance_cents),
            balance: MoneyCents::new(model.balance_cents),
            icon: model.icon,
            color: model.color,
            archived_at: model.archived_at,
            created_at: model.created_at,
        })
    }
}
