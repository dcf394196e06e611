//! Transaction primitives.
//!
//! A `Transaction` is a single income or expense booked on an account. It
//! plays one of three roles (see [`TransactionRole`]): a plain one-time entry,
//! a recurring template, or an instance generated from a template. A
//! transaction may additionally be one half of a transfer.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, MoneyCents, ResultEngine,
    effectuation::{self, Effectuation},
    links::{ParentLink, TransferLink},
    recurrence::{Frequency, Recurrence},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Sign applied to the amount when it hits a balance.
    #[must_use]
    pub fn signed(self, amount: MoneyCents) -> MoneyCents {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::invalid(
                "transaction_type",
                format!("is not included in the list: {other}"),
            )),
        }
    }
}

/// What a transaction is with respect to recurrence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "link", rename_all = "snake_case")]
pub enum TransactionRole {
    /// Entered once, not tied to a template.
    OneTime,
    /// Root of a recurring series; never has a parent.
    Template(Recurrence),
    /// Generated from a template and still attached to it.
    Instance(ParentLink),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: MoneyCents,
    pub currency: Currency,
    pub date: NaiveDate,
    pub description: String,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub user_id: Uuid,
    pub editor_id: Option<Uuid>,
    pub edited_at: Option<DateTime<Utc>>,
    pub role: TransactionRole,
    pub transfer: Option<TransferLink>,
    pub effectuated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[must_use]
    pub fn is_template(&self) -> bool {
        matches!(self.role, TransactionRole::Template(_))
    }

    #[must_use]
    pub fn is_generated(&self) -> bool {
        matches!(self.role, TransactionRole::Instance(_))
    }

    #[must_use]
    pub fn recurrence(&self) -> Option<&Recurrence> {
        match &self.role {
            TransactionRole::Template(recurrence) => Some(recurrence),
            _ => None,
        }
    }

    #[must_use]
    pub fn parent(&self) -> Option<ParentLink> {
        match self.role {
            TransactionRole::Instance(link) => Some(link),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_transfer_pair(&self) -> bool {
        self.transfer.is_some()
    }

    #[must_use]
    pub fn effectuation(&self, today: NaiveDate) -> Effectuation {
        Effectuation::of(self.effectuated_at, self.date, today)
    }

    #[must_use]
    pub fn is_effectuated(&self, today: NaiveDate) -> bool {
        self.effectuation(today) == Effectuation::Effectuated
    }

    /// `true` when `effectuated_at` was set by a user rather than implied by
    /// the date.
    #[must_use]
    pub fn manually_effectuated(&self) -> bool {
        self.effectuated_at.is_some()
    }

    #[must_use]
    pub fn pending_by_date(&self, today: NaiveDate) -> bool {
        effectuation::pending_by_date(self.date, today)
    }

    /// Signed effect of this transaction on its account balance.
    #[must_use]
    pub fn signed_amount(&self) -> MoneyCents {
        self.kind.signed(self.amount)
    }

    /// Builds the instance a template materialises on `date`.
    pub(crate) fn instance_of(template: &Transaction, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: template.kind,
            amount: template.amount,
            currency: template.currency,
            date,
            description: template.description.clone(),
            account_id: template.account_id,
            category_id: template.category_id,
            user_id: template.user_id,
            editor_id: None,
            edited_at: None,
            role: TransactionRole::Instance(ParentLink::new(template.id)),
            transfer: None,
            effectuated_at: None,
            created_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub user_id: Uuid,
    pub editor_id: Option<Uuid>,
    pub transaction_type: String,
    pub amount_cents: i64,
    pub currency: String,
    pub transaction_date: Date,
    pub description: String,
    pub is_template: bool,
    pub frequency: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub parent_transaction_id: Option<Uuid>,
    pub linked_transaction_id: Option<Uuid>,
    pub effectuated_at: Option<DateTimeUtc>,
    pub edited_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Account,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        let (is_template, frequency, start_date, end_date, parent) = match tx.role {
            TransactionRole::OneTime => (false, None, None, None, None),
            TransactionRole::Template(recurrence) => (
                true,
                Some(recurrence.frequency.as_str().to_string()),
                Some(recurrence.start_date),
                recurrence.end_date,
                None,
            ),
            TransactionRole::Instance(link) => (false, None, None, None, Some(link.template_id())),
        };

        Self {
            id: ActiveValue::Set(tx.id),
            account_id: ActiveValue::Set(tx.account_id),
            category_id: ActiveValue::Set(tx.category_id),
            user_id: ActiveValue::Set(tx.user_id),
            editor_id: ActiveValue::Set(tx.editor_id),
            transaction_type: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_cents: ActiveValue::Set(tx.amount.cents()),
            currency: ActiveValue::Set(tx.currency.code().to_string()),
            transaction_date: ActiveValue::Set(tx.date),
            description: ActiveValue::Set(tx.description.clone()),
            is_template: ActiveValue::Set(is_template),
            frequency: ActiveValue::Set(frequency),
            start_date: ActiveValue::Set(start_date),
            end_date: ActiveValue::Set(end_date),
            parent_transaction_id: ActiveValue::Set(parent),
            linked_transaction_id: ActiveValue::Set(tx.transfer.map(|link| link.sibling_id())),
            effectuated_at: ActiveValue::Set(tx.effectuated_at),
            edited_at: ActiveValue::Set(tx.edited_at),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

fn role_from_model(model: &Model) -> ResultEngine<TransactionRole> {
    let inconsistent = |what: &str| {
        EngineError::InvalidData(format!("transaction {}: {what}", model.id))
    };

    if model.is_template {
        if model.parent_transaction_id.is_some() {
            return Err(inconsistent("template with a parent"));
        }
        let frequency = model
            .frequency
            .as_deref()
            .ok_or_else(|| inconsistent("template without frequency"))?;
        let start_date = model
            .start_date
            .ok_or_else(|| inconsistent("template without start_date"))?;
        let recurrence = Recurrence::new(Frequency::try_from(frequency)?, start_date, model.end_date)?;
        return Ok(TransactionRole::Template(recurrence));
    }

    if model.frequency.is_some() || model.start_date.is_some() || model.end_date.is_some() {
        return Err(inconsistent("recurrence fields on a non-template"));
    }
    Ok(match model.parent_transaction_id {
        Some(parent) => TransactionRole::Instance(ParentLink::new(parent)),
        None => TransactionRole::OneTime,
    })
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let role = role_from_model(&model)?;
        Ok(Self {
            id: model.id,
            kind: TransactionKind::try_from(model.transaction_type.as_str())?,
            amount: MoneyCents::new(model.amount_cents),
            currency: Currency::try_from(model.currency.as_str())?,
            date: model.transaction_date,
            description: model.description,
            account_id: model.account_id,
            category_id: model.category_id,
            user_id: model.user_id,
            editor_id: model.editor_id,
            edited_at: model.edited_at,
            role,
            transfer: model
                .linked_transaction_id
                .map(|sibling| TransferLink::from_stored(model.id, sibling)),
            effectuated_at: model.effectuated_at,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn model() -> Model {
        Model {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            editor_id: None,
            transaction_type: "expense".to_string(),
            amount_cents: 1500,
            currency: "BRL".to_string(),
            transaction_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            description: "Internet".to_string(),
            is_template: false,
            frequency: None,
            start_date: None,
            end_date: None,
            parent_transaction_id: None,
            linked_transaction_id: None,
            effectuated_at: None,
            edited_at: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn one_time_row_maps_to_one_time_role() {
        let tx = Transaction::try_from(model()).unwrap();
        assert_eq!(tx.role, TransactionRole::OneTime);
        assert_eq!(tx.signed_amount(), MoneyCents::new(-1500));
    }

    #[test]
    fn template_row_requires_recurrence_fields() {
        let mut row = model();
        row.is_template = true;
        assert!(matches!(
            Transaction::try_from(row.clone()),
            Err(EngineError::InvalidData(_))
        ));

        row.frequency = Some("monthly".to_string());
        row.start_date = Some(row.transaction_date);
        let tx = Transaction::try_from(row).unwrap();
        assert!(tx.is_template());
    }

    #[test]
    fn template_row_with_parent_is_rejected() {
        let mut row = model();
        row.is_template = true;
        row.frequency = Some("monthly".to_string());
        row.start_date = Some(row.transaction_date);
        row.parent_transaction_id = Some(Uuid::new_v4());
        assert!(matches!(
            Transaction::try_from(row),
            Err(EngineError::InvalidData(_))
        ));
    }

    #[test]
    fn active_model_round_trips_instance_link() {
        let parent = Uuid::new_v4();
        let mut row = model();
        row.parent_transaction_id = Some(parent);
        let tx = Transaction::try_from(row).unwrap();
        assert_eq!(tx.parent(), Some(ParentLink::new(parent)));

        let active = ActiveModel::from(&tx);
        assert_eq!(active.parent_transaction_id, ActiveValue::Set(Some(parent)));
        assert_eq!(active.is_template, ActiveValue::Set(false));
        assert_eq!(active.frequency, ActiveValue::Set(None));
    }
}
