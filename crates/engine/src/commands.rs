//! Command structs for engine operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists. Required fields go through
//! `new`, optional ones through chained setters.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    MoneyCents,
    accounts::AccountKind,
    recurrence::Frequency,
    transactions::TransactionKind,
    users::{UserRole, UserStatus},
};

/// Recurrence requested for a new template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecurrenceCmd {
    pub frequency: Frequency,
    /// Defaults to the transaction date.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Create a one-time transaction or, with a recurrence, a template.
#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub kind: TransactionKind,
    pub amount: MoneyCents,
    pub date: NaiveDate,
    pub description: String,
    pub recurrence: Option<RecurrenceCmd>,
}

impl NewTransactionCmd {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        family_id: Uuid,
        user_id: Uuid,
        account_id: Uuid,
        category_id: Uuid,
        kind: TransactionKind,
        amount: MoneyCents,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            family_id,
            user_id,
            account_id,
            category_id,
            kind,
            amount,
            date,
            description: description.into(),
            recurrence: None,
        }
    }

    /// Turns the transaction into a template repeating every `frequency`.
    #[must_use]
    pub fn recurring(mut self, frequency: Frequency) -> Self {
        self.recurrence = Some(RecurrenceCmd {
            frequency,
            start_date: None,
            end_date: None,
        });
        self
    }

    /// Only meaningful after [`NewTransactionCmd::recurring`].
    #[must_use]
    pub fn start_date(mut self, start_date: NaiveDate) -> Self {
        if let Some(recurrence) = self.recurrence.as_mut() {
            recurrence.start_date = Some(start_date);
        }
        self
    }

    /// Only meaningful after [`NewTransactionCmd::recurring`].
    #[must_use]
    pub fn end_date(mut self, end_date: NaiveDate) -> Self {
        if let Some(recurrence) = self.recurrence.as_mut() {
            recurrence.end_date = Some(end_date);
        }
        self
    }
}

/// Patch an existing transaction. `None` leaves a field untouched.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub family_id: Uuid,
    pub transaction_id: Uuid,
    pub editor_id: Uuid,
    pub amount: Option<MoneyCents>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub frequency: Option<Frequency>,
    pub start_date: Option<NaiveDate>,
    /// `Some(None)` clears the end date.
    pub end_date: Option<Option<NaiveDate>>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(family_id: Uuid, transaction_id: Uuid, editor_id: Uuid) -> Self {
        Self {
            family_id,
            transaction_id,
            editor_id,
            amount: None,
            description: None,
            category_id: None,
            account_id: None,
            date: None,
            frequency: None,
            start_date: None,
            end_date: None,
        }
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    #[must_use]
    pub fn start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    #[must_use]
    pub fn end_date(mut self, end_date: Option<NaiveDate>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub(crate) fn touches_recurrence(&self) -> bool {
        self.frequency.is_some() || self.start_date.is_some() || self.end_date.is_some()
    }
}

/// Move money between two accounts of the same family.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: MoneyCents,
    pub date: NaiveDate,
    pub description: String,
}

impl TransferCmd {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        family_id: Uuid,
        user_id: Uuid,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: MoneyCents,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            family_id,
            user_id,
            from_account_id,
            to_account_id,
            amount,
            date,
            description: description.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewAccountCmd {
    pub family_id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance: MoneyCents,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl NewAccountCmd {
    #[must_use]
    pub fn new(family_id: Uuid, name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            family_id,
            name: name.into(),
            kind,
            initial_balance: MoneyCents::ZERO,
            icon: None,
            color: None,
        }
    }

    #[must_use]
    pub fn initial_balance(mut self, initial_balance: MoneyCents) -> Self {
        self.initial_balance = initial_balance;
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Account type is not editable.
#[derive(Clone, Debug)]
pub struct UpdateAccountCmd {
    pub family_id: Uuid,
    pub account_id: Uuid,
    pub name: Option<String>,
    pub initial_balance: Option<MoneyCents>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl UpdateAccountCmd {
    #[must_use]
    pub fn new(family_id: Uuid, account_id: Uuid) -> Self {
        Self {
            family_id,
            account_id,
            name: None,
            initial_balance: None,
            icon: None,
            color: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn initial_balance(mut self, initial_balance: MoneyCents) -> Self {
        self.initial_balance = Some(initial_balance);
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct InviteUserCmd {
    pub acting_user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

impl InviteUserCmd {
    #[must_use]
    pub fn new(
        acting_user_id: Uuid,
        email: impl Into<String>,
        name: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            acting_user_id,
            email: email.into(),
            name: name.into(),
            role,
        }
    }
}

#[derive(Clone, Debug)]
pub struct UpdateUserCmd {
    pub acting_user_id: Uuid,
    pub user_id: Uuid,
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

impl UpdateUserCmd {
    #[must_use]
    pub fn new(acting_user_id: Uuid, user_id: Uuid) -> Self {
        Self {
            acting_user_id,
            user_id,
            name: None,
            role: None,
            status: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn role(mut self, role: UserRole) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn status(mut self, status: UserStatus) -> Self {
        self.status = Some(status);
        self
    }
}
