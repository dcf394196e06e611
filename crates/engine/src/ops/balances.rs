use chrono::{Datelike, Months, NaiveDate};
use sea_orm::{
    ConnectionTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Account, EngineError, MoneyCents, ResultEngine, TransactionKind, accounts, transactions,
};

use super::Engine;

/// Per-bucket sums behind an account balance, in cents.
///
/// Template rows are never part of a breakdown; their instances are.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BalanceBreakdown {
    pub income: MoneyCents,
    pub expense: MoneyCents,
    pub transfer_in: MoneyCents,
    pub transfer_out: MoneyCents,
}

impl BalanceBreakdown {
    pub fn add(&mut self, kind: TransactionKind, amount: MoneyCents, is_transfer: bool) {
        match (kind, is_transfer) {
            (TransactionKind::Income, false) => self.income += amount,
            (TransactionKind::Expense, false) => self.expense += amount,
            (TransactionKind::Income, true) => self.transfer_in += amount,
            (TransactionKind::Expense, true) => self.transfer_out += amount,
        }
    }

    /// `initial + income - expense + transfer_in - transfer_out`.
    #[must_use]
    pub fn balance(&self, initial: MoneyCents) -> MoneyCents {
        initial + self.income - self.expense + self.transfer_in - self.transfer_out
    }
}

/// Figures shown on the household overview for one month.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    /// First day of the month.
    pub month: NaiveDate,
    /// Sum of every account balance of the family.
    pub total_balance: MoneyCents,
    /// Non-transfer income dated in the month.
    pub income: MoneyCents,
    /// Non-transfer expense dated in the month.
    pub expense: MoneyCents,
    /// Accounts by balance, largest first.
    pub accounts: Vec<Account>,
}

fn month_bounds(month: NaiveDate) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let first = month.with_day(1).unwrap_or(month);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| EngineError::invalid("month", "is out of range"))?;
    Ok((first, last))
}

impl Engine {
    /// Rewrites the cached balance of `account_id` from its transactions.
    ///
    /// Returns `None` when the account does not exist. The write goes straight
    /// to the balance column; nothing else on the row is touched.
    pub(super) async fn recalculate_account<C: ConnectionTrait>(
        &self,
        db: &C,
        account_id: Uuid,
    ) -> ResultEngine<Option<MoneyCents>> {
        let Some(account) = accounts::Entity::find_by_id(account_id).one(db).await? else {
            tracing::debug!(account_id = %account_id, "balance recalculation skipped: no account");
            return Ok(None);
        };

        let rows: Vec<(String, Uuid, i64)> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::TransactionType)
            .column(transactions::Column::CategoryId)
            .column(transactions::Column::AmountCents)
            .filter(transactions::Column::AccountId.eq(account_id))
            // A template's first date is already booked by its first instance.
            .filter(transactions::Column::IsTemplate.eq(false))
            .into_tuple()
            .all(db)
            .await?;

        let mut breakdown = BalanceBreakdown::default();
        for (kind, category_id, amount_cents) in rows {
            breakdown.add(
                TransactionKind::try_from(kind.as_str())?,
                MoneyCents::new(amount_cents),
                category_id == self.transfer_category_id,
            );
        }
        let balance = breakdown.balance(MoneyCents::new(account.initial_balance_cents));

        accounts::Entity::update_many()
            .col_expr(accounts::Column::BalanceCents, Expr::value(balance.cents()))
            .filter(accounts::Column::Id.eq(account_id))
            .exec(db)
            .await?;
        tracing::debug!(account_id = %account_id, balance = balance.cents(), "balance recalculated");
        Ok(Some(balance))
    }

    /// Recomputes one account balance. Returns `None` when the account is not
    /// found in the family.
    pub async fn recalculate_balance(
        &self,
        family_id: Uuid,
        account_id: Uuid,
    ) -> ResultEngine<Option<MoneyCents>> {
        let exists = accounts::Entity::find_by_id(account_id)
            .filter(accounts::Column::FamilyId.eq(family_id))
            .one(&self.database)
            .await?
            .is_some();
        if !exists {
            return Ok(None);
        }
        self.recalculate_account(&self.database, account_id).await
    }

    /// Sum of the cached balances of every account in the family, archived
    /// ones included.
    pub async fn total_balance(&self, family_id: Uuid) -> ResultEngine<MoneyCents> {
        let balances: Vec<i64> = accounts::Entity::find()
            .select_only()
            .column(accounts::Column::BalanceCents)
            .filter(accounts::Column::FamilyId.eq(family_id))
            .into_tuple()
            .all(&self.database)
            .await?;
        Ok(balances.into_iter().map(MoneyCents::new).sum())
    }

    /// Overview for the month containing `month`.
    pub async fn monthly_summary(
        &self,
        family_id: Uuid,
        month: NaiveDate,
    ) -> ResultEngine<MonthlySummary> {
        let (first, last) = month_bounds(month)?;

        let rows: Vec<(String, i64)> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::TransactionType)
            .column(transactions::Column::AmountCents)
            .join(JoinType::InnerJoin, transactions::Relation::Account.def())
            .filter(accounts::Column::FamilyId.eq(family_id))
            .filter(transactions::Column::IsTemplate.eq(false))
            .filter(transactions::Column::CategoryId.ne(self.transfer_category_id))
            .filter(transactions::Column::TransactionDate.between(first, last))
            .into_tuple()
            .all(&self.database)
            .await?;

        let mut breakdown = BalanceBreakdown::default();
        for (kind, amount_cents) in rows {
            breakdown.add(
                TransactionKind::try_from(kind.as_str())?,
                MoneyCents::new(amount_cents),
                false,
            );
        }

        let accounts = accounts::Entity::find()
            .filter(accounts::Column::FamilyId.eq(family_id))
            .order_by_desc(accounts::Column::BalanceCents)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(MonthlySummary {
            month: first,
            total_balance: accounts.iter().map(|account| account.balance).sum(),
            income: breakdown.income,
            expense: breakdown.expense,
            accounts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakdown_matches_balance_formula() {
        let mut breakdown = BalanceBreakdown::default();
        breakdown.add(TransactionKind::Income, MoneyCents::new(50_000), false);
        breakdown.add(TransactionKind::Expense, MoneyCents::new(30_000), false);
        assert_eq!(
            breakdown.balance(MoneyCents::new(100_000)),
            MoneyCents::new(120_000)
        );

        breakdown.add(TransactionKind::Income, MoneyCents::new(20_000), true);
        breakdown.add(TransactionKind::Expense, MoneyCents::new(10_000), true);
        assert_eq!(
            breakdown.balance(MoneyCents::new(100_000)),
            MoneyCents::new(130_000)
        );
        assert_eq!(breakdown.transfer_in, MoneyCents::new(20_000));
        assert_eq!(breakdown.transfer_out, MoneyCents::new(10_000));
    }

    #[test]
    fn balance_can_go_negative() {
        let mut breakdown = BalanceBreakdown::default();
        breakdown.add(TransactionKind::Expense, MoneyCents::new(1_050), false);
        assert_eq!(breakdown.balance(MoneyCents::ZERO), MoneyCents::new(-1_050));
    }

    #[test]
    fn month_bounds_cover_whole_month() {
        let (first, last) = month_bounds(NaiveDate::from_ymd_opt(2024, 2, 17).unwrap()).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
