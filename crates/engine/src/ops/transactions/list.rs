use chrono::{Months, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use sea_orm::{Condition, JoinType, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{
    EngineError, MoneyCents, ResultEngine, Transaction, TransactionKind, accounts, transactions,
};

use super::super::Engine;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusFilter {
    /// Marked paid, or dated today or earlier.
    Effectuated,
    /// Unmarked and dated in the future.
    Pending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleFilter {
    Templates,
    OneTime,
    Generated,
}

/// Filters for listing transactions.
///
/// `from` and `to` are inclusive and only apply when both are set; they take
/// precedence over `month` (`YYYY-MM`).
#[derive(Clone, Debug, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    /// Case-insensitive substring of the description.
    pub search: Option<String>,
    pub status: Option<StatusFilter>,
    pub role: Option<RoleFilter>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub month: Option<String>,
}

/// Count and non-transfer sums of a list of transactions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TransactionTotals {
    pub count: usize,
    pub income: MoneyCents,
    pub expense: MoneyCents,
}

impl TransactionTotals {
    #[must_use]
    pub fn from_transactions<'a>(
        transactions: impl IntoIterator<Item = &'a Transaction>,
        transfer_category_id: Uuid,
    ) -> Self {
        let mut totals = Self::default();
        for tx in transactions {
            totals.count += 1;
            if tx.category_id == transfer_category_id {
                continue;
            }
            match tx.kind {
                TransactionKind::Income => totals.income += tx.amount,
                TransactionKind::Expense => totals.expense += tx.amount,
            }
        }
        totals
    }
}

/// Lower-cased text for description search. SQLite `LIKE` only folds ASCII
/// and treats `%` and `_` as wildcards, so matching happens here instead.
fn search_key(text: &str) -> String {
    text.trim().to_lowercase()
}

fn parse_month(month: &str) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
        .map_err(|_| EngineError::invalid("month", "must be formatted as YYYY-MM"))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| EngineError::invalid("month", "is out of range"))?;
    Ok((first, last))
}

/// Inclusive date range selected by `filter`, if any.
fn date_range(filter: &TransactionFilter) -> ResultEngine<Option<(NaiveDate, NaiveDate)>> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(EngineError::invalid("to", "must not be before from"));
        }
        return Ok(Some((from, to)));
    }
    filter.month.as_deref().map(parse_month).transpose()
}

fn status_condition(status: StatusFilter, today: NaiveDate) -> Condition {
    match status {
        StatusFilter::Effectuated => Condition::any()
            .add(transactions::Column::EffectuatedAt.is_not_null())
            .add(transactions::Column::TransactionDate.lte(today)),
        StatusFilter::Pending => Condition::all()
            .add(transactions::Column::EffectuatedAt.is_null())
            .add(transactions::Column::TransactionDate.gt(today)),
    }
}

fn role_condition(role: RoleFilter) -> Condition {
    match role {
        RoleFilter::Templates => Condition::all().add(transactions::Column::IsTemplate.eq(true)),
        RoleFilter::OneTime => Condition::all()
            .add(transactions::Column::IsTemplate.eq(false))
            .add(transactions::Column::ParentTransactionId.is_null()),
        RoleFilter::Generated => {
            Condition::all().add(transactions::Column::ParentTransactionId.is_not_null())
        }
    }
}

impl Engine {
    /// Lists a family's transactions, newest date first, then newest created.
    pub async fn list_transactions(
        &self,
        family_id: Uuid,
        filter: &TransactionFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        let range = date_range(filter)?;

        let mut query = transactions::Entity::find()
            .join(JoinType::InnerJoin, transactions::Relation::Account.def())
            .filter(accounts::Column::FamilyId.eq(family_id));

        if let Some(kind) = filter.kind {
            query = query.filter(transactions::Column::TransactionType.eq(kind.as_str()));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(transactions::Column::CategoryId.eq(category_id));
        }
        if let Some(account_id) = filter.account_id {
            query = query.filter(transactions::Column::AccountId.eq(account_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(status_condition(status, self.today()));
        }
        if let Some(role) = filter.role {
            query = query.filter(role_condition(role));
        }
        if let Some((from, to)) = range {
            query = query.filter(transactions::Column::TransactionDate.between(from, to));
        }

        let needle = filter
            .search
            .as_deref()
            .map(search_key)
            .filter(|needle| !needle.is_empty());

        query
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .filter(|model| {
                needle
                    .as_deref()
                    .is_none_or(|needle| search_key(&model.description).contains(needle))
            })
            .map(Transaction::try_from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_filter_spans_calendar_month() {
        let (first, last) = parse_month("2025-02").unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert!(parse_month("2025-13").is_err());
        assert!(parse_month("feb").is_err());
    }

    #[test]
    fn period_wins_over_month() {
        let filter = TransactionFilter {
            from: NaiveDate::from_ymd_opt(2025, 1, 10),
            to: NaiveDate::from_ymd_opt(2025, 1, 20),
            month: Some("2025-03".to_string()),
            ..Default::default()
        };
        assert_eq!(
            date_range(&filter).unwrap(),
            Some((
                NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
            ))
        );
    }

    #[test]
    fn search_key_folds_accented_capitals() {
        assert!(search_key("SALÁRIO JANEIRO").contains(&search_key(" salário ")));
        assert!(!search_key("Bonus 100 reais").contains(&search_key("%")));
    }

    #[test]
    fn half_open_period_is_ignored() {
        let filter = TransactionFilter {
            from: NaiveDate::from_ymd_opt(2025, 1, 10),
            ..Default::default()
        };
        assert_eq!(date_range(&filter).unwrap(), None);
    }
}
