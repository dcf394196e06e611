use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, EngineError, ResultEngine, Transaction, TransactionKind, TransactionRole,
    TransferCmd, TransferLink, ValidationErrors, transactions,
    util::{validate_amount, validate_description},
};

use super::super::{Engine, with_tx};

impl Engine {
    /// Moves money between two accounts of the same family.
    ///
    /// Books an expense on the source and an income on the destination, both
    /// in the transfer category, and links them to each other. Returns
    /// `(expense, income)`. Nothing is written unless every step succeeds.
    pub async fn create_transfer(&self, cmd: TransferCmd) -> ResultEngine<(Transaction, Transaction)> {
        if cmd.from_account_id == cmd.to_account_id {
            tracing::warn!(account_id = %cmd.from_account_id, "transfer to the same account refused");
            return Err(EngineError::SameAccount);
        }

        let mut errors = ValidationErrors::new();
        validate_amount(cmd.amount, &mut errors);
        let description = validate_description(&cmd.description, &mut errors);
        errors.into_result()?;

        let now = self.now();
        with_tx!(self, |db_tx| {
            self.require_family_user(&db_tx, cmd.family_id, cmd.user_id)
                .await?;
            let from = self
                .require_account(&db_tx, cmd.family_id, cmd.from_account_id)
                .await?;
            if from.is_archived() {
                return Err(EngineError::ArchivedAccount(
                    "source account not found or archived".to_string(),
                ));
            }
            let to = self
                .require_account(&db_tx, cmd.family_id, cmd.to_account_id)
                .await?;
            if to.is_archived() {
                return Err(EngineError::ArchivedAccount(
                    "destination account not found or archived".to_string(),
                ));
            }
            self.require_open_category(&db_tx, self.transfer_category_id)
                .await?;

            let half = |kind: TransactionKind, account_id: Uuid| Transaction {
                id: Uuid::new_v4(),
                kind,
                amount: cmd.amount,
                currency: Currency::default(),
                date: cmd.date,
                description: description.clone(),
                account_id,
                category_id: self.transfer_category_id,
                user_id: cmd.user_id,
                editor_id: None,
                edited_at: None,
                role: TransactionRole::OneTime,
                transfer: None,
                effectuated_at: None,
                created_at: now,
            };
            let mut expense = half(TransactionKind::Expense, from.id);
            let mut income = half(TransactionKind::Income, to.id);

            transactions::ActiveModel::from(&expense)
                .insert(&db_tx)
                .await?;
            transactions::ActiveModel::from(&income)
                .insert(&db_tx)
                .await?;

            let (expense_link, income_link) = TransferLink::pair(expense.id, income.id);
            for (id, link) in [(expense.id, expense_link), (income.id, income_link)] {
                transactions::ActiveModel {
                    id: ActiveValue::Unchanged(id),
                    linked_transaction_id: ActiveValue::Set(Some(link.sibling_id())),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
            }
            expense.transfer = Some(expense_link);
            income.transfer = Some(income_link);

            self.recalculate_account(&db_tx, from.id).await?;
            self.recalculate_account(&db_tx, to.id).await?;
            tracing::info!(
                from_account_id = %from.id,
                to_account_id = %to.id,
                amount = cmd.amount.cents(),
                "transfer created"
            );
            Ok((expense, income))
        })
    }
}
