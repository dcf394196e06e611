use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    Currency, EngineError, NewTransactionCmd, ResultEngine, Transaction, TransactionRole,
    UpdateTransactionCmd, ValidationErrors, effectuation,
    recurrence::Recurrence,
    transactions,
    util::{validate_amount, validate_description},
};

use super::super::{Engine, with_tx};

/// Moves the field errors of a rejected recurrence into `errors`.
fn collect_recurrence(
    result: ResultEngine<Recurrence>,
    errors: &mut ValidationErrors,
) -> ResultEngine<Option<Recurrence>> {
    match result {
        Ok(recurrence) => Ok(Some(recurrence)),
        Err(EngineError::Validation(rejected)) => {
            errors.merge(rejected);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Which fields an update actually changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Changes {
    amount: bool,
    description: bool,
    category: bool,
    account: bool,
    date: bool,
    recurrence: bool,
}

impl Changes {
    fn between(before: &Transaction, after: &Transaction) -> Self {
        Self {
            amount: before.amount != after.amount,
            description: before.description != after.description,
            category: before.category_id != after.category_id,
            account: before.account_id != after.account_id,
            date: before.date != after.date,
            recurrence: before.recurrence() != after.recurrence(),
        }
    }

    /// A generated instance edited on one of these fields leaves its template.
    fn detaches_instance(self) -> bool {
        self.amount || self.description || self.category || self.date || self.account
    }

    /// A template edited on one of these fields gets its instances rebuilt.
    fn regenerates_template(self) -> bool {
        self.amount || self.description || self.category || self.recurrence
    }
}

impl Engine {
    /// Creates a one-time transaction, or a template when the command
    /// carries a recurrence. Templates are expanded right away.
    pub async fn create_transaction(&self, cmd: NewTransactionCmd) -> ResultEngine<Transaction> {
        let today = self.today();
        let now = self.now();

        let mut errors = ValidationErrors::new();
        validate_amount(cmd.amount, &mut errors);
        let description = validate_description(&cmd.description, &mut errors);
        let (role, date) = match cmd.recurrence {
            Some(requested) => {
                let start_date = requested.start_date.unwrap_or(cmd.date);
                let recurrence = collect_recurrence(
                    Recurrence::new(requested.frequency, start_date, requested.end_date),
                    &mut errors,
                )?;
                (recurrence.map(TransactionRole::Template), start_date)
            }
            None => (Some(TransactionRole::OneTime), cmd.date),
        };
        errors.into_result()?;
        let role = role.ok_or_else(|| EngineError::invalid("frequency", "is invalid"))?;

        with_tx!(self, |db_tx| {
            self.require_family_user(&db_tx, cmd.family_id, cmd.user_id)
                .await?;
            self.require_open_account(&db_tx, cmd.family_id, cmd.account_id)
                .await?;
            let category = self.require_open_category(&db_tx, cmd.category_id).await?;
            if category.is_transfer() {
                return Err(EngineError::invalid(
                    "category_id",
                    "is reserved for transfers",
                ));
            }

            let transaction = Transaction {
                id: Uuid::new_v4(),
                kind: cmd.kind,
                amount: cmd.amount,
                currency: Currency::default(),
                date,
                description,
                account_id: cmd.account_id,
                category_id: cmd.category_id,
                user_id: cmd.user_id,
                editor_id: None,
                edited_at: None,
                role,
                transfer: None,
                effectuated_at: None,
                created_at: now,
            };
            transactions::ActiveModel::from(&transaction)
                .insert(&db_tx)
                .await?;

            if transaction.is_template() {
                self.sync_template_instances(&db_tx, &transaction, today, now)
                    .await?;
            }
            self.recalculate_account(&db_tx, transaction.account_id)
                .await?;
            tracing::debug!(
                transaction_id = %transaction.id,
                template = transaction.is_template(),
                "transaction created"
            );
            Ok(transaction)
        })
    }

    /// Patches a transaction.
    ///
    /// A generated instance whose amount, description, category, date or
    /// account changes is detached from its template. A template whose
    /// amount, description, category or recurrence changes has its pending
    /// instances rebuilt. The kind never changes.
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultEngine<Transaction> {
        let today = self.today();
        let now = self.now();

        let mut errors = ValidationErrors::new();
        if let Some(amount) = cmd.amount {
            validate_amount(amount, &mut errors);
        }
        let description = cmd
            .description
            .as_deref()
            .map(|description| validate_description(description, &mut errors));

        with_tx!(self, |db_tx| {
            let current = self
                .require_transaction(&db_tx, cmd.family_id, cmd.transaction_id)
                .await?;
            self.require_family_user(&db_tx, cmd.family_id, cmd.editor_id)
                .await?;

            let mut updated = current.clone();
            if let Some(amount) = cmd.amount {
                updated.amount = amount;
            }
            if let Some(description) = description {
                updated.description = description;
            }
            if let Some(category_id) = cmd.category_id {
                updated.category_id = category_id;
            }
            if let Some(account_id) = cmd.account_id {
                updated.account_id = account_id;
            }

            match current.role {
                TransactionRole::Template(recurrence) => {
                    // The date of a template is its start date.
                    let start_date = cmd
                        .start_date
                        .or(cmd.date)
                        .unwrap_or(recurrence.start_date);
                    let next = Recurrence::new(
                        cmd.frequency.unwrap_or(recurrence.frequency),
                        start_date,
                        cmd.end_date.unwrap_or(recurrence.end_date),
                    );
                    if let Some(next) = collect_recurrence(next, &mut errors)? {
                        updated.role = TransactionRole::Template(next);
                        updated.date = start_date;
                    }
                }
                TransactionRole::OneTime | TransactionRole::Instance(_) => {
                    if cmd.touches_recurrence() {
                        errors.add("frequency", "can only be set on templates");
                    }
                    if let Some(date) = cmd.date {
                        updated.date = date;
                    }
                }
            }
            errors.into_result()?;

            self.require_open_account(&db_tx, cmd.family_id, updated.account_id)
                .await?;
            let category = self
                .require_open_category(&db_tx, updated.category_id)
                .await?;
            if category.is_transfer() && !current.is_transfer_pair() {
                return Err(EngineError::invalid(
                    "category_id",
                    "is reserved for transfers",
                ));
            }

            let changes = Changes::between(&current, &updated);
            if let TransactionRole::Instance(link) = current.role
                && changes.detaches_instance()
            {
                updated.role = TransactionRole::OneTime;
                tracing::debug!(
                    transaction_id = %updated.id,
                    template_id = %link.template_id(),
                    "instance detached from template"
                );
            }

            updated.editor_id = Some(cmd.editor_id);
            updated.edited_at = Some(now);
            transactions::ActiveModel::from(&updated)
                .update(&db_tx)
                .await?;

            if updated.is_template() && changes.regenerates_template() {
                self.sync_template_instances(&db_tx, &updated, today, now)
                    .await?;
            }

            self.recalculate_account(&db_tx, updated.account_id).await?;
            if current.account_id != updated.account_id {
                self.recalculate_account(&db_tx, current.account_id).await?;
            }
            Ok(updated)
        })
    }

    /// Deletes a transaction.
    ///
    /// Deleting a template removes its pending, unmarked instances and
    /// detaches the others. Deleting one half of a transfer deletes the other
    /// half too.
    pub async fn delete_transaction(&self, family_id: Uuid, transaction_id: Uuid) -> ResultEngine<()> {
        let today = self.today();

        with_tx!(self, |db_tx| {
            let transaction = self
                .require_transaction(&db_tx, family_id, transaction_id)
                .await?;
            let mut touched = vec![transaction.account_id];

            if transaction.is_template() {
                self.prune_template_instances(&db_tx, transaction.id, today)
                    .await?;
            }

            if let Some(link) = transaction.transfer {
                let severed = link.sever();
                let sibling = transactions::Entity::find_by_id(severed.sibling)
                    .one(&db_tx)
                    .await?;
                transactions::Entity::update_many()
                    .col_expr(
                        transactions::Column::LinkedTransactionId,
                        Expr::value(Option::<Uuid>::None),
                    )
                    .filter(transactions::Column::Id.is_in([severed.this, severed.sibling]))
                    .exec(&db_tx)
                    .await?;
                if let Some(sibling) = sibling {
                    transactions::Entity::delete_by_id(sibling.id)
                        .exec(&db_tx)
                        .await?;
                    touched.push(sibling.account_id);
                }
            }

            transactions::Entity::delete_by_id(transaction.id)
                .exec(&db_tx)
                .await?;

            touched.sort();
            touched.dedup();
            for account_id in touched {
                self.recalculate_account(&db_tx, account_id).await?;
            }
            tracing::debug!(transaction_id = %transaction_id, "transaction deleted");
            Ok(())
        })
    }

    /// Marks a pending transaction as paid now. Already effectuated
    /// transactions are returned unchanged.
    pub async fn mark_as_paid(
        &self,
        family_id: Uuid,
        transaction_id: Uuid,
        editor_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let today = self.today();
        let now = self.now();

        with_tx!(self, |db_tx| {
            let transaction = self
                .require_transaction(&db_tx, family_id, transaction_id)
                .await?;
            match effectuation::mark_paid(transaction.effectuated_at, transaction.date, now, today)
            {
                Some(effectuated_at) => {
                    self.save_effectuated_at(
                        &db_tx,
                        family_id,
                        transaction,
                        editor_id,
                        Some(effectuated_at),
                        now,
                    )
                    .await
                }
                None => {
                    tracing::debug!(transaction_id = %transaction_id, "already effectuated");
                    Ok(transaction)
                }
            }
        })
    }

    /// Clears a manual "paid" mark. Does nothing unless the mark was set
    /// explicitly and the date is still in the future.
    pub async fn unmark_as_paid(
        &self,
        family_id: Uuid,
        transaction_id: Uuid,
        editor_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let today = self.today();
        let now = self.now();

        with_tx!(self, |db_tx| {
            let transaction = self
                .require_transaction(&db_tx, family_id, transaction_id)
                .await?;
            if effectuation::can_unmark(transaction.effectuated_at, transaction.date, today) {
                self.save_effectuated_at(&db_tx, family_id, transaction, editor_id, None, now)
                    .await
            } else {
                tracing::debug!(transaction_id = %transaction_id, "unmark ignored");
                Ok(transaction)
            }
        })
    }

    async fn save_effectuated_at<C: ConnectionTrait>(
        &self,
        db: &C,
        family_id: Uuid,
        mut transaction: Transaction,
        editor_id: Uuid,
        effectuated_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        self.require_family_user(db, family_id, editor_id).await?;
        self.require_open_account(db, family_id, transaction.account_id)
            .await?;
        self.require_open_category(db, transaction.category_id)
            .await?;

        transaction.effectuated_at = effectuated_at;
        transaction.editor_id = Some(editor_id);
        transaction.edited_at = Some(now);
        transactions::ActiveModel::from(&transaction)
            .update(db)
            .await?;
        self.recalculate_account(db, transaction.account_id).await?;
        Ok(transaction)
    }
}
