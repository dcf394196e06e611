//! Keeping a template's instances in line with its recurrence.
//!
//! Effectuated instances (by date or marked paid) are history: regeneration
//! and pruning never delete them. Only pending, unmarked instances are
//! replaced.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Transaction, transactions};

use super::{Engine, with_tx};

impl Engine {
    /// Deletes the template's pending, unmarked instances.
    async fn delete_pending_instances<C: ConnectionTrait>(
        &self,
        db: &C,
        template_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<u64> {
        let deleted = transactions::Entity::delete_many()
            .filter(transactions::Column::ParentTransactionId.eq(template_id))
            .filter(transactions::Column::EffectuatedAt.is_null())
            .filter(transactions::Column::TransactionDate.gt(today))
            .exec(db)
            .await?;
        Ok(deleted.rows_affected)
    }

    /// Replaces the pending instances of `template` with a fresh expansion.
    ///
    /// Dates still held by a retained instance are not generated again.
    pub(super) async fn sync_template_instances<C: ConnectionTrait>(
        &self,
        db: &C,
        template: &Transaction,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> ResultEngine<usize> {
        let Some(recurrence) = template.recurrence() else {
            return Ok(0);
        };

        let deleted = self.delete_pending_instances(db, template.id, today).await?;

        let kept: HashSet<NaiveDate> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::TransactionDate)
            .filter(transactions::Column::ParentTransactionId.eq(template.id))
            .into_tuple::<NaiveDate>()
            .all(db)
            .await?
            .into_iter()
            .collect();

        let instances: Vec<transactions::ActiveModel> = recurrence
            .occurrences(today)
            .into_iter()
            .filter(|date| !kept.contains(date))
            .map(|date| transactions::ActiveModel::from(&Transaction::instance_of(template, date, now)))
            .collect();
        let created = instances.len();
        if created > 0 {
            transactions::Entity::insert_many(instances).exec(db).await?;
        }

        tracing::debug!(
            template_id = %template.id,
            deleted,
            kept = kept.len(),
            created,
            "template instances regenerated"
        );
        Ok(created)
    }

    /// Prepares a template for deletion: pending, unmarked instances go away,
    /// the others become ordinary one-time transactions.
    pub(super) async fn prune_template_instances<C: ConnectionTrait>(
        &self,
        db: &C,
        template_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<()> {
        let deleted = self.delete_pending_instances(db, template_id, today).await?;
        let detached = transactions::Entity::update_many()
            .col_expr(
                transactions::Column::ParentTransactionId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(transactions::Column::ParentTransactionId.eq(template_id))
            .exec(db)
            .await?;
        tracing::debug!(
            template_id = %template_id,
            deleted,
            detached = detached.rows_affected,
            "template instances pruned"
        );
        Ok(())
    }

    /// Regenerates a template's instances and refreshes its account balance.
    ///
    /// Returns the template's instances after regeneration, by date.
    pub async fn regenerate_template(
        &self,
        family_id: Uuid,
        template_id: Uuid,
    ) -> ResultEngine<Vec<Transaction>> {
        let today = self.today();
        let now = self.now();
        with_tx!(self, |db_tx| {
            let template = self.require_template(&db_tx, family_id, template_id).await?;
            self.require_open_account(&db_tx, family_id, template.account_id)
                .await?;
            self.require_open_category(&db_tx, template.category_id)
                .await?;
            self.sync_template_instances(&db_tx, &template, today, now)
                .await?;
            self.recalculate_account(&db_tx, template.account_id).await?;
            self.instances_of(&db_tx, template.id).await
        })
    }

    /// Instances still attached to a template, by date.
    pub async fn template_instances(
        &self,
        family_id: Uuid,
        template_id: Uuid,
    ) -> ResultEngine<Vec<Transaction>> {
        let template = self
            .require_template(&self.database, family_id, template_id)
            .await?;
        self.instances_of(&self.database, template.id).await
    }

    async fn require_template<C: ConnectionTrait>(
        &self,
        db: &C,
        family_id: Uuid,
        template_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let template = self.require_transaction(db, family_id, template_id).await?;
        if !template.is_template() {
            return Err(EngineError::KeyNotFound("template not exists".to_string()));
        }
        Ok(template)
    }

    async fn instances_of<C: ConnectionTrait>(
        &self,
        db: &C,
        template_id: Uuid,
    ) -> ResultEngine<Vec<Transaction>> {
        transactions::Entity::find()
            .filter(transactions::Column::ParentTransactionId.eq(template_id))
            .order_by_asc(transactions::Column::TransactionDate)
            .all(db)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }
}
