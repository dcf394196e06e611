//! Family-scoped lookups shared by every operation.
//!
//! A row owned by another family is reported exactly like a missing row.

use sea_orm::{ConnectionTrait, JoinType, QueryFilter, QuerySelect, prelude::*};
use uuid::Uuid;

use crate::{
    Account, Category, EngineError, ResultEngine, Transaction, User, accounts, categories,
    transactions, users,
};

use super::Engine;

impl Engine {
    pub(super) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> ResultEngine<User> {
        let model = users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
        User::try_from(model)
    }

    pub(super) async fn require_family_user<C: ConnectionTrait>(
        &self,
        db: &C,
        family_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<User> {
        let user = self.require_user(db, user_id).await?;
        if user.family_id != family_id {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }
        Ok(user)
    }

    /// The acting user, who must be an active admin.
    pub(super) async fn require_admin<C: ConnectionTrait>(
        &self,
        db: &C,
        acting_user_id: Uuid,
    ) -> ResultEngine<User> {
        let user = self.require_user(db, acting_user_id).await?;
        if !user.is_admin() || !user.is_active() {
            tracing::warn!(user_id = %acting_user_id, "admin action refused");
            return Err(EngineError::Forbidden(
                "only active admins can manage users".to_string(),
            ));
        }
        Ok(user)
    }

    pub(super) async fn require_account<C: ConnectionTrait>(
        &self,
        db: &C,
        family_id: Uuid,
        account_id: Uuid,
    ) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(account_id)
            .filter(accounts::Column::FamilyId.eq(family_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        Account::try_from(model)
    }

    /// An account that may receive transactions.
    pub(super) async fn require_open_account<C: ConnectionTrait>(
        &self,
        db: &C,
        family_id: Uuid,
        account_id: Uuid,
    ) -> ResultEngine<Account> {
        let account = self.require_account(db, family_id, account_id).await?;
        if account.is_archived() {
            tracing::warn!(account_id = %account_id, "write on archived account refused");
            return Err(EngineError::ArchivedAccount(account.name));
        }
        Ok(account)
    }

    pub(super) async fn require_category<C: ConnectionTrait>(
        &self,
        db: &C,
        category_id: Uuid,
    ) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(category_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        Category::try_from(model)
    }

    /// A category that may be assigned to a transaction.
    pub(super) async fn require_open_category<C: ConnectionTrait>(
        &self,
        db: &C,
        category_id: Uuid,
    ) -> ResultEngine<Category> {
        let category = self.require_category(db, category_id).await?;
        if category.is_archived() {
            tracing::warn!(category_id = %category_id, "write on archived category refused");
            return Err(EngineError::ArchivedCategory(category.name));
        }
        Ok(category)
    }

    pub(super) async fn find_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        family_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<Option<Transaction>> {
        transactions::Entity::find_by_id(transaction_id)
            .join(JoinType::InnerJoin, transactions::Relation::Account.def())
            .filter(accounts::Column::FamilyId.eq(family_id))
            .one(db)
            .await?
            .map(Transaction::try_from)
            .transpose()
    }

    pub(super) async fn require_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        family_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        self.find_transaction(db, family_id, transaction_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
    }
}
