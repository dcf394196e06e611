use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Account, EngineError, NewAccountCmd, ResultEngine, UpdateAccountCmd, accounts, families,
    util::{ACCOUNT_NAME_MAX_CHARS, normalize_optional_text, normalize_required_name},
};

use super::{Engine, with_tx};

/// Which accounts [`Engine::accounts`] returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccountScope {
    #[default]
    Active,
    Archived,
    All,
}

impl Engine {
    /// Return an account snapshot from DB.
    pub async fn account(&self, family_id: Uuid, account_id: Uuid) -> ResultEngine<Account> {
        self.require_account(&self.database, family_id, account_id)
            .await
    }

    /// Accounts of a family, newest first.
    pub async fn accounts(
        &self,
        family_id: Uuid,
        scope: AccountScope,
    ) -> ResultEngine<Vec<Account>> {
        let mut query = accounts::Entity::find().filter(accounts::Column::FamilyId.eq(family_id));
        query = match scope {
            AccountScope::Active => query.filter(accounts::Column::ArchivedAt.is_null()),
            AccountScope::Archived => query.filter(accounts::Column::ArchivedAt.is_not_null()),
            AccountScope::All => query,
        };
        query
            .order_by_desc(accounts::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    /// Add a new account to a family.
    ///
    /// Icon and colour fall back to the defaults of the account type. The
    /// balance starts at the initial balance.
    pub async fn new_account(&self, cmd: NewAccountCmd) -> ResultEngine<Account> {
        let name = normalize_required_name(&cmd.name, "name", ACCOUNT_NAME_MAX_CHARS)?;
        let now = self.now();

        with_tx!(self, |db_tx| {
            families::Entity::find_by_id(cmd.family_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("family not exists".to_string()))?;

            let account = Account {
                id: Uuid::new_v4(),
                family_id: cmd.family_id,
                name,
                kind: cmd.kind,
                initial_balance: cmd.initial_balance,
                balance: cmd.initial_balance,
                icon: normalize_optional_text(cmd.icon.as_deref())
                    .unwrap_or_else(|| cmd.kind.default_icon().to_string()),
                color: normalize_optional_text(cmd.color.as_deref())
                    .unwrap_or_else(|| cmd.kind.default_color().to_string()),
                archived_at: None,
                created_at: now,
            };
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            tracing::info!(account_id = %account.id, family_id = %account.family_id, "account created");
            Ok(account)
        })
    }

    /// Update name, initial balance or appearance. The type never changes.
    pub async fn update_account(&self, cmd: UpdateAccountCmd) -> ResultEngine<Account> {
        let name = cmd
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "name", ACCOUNT_NAME_MAX_CHARS))
            .transpose()?;

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, cmd.family_id, cmd.account_id)
                .await?;

            let mut active = accounts::ActiveModel {
                id: ActiveValue::Unchanged(cmd.account_id),
                ..Default::default()
            };
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(initial_balance) = cmd.initial_balance {
                active.initial_balance_cents = ActiveValue::Set(initial_balance.cents());
            }
            if let Some(icon) = normalize_optional_text(cmd.icon.as_deref()) {
                active.icon = ActiveValue::Set(icon);
            }
            if let Some(color) = normalize_optional_text(cmd.color.as_deref()) {
                active.color = ActiveValue::Set(color);
            }
            if active.is_changed() {
                active.update(&db_tx).await?;
            }

            self.recalculate_account(&db_tx, cmd.account_id).await?;
            self.require_account(&db_tx, cmd.family_id, cmd.account_id)
                .await
        })
    }

    /// Archived accounts keep their history but accept no new transactions.
    pub async fn archive_account(&self, family_id: Uuid, account_id: Uuid) -> ResultEngine<Account> {
        let now = self.now();
        self.set_account_archived_at(family_id, account_id, Some(now))
            .await
    }

    pub async fn unarchive_account(
        &self,
        family_id: Uuid,
        account_id: Uuid,
    ) -> ResultEngine<Account> {
        self.set_account_archived_at(family_id, account_id, None)
            .await
    }

    async fn set_account_archived_at(
        &self,
        family_id: Uuid,
        account_id: Uuid,
        archived_at: Option<DateTimeUtc>,
    ) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let mut account = self.require_account(&db_tx, family_id, account_id).await?;
            accounts::ActiveModel {
                id: ActiveValue::Unchanged(account_id),
                archived_at: ActiveValue::Set(archived_at),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            account.archived_at = archived_at;
            tracing::info!(
                account_id = %account_id,
                archived = archived_at.is_some(),
                "account archive state changed"
            );
            Ok(account)
        })
    }
}
