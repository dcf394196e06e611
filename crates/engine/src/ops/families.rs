use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, InviteUserCmd, ResultEngine, UpdateUserCmd, User, UserRole, UserStatus,
    families, users,
    util::{normalize_email, normalize_required_name},
};

use super::{Engine, with_tx};

const USER_NAME_MAX_CHARS: usize = 100;

/// Filters for listing the users of a family.
///
/// `name` and `email` match substrings, `role` matches exactly.
#[derive(Clone, Debug, Default)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

impl Engine {
    async fn ensure_email_free<C: ConnectionTrait>(&self, db: &C, email: &str) -> ResultEngine<()> {
        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(EngineError::ExistingKey(email.to_string()));
        }
        Ok(())
    }

    /// Creates a family together with its first user, an active admin.
    pub async fn register_family(&self, email: &str, name: &str) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        let name = normalize_required_name(name, "name", USER_NAME_MAX_CHARS)?;
        let now = self.now();

        with_tx!(self, |db_tx| {
            self.ensure_email_free(&db_tx, &email).await?;

            let family_id = Uuid::new_v4();
            families::ActiveModel {
                id: ActiveValue::Set(family_id),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            let user = User {
                id: Uuid::new_v4(),
                family_id,
                email,
                name,
                role: UserRole::Admin,
                status: UserStatus::Active,
                created_at: now,
            };
            users::ActiveModel::from(&user).insert(&db_tx).await?;
            tracing::info!(family_id = %family_id, user_id = %user.id, "family registered");
            Ok(user)
        })
    }

    /// Adds a user to the acting admin's family with status `invited`.
    pub async fn invite_user(&self, cmd: InviteUserCmd) -> ResultEngine<User> {
        let email = normalize_email(&cmd.email)?;
        let name = normalize_required_name(&cmd.name, "name", USER_NAME_MAX_CHARS)?;
        let now = self.now();

        with_tx!(self, |db_tx| {
            let admin = self.require_admin(&db_tx, cmd.acting_user_id).await?;
            self.ensure_email_free(&db_tx, &email).await?;

            let user = User {
                id: Uuid::new_v4(),
                family_id: admin.family_id,
                email,
                name,
                role: cmd.role,
                status: UserStatus::Invited,
                created_at: now,
            };
            users::ActiveModel::from(&user).insert(&db_tx).await?;
            tracing::info!(family_id = %admin.family_id, user_id = %user.id, "user invited");
            Ok(user)
        })
    }

    /// Activates an invited user. Any other status is left alone.
    pub async fn accept_invitation(&self, user_id: Uuid) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let mut user = self.require_user(&db_tx, user_id).await?;
            if user.status == UserStatus::Invited {
                users::ActiveModel {
                    id: ActiveValue::Set(user.id),
                    status: ActiveValue::Set(UserStatus::Active.as_str().to_string()),
                    ..Default::default()
                }
                .update(&db_tx)
                .await?;
                user.status = UserStatus::Active;
            }
            Ok(user)
        })
    }

    pub async fn update_user(&self, cmd: UpdateUserCmd) -> ResultEngine<User> {
        let name = cmd
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "name", USER_NAME_MAX_CHARS))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let admin = self.require_admin(&db_tx, cmd.acting_user_id).await?;
            let mut user = self
                .require_family_user(&db_tx, admin.family_id, cmd.user_id)
                .await?;

            let mut active = users::ActiveModel {
                id: ActiveValue::Unchanged(user.id),
                ..Default::default()
            };
            if let Some(name) = name {
                active.name = ActiveValue::Set(name.clone());
                user.name = name;
            }
            if let Some(role) = cmd.role {
                active.role = ActiveValue::Set(role.as_str().to_string());
                user.role = role;
            }
            if let Some(status) = cmd.status {
                active.status = ActiveValue::Set(status.as_str().to_string());
                user.status = status;
            }
            if active.is_changed() {
                active.update(&db_tx).await?;
            }
            Ok(user)
        })
    }

    /// Users of the acting user's family, newest first.
    pub async fn list_users(
        &self,
        acting_user_id: Uuid,
        filter: &UserFilter,
    ) -> ResultEngine<Vec<User>> {
        let acting = self.require_user(&self.database, acting_user_id).await?;

        let mut query = users::Entity::find().filter(users::Column::FamilyId.eq(acting.family_id));
        if let Some(name) = filter.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(users::Column::Name.contains(name));
        }
        if let Some(email) = filter.email.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(users::Column::Email.contains(email.to_lowercase()));
        }
        if let Some(role) = filter.role {
            query = query.filter(users::Column::Role.eq(role.as_str()));
        }

        query
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    pub async fn user(&self, family_id: Uuid, user_id: Uuid) -> ResultEngine<User> {
        self.require_family_user(&self.database, family_id, user_id)
            .await
    }
}
