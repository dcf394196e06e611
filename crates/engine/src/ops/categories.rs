use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Category, CategoryKind, EngineError, ResultEngine, categories,
    util::{normalize_category_key, normalize_required_name},
};

use super::{Engine, with_tx};

const CATEGORY_NAME_MAX_CHARS: usize = 50;

impl Engine {
    /// Add a user category. Names are unique ignoring case, accents and
    /// spacing.
    pub async fn new_category(&self, name: &str, kind: CategoryKind) -> ResultEngine<Category> {
        if kind == CategoryKind::Transfer {
            return Err(EngineError::invalid(
                "kind",
                "transfer is reserved for the system category",
            ));
        }
        let display = normalize_required_name(name, "name", CATEGORY_NAME_MAX_CHARS)?;
        let name_norm = normalize_category_key(&display)?;

        with_tx!(self, |db_tx| {
            let exists = categories::Entity::find()
                .filter(categories::Column::NameNorm.eq(name_norm.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(display));
            }

            let category = Category {
                id: Uuid::new_v4(),
                name: display,
                kind,
                archived_at: None,
            };
            categories::ActiveModel {
                id: ActiveValue::Set(category.id),
                name: ActiveValue::Set(category.name.clone()),
                name_norm: ActiveValue::Set(name_norm),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                archived_at: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;
            Ok(category)
        })
    }

    /// Categories ordered by name.
    pub async fn categories(&self, include_archived: bool) -> ResultEngine<Vec<Category>> {
        let mut query = categories::Entity::find();
        if !include_archived {
            query = query.filter(categories::Column::ArchivedAt.is_null());
        }
        query
            .order_by_asc(categories::Column::NameNorm)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    pub async fn category(&self, category_id: Uuid) -> ResultEngine<Category> {
        self.require_category(&self.database, category_id).await
    }

    pub async fn archive_category(&self, category_id: Uuid) -> ResultEngine<Category> {
        if category_id == self.transfer_category_id {
            return Err(EngineError::Forbidden(
                "the transfer category cannot be archived".to_string(),
            ));
        }
        let now = self.now();
        self.set_category_archived_at(category_id, Some(now)).await
    }

    pub async fn unarchive_category(&self, category_id: Uuid) -> ResultEngine<Category> {
        self.set_category_archived_at(category_id, None).await
    }

    async fn set_category_archived_at(
        &self,
        category_id: Uuid,
        archived_at: Option<DateTimeUtc>,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let mut category = self.require_category(&db_tx, category_id).await?;
            categories::ActiveModel {
                id: ActiveValue::Unchanged(category_id),
                archived_at: ActiveValue::Set(archived_at),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            category.archived_at = archived_at;
            Ok(category)
        })
    }
}
