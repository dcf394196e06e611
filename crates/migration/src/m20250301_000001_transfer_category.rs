//! Seeds the system transfer category.
//!
//! Both halves of every transfer are booked on this category. The engine
//! finds it by its `transfer` kind, so the display name can change freely.

use sea_orm_migration::{
    prelude::*,
    sea_orm::{ConnectionTrait, DbBackend, Statement, Value},
};

use crate::TRANSFER_CATEGORY_ID;

#[derive(DeriveMigrationName)]
pub struct Migration;

const TRANSFER_NAME: &str = "Transfer";
const TRANSFER_NAME_NORM: &str = "transfer";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();
        let values: Vec<Value> = vec![
            TRANSFER_CATEGORY_ID.as_bytes().to_vec().into(),
            TRANSFER_NAME.into(),
            TRANSFER_NAME_NORM.into(),
            "transfer".into(),
        ];
        db.execute(Statement::from_sql_and_values(
            backend,
            insert_sql(backend),
            values,
        ))
        .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();
        let placeholder = match backend {
            DbBackend::Postgres => "$1",
            _ => "?",
        };
        db.execute(Statement::from_sql_and_values(
            backend,
            &format!("DELETE FROM categories WHERE id = {placeholder};"),
            [TRANSFER_CATEGORY_ID.as_bytes().to_vec().into()],
        ))
        .await?;
        Ok(())
    }
}

fn insert_sql(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::Postgres => {
            "INSERT INTO categories (id, name, name_norm, kind) VALUES ($1, $2, $3, $4) \
             ON CONFLICT DO NOTHING;"
        }
        _ => {
            "INSERT OR IGNORE INTO categories (id, name, name_norm, kind) VALUES (?, ?, ?, ?);"
        }
    }
}
