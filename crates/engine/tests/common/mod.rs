#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    AccountKind, CategoryKind, Engine, FixedClock, MoneyCents, NewAccountCmd, NewTransactionCmd,
    Transaction, TransactionKind,
};
use migration::MigratorTrait;
use uuid::Uuid;

/// Noon in São Paulo on 2025-01-01.
pub fn new_year_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 15, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn engine_at(db: &DatabaseConnection, now: DateTime<Utc>) -> Engine {
    Engine::builder()
        .database(db.clone())
        .clock(FixedClock(now))
        .timezone(chrono_tz::America::Sao_Paulo)
        .build()
        .await
        .unwrap()
}

/// A migrated in-memory database with one family, its admin, a checking
/// account and an income and an expense category.
pub struct Household {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub income_category: Uuid,
    pub expense_category: Uuid,
}

impl Household {
    pub async fn new() -> Self {
        Self::with_initial_balance(MoneyCents::ZERO).await
    }

    pub async fn with_initial_balance(initial_balance: MoneyCents) -> Self {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = engine_at(&db, new_year_noon()).await;

        let admin = engine
            .register_family("ana@example.com", "Ana")
            .await
            .unwrap();
        let account = engine
            .new_account(
                NewAccountCmd::new(admin.family_id, "Conta Corrente", AccountKind::Checking)
                    .initial_balance(initial_balance),
            )
            .await
            .unwrap();
        let income = engine
            .new_category("Salário", CategoryKind::Income)
            .await
            .unwrap();
        let expense = engine
            .new_category("Mercado", CategoryKind::Expense)
            .await
            .unwrap();

        Self {
            engine,
            db,
            family_id: admin.family_id,
            user_id: admin.id,
            account_id: account.id,
            income_category: income.id,
            expense_category: expense.id,
        }
    }

    pub async fn second_account(&self, name: &str) -> Uuid {
        self.engine
            .new_account(NewAccountCmd::new(self.family_id, name, AccountKind::Investment))
            .await
            .unwrap()
            .id
    }

    pub fn expense(&self, cents: i64, on: NaiveDate, description: &str) -> NewTransactionCmd {
        NewTransactionCmd::new(
            self.family_id,
            self.user_id,
            self.account_id,
            self.expense_category,
            TransactionKind::Expense,
            MoneyCents::new(cents),
            on,
            description,
        )
    }

    pub fn income(&self, cents: i64, on: NaiveDate, description: &str) -> NewTransactionCmd {
        NewTransactionCmd::new(
            self.family_id,
            self.user_id,
            self.account_id,
            self.income_category,
            TransactionKind::Income,
            MoneyCents::new(cents),
            on,
            description,
        )
    }

    pub async fn balance(&self, account_id: Uuid) -> i64 {
        self.engine
            .account(self.family_id, account_id)
            .await
            .unwrap()
            .balance
            .cents()
    }

    pub async fn all_transactions(&self) -> Vec<Transaction> {
        self.engine
            .list_transactions(self.family_id, &Default::default())
            .await
            .unwrap()
    }
}
