use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use sea_orm::{DatabaseConnection, QueryFilter, prelude::*};

use crate::{
    CategoryKind, Clock, DEFAULT_TIMEZONE, EngineError, ResultEngine, SystemClock,
    clock::local_date,
};

mod access;
mod accounts;
mod balances;
mod categories;
mod families;
mod templates;
mod transactions;

pub use accounts::AccountScope;
pub use balances::{BalanceBreakdown, MonthlySummary};
pub use families::UserFilter;
pub use transactions::{RoleFilter, StatusFilter, TransactionFilter, TransactionTotals};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    transfer_category_id: Uuid,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Current instant according to the engine clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Today's date in the engine timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        local_date(self.clock.now(), self.timezone)
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Id of the system category every transfer half is booked on.
    #[must_use]
    pub fn transfer_category_id(&self) -> Uuid {
        self.transfer_category_id
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    clock: Option<Arc<dyn Clock>>,
    timezone: Option<Tz>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the system clock, mostly for tests.
    pub fn clock(mut self, clock: impl Clock + 'static) -> EngineBuilder {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Zone that decides which calendar day "today" is.
    pub fn timezone(mut self, timezone: Tz) -> EngineBuilder {
        self.timezone = Some(timezone);
        self
    }

    /// Construct `Engine`
    ///
    /// The transfer category must already exist: it is seeded by the
    /// migrations.
    pub async fn build(self) -> ResultEngine<Engine> {
        let transfer = crate::categories::Entity::find()
            .filter(crate::categories::Column::Kind.eq(CategoryKind::Transfer.as_str()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transfer category".to_string()))?;

        Ok(Engine {
            database: self.database,
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>),
            timezone: self.timezone.unwrap_or(DEFAULT_TIMEZONE),
            transfer_category_id: transfer.id,
        })
    }
}
