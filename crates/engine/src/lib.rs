//! Household ledger engine.
//!
//! Accounts, one-time and recurring transactions, transfers and the derived
//! account balances of a family, persisted with sea-orm.

pub use accounts::{Account, AccountKind};
pub use categories::{Category, CategoryKind};
pub use clock::{Clock, DEFAULT_TIMEZONE, FixedClock, SystemClock, local_date};
pub use commands::{
    InviteUserCmd, NewAccountCmd, NewTransactionCmd, RecurrenceCmd, TransferCmd,
    UpdateAccountCmd, UpdateTransactionCmd, UpdateUserCmd,
};
pub use currency::Currency;
pub use effectuation::Effectuation;
pub use error::{EngineError, FieldError, ValidationErrors};
pub use links::{ParentLink, SeveredTransfer, TransferLink};
pub use money::{MAX_TRANSACTION_CENTS, MoneyCents};
pub use ops::{
    AccountScope, BalanceBreakdown, Engine, EngineBuilder, MonthlySummary, RoleFilter,
    StatusFilter, TransactionFilter, TransactionTotals, UserFilter,
};
pub use recurrence::{Frequency, LOOKAHEAD_MONTHS, Recurrence};
pub use transactions::{Transaction, TransactionKind, TransactionRole};
pub use users::{User, UserRole, UserStatus};

mod accounts;
mod categories;
mod clock;
mod commands;
mod currency;
pub mod effectuation;
mod error;
mod families;
mod links;
mod money;
mod ops;
mod recurrence;
mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
