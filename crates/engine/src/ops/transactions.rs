use uuid::Uuid;

use crate::{ResultEngine, Transaction};

use super::Engine;

mod list;
mod transfer;
mod write;

pub use list::{RoleFilter, StatusFilter, TransactionFilter, TransactionTotals};

impl Engine {
    /// Return a transaction snapshot from DB.
    pub async fn transaction(
        &self,
        family_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        self.require_transaction(&self.database, family_id, transaction_id)
            .await
    }
}
