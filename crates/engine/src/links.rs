//! Typed relations between transactions.
//!
//! A transaction can point at another transaction for two unrelated reasons:
//! it was generated from a template ([`ParentLink`]) or it is one half of a
//! transfer ([`TransferLink`]). Both are stored as nullable self-references;
//! these wrappers keep the two meanings apart in code.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Link from a generated instance to the template it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParentLink(Uuid);

impl ParentLink {
    #[must_use]
    pub const fn new(template_id: Uuid) -> Self {
        Self(template_id)
    }

    #[must_use]
    pub const fn template_id(self) -> Uuid {
        self.0
    }
}

/// Link between the two halves of a transfer.
///
/// The link is symmetric: each half stores the other's id. Deleting either
/// half goes through [`TransferLink::sever`], which consumes the link and
/// names both rows whose link columns must be cleared first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferLink {
    this: Uuid,
    sibling: Uuid,
}

impl TransferLink {
    /// The pair of links for two freshly created halves, in `(a, b)` order.
    #[must_use]
    pub fn pair(a: Uuid, b: Uuid) -> (Self, Self) {
        (
            Self { this: a, sibling: b },
            Self { this: b, sibling: a },
        )
    }

    pub(crate) const fn from_stored(this: Uuid, sibling: Uuid) -> Self {
        Self { this, sibling }
    }

    /// Id of the other half, read-only.
    #[must_use]
    pub const fn sibling_id(&self) -> Uuid {
        self.sibling
    }

    /// `true` when `other` is the mirror of this link.
    #[must_use]
    pub fn mirrors(&self, other: &TransferLink) -> bool {
        self.this == other.sibling && self.sibling == other.this
    }

    /// Breaks the link, returning the ids whose link columns must be cleared
    /// before either row is deleted.
    #[must_use]
    pub fn sever(self) -> SeveredTransfer {
        SeveredTransfer {
            this: self.this,
            sibling: self.sibling,
        }
    }
}

/// A transfer link that has been broken and is waiting to be persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct SeveredTransfer {
    pub this: Uuid,
    pub sibling: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_symmetric() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (la, lb) = TransferLink::pair(a, b);

        assert_eq!(la.sibling_id(), b);
        assert_eq!(lb.sibling_id(), a);
        assert!(la.mirrors(&lb));
        assert!(lb.mirrors(&la));
    }

    #[test]
    fn sever_returns_both_sides() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (la, _) = TransferLink::pair(a, b);
        let severed = la.sever();
        assert_eq!(severed.this, a);
        assert_eq!(severed.sibling, b);
    }
}
