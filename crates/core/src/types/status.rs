//! Status enums for external records.

use serde::{Deserialize, Serialize};

/// Payment status of a checkout session.
///
/// Maps to the payment processor's `payment_status` values. Only
/// [`PaymentStatus::Paid`] counts as a completed payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Unpaid,
    NoPaymentRequired,
    /// Any value this build does not know about.
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// Returns `true` only for a completed payment.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_wire_values() {
        let paid: PaymentStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(paid, PaymentStatus::Paid);

        let free: PaymentStatus = serde_json::from_str("\"no_payment_required\"").unwrap();
        assert_eq!(free, PaymentStatus::NoPaymentRequired);

        let other: PaymentStatus = serde_json::from_str("\"refund_pending\"").unwrap();
        assert_eq!(other, PaymentStatus::Unknown);
    }

    #[test]
    fn test_only_paid_is_paid() {
        assert!(PaymentStatus::Paid.is_paid());
        assert!(!PaymentStatus::Unpaid.is_paid());
        assert!(!PaymentStatus::NoPaymentRequired.is_paid());
        assert!(!PaymentStatus::Unknown.is_paid());
    }
}
