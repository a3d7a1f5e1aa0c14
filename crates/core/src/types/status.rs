//! Order lifecycle enums and the fulfillment state machine.
//!
//! The fulfillment status and the payment status are orthogonal axes: an order
//! moves `Processing -> Confirmed -> Shipped -> Delivered` (with `Cancelled`
//! reachable only before shipping), while its payment independently settles
//! `Pending -> Paid | Failed`.

use serde::{Deserialize, Serialize};

/// Payment method label for cash-on-delivery orders.
///
/// Orders with any other method label are treated as already paid, since no
/// real payment gateway is integrated.
pub const CASH_ON_DELIVERY: &str = "Cash on Delivery";

/// Implement sqlx `Type`/`Encode`/`Decode` for a TEXT-backed enum via its
/// `Display` and `FromStr` impls.
#[cfg(feature = "postgres")]
macro_rules! impl_pg_text {
    ($name:ident) => {
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, ::sqlx::error::BoxDynError> {
                let s = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                s.parse::<Self>().map_err(Into::into)
            }
        }

        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(
                    &self.to_string(),
                    buf,
                )
            }
        }
    };
}

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order accepted, stock reserved, awaiting confirmation.
    #[default]
    Processing,
    /// Order confirmed by the store.
    Confirmed,
    /// Order handed to the carrier. No longer cancellable.
    Shipped,
    /// Order delivered to the buyer. Terminal.
    Delivered,
    /// Order cancelled, stock restored. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order. Used by the admin stats projection.
    pub const ALL: [Self; 5] = [
        Self::Processing,
        Self::Confirmed,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Whether a transition from `self` to `next` is allowed.
    ///
    /// The happy path is a strict chain; `Cancelled` is reachable only while
    /// the order has not shipped. Terminal states allow no transitions,
    /// including self-transitions.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Processing, Self::Confirmed)
                | (Self::Confirmed, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
                | (Self::Processing | Self::Confirmed, Self::Cancelled)
        )
    }

    /// Whether the order can still be cancelled (stock not yet shipped).
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Processing | Self::Confirmed)
    }

    /// Whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Stable string form, matching the wire and database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(feature = "postgres")]
impl_pg_text!(OrderStatus);

/// Payment settlement status, orthogonal to fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting settlement (cash on delivery).
    #[default]
    Pending,
    /// Payment settled.
    Paid,
    /// Payment failed.
    Failed,
}

impl PaymentStatus {
    /// Initial payment status for a freshly created order.
    ///
    /// Cash-on-delivery orders settle at the door; anything else is trusted
    /// as paid upfront.
    #[must_use]
    pub fn initial_for_method(payment_method: &str) -> Self {
        if payment_method == CASH_ON_DELIVERY {
            Self::Pending
        } else {
            Self::Paid
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        })
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

#[cfg(feature = "postgres")]
impl_pg_text!(PaymentStatus);

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular shopper.
    #[default]
    Customer,
    /// Store administrator.
    Admin,
}

impl UserRole {
    /// Whether this role grants access to the admin surface.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        })
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(feature = "postgres")]
impl_pg_text!(UserRole);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use OrderStatus::{Cancelled, Confirmed, Delivered, Processing, Shipped};

    #[test]
    fn test_happy_path_chain() {
        assert!(Processing.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
    }

    #[test]
    fn test_no_skipping_states() {
        assert!(!Processing.can_transition_to(Shipped));
        assert!(!Processing.can_transition_to(Delivered));
        assert!(!Confirmed.can_transition_to(Delivered));
    }

    #[test]
    fn test_cancellation_window() {
        assert!(Processing.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn test_terminal_states_admit_nothing() {
        for status in OrderStatus::ALL {
            assert!(!Delivered.can_transition_to(status));
            assert!(!Cancelled.can_transition_to(status));
        }
    }

    #[test]
    fn test_no_backwards_transitions() {
        assert!(!Confirmed.can_transition_to(Processing));
        assert!(!Shipped.can_transition_to(Confirmed));
        assert!(!Delivered.can_transition_to(Processing));
    }

    #[test]
    fn test_self_transitions_invalid() {
        for status in OrderStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_is_cancellable() {
        assert!(Processing.is_cancellable());
        assert!(Confirmed.is_cancellable());
        assert!(!Shipped.is_cancellable());
        assert!(!Delivered.is_cancellable());
        assert!(!Cancelled.is_cancellable());
    }

    #[test]
    fn test_is_terminal() {
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Processing.is_terminal());
        assert!(!Shipped.is_terminal());
    }

    #[test]
    fn test_order_status_string_roundtrip() {
        for status in OrderStatus::ALL {
            let parsed: OrderStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("shipping".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_serde_matches_display() {
        let json = serde_json::to_string(&Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        let back: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(back, Cancelled);
    }

    #[test]
    fn test_initial_payment_status() {
        assert_eq!(
            PaymentStatus::initial_for_method(CASH_ON_DELIVERY),
            PaymentStatus::Pending
        );
        assert_eq!(
            PaymentStatus::initial_for_method("Credit Card"),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_user_role() {
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Customer.is_admin());
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("superuser".parse::<UserRole>().is_err());
    }
}
