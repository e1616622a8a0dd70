//! Closed vocabularies for payment records.
//!
//! Status, channel, provider and type values travel as strings in the
//! database and over the wire, but the service layer only ever works with
//! these enums: unknown strings are rejected at the boundary instead of
//! falling through to a default branch.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle of a payment row. `Pending` exists only while an online attempt
/// is in flight; both other values are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Successful,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// Whether an attempt settles the whole remaining balance or one slice of
/// the installment plan. Doubles as the caller-requested mode on initiation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentType {
    Full,
    Installment,
}

/// How the money physically moved.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentChannel {
    Online,
    Onsite,
    Cash,
    BankTransfer,
    Other,
}

/// Mobile-money operators the gateway can collect through.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MobileMoneyProvider {
    Mtn,
    Orange,
}

impl MobileMoneyProvider {
    /// Service code expected by the collection endpoint.
    pub fn service_code(self) -> &'static str {
        match self {
            MobileMoneyProvider::Mtn => "MTN",
            MobileMoneyProvider::Orange => "ORANGE",
        }
    }
}

/// Admissions status of an enrollment; only `Accepted` enrollments are
/// payable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EnrollmentStatus {
    Pending,
    Accepted,
    Rejected,
}
