use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::{fmt, str::FromStr};

/// Disposition state of a donation. `Pending` is the only non-terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DonationStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Confirmed => "confirmed",
            DonationStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DonationStatus::Pending)
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown donation status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for DonationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DonationStatus::Pending),
            "confirmed" => Ok(DonationStatus::Confirmed),
            "rejected" => Ok(DonationStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for DonationStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Debug, FromRow, PartialEq)]
pub struct DonationRow {
    #[sqlx(rename = "id")]
    pub donation_id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    #[sqlx(try_from = "String")]
    pub status: DonationStatus,
    #[sqlx(rename = "timestamp")]
    pub create_time: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewDonationRow {
    pub create_time: DateTime<Utc>,
    pub user_id: i64,
    pub amount: Decimal,
}
