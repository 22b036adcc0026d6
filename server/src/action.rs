use donation_storage::DonationStatus;
use std::{fmt, str::FromStr};

/// Admin verdict on a pending donation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Confirm,
    Reject,
}

impl Decision {
    pub fn status(&self) -> DonationStatus {
        match self {
            Decision::Confirm => DonationStatus::Confirmed,
            Decision::Reject => DonationStatus::Rejected,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Decision::Confirm => "confirm",
            Decision::Reject => "reject",
        }
    }
}

/// Button actions, carried as callback data on inline keyboards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Donate,
    Refresh,
    Dispose {
        donation_id: i64,
        decision: Decision,
    },
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown action: {0:?}")]
pub struct UnknownAction(pub String);

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Donate => f.write_str("donate"),
            Action::Refresh => f.write_str("refresh"),
            Action::Dispose {
                donation_id,
                decision,
            } => write!(f, "{}_{}", decision.prefix(), donation_id),
        }
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownAction(s.to_string());
        match s {
            "donate" => return Ok(Action::Donate),
            "refresh" => return Ok(Action::Refresh),
            _ => {}
        }

        let (prefix, id) = s.split_once('_').ok_or_else(unknown)?;
        let decision = match prefix {
            "confirm" => Decision::Confirm,
            "reject" => Decision::Reject,
            _ => return Err(unknown()),
        };
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(unknown());
        }
        let donation_id = id.parse::<i64>().map_err(|_| unknown())?;
        Ok(Action::Dispose {
            donation_id,
            decision,
        })
    }
}

/// Whether `text` is the `/start` command, optionally addressed to a bot
/// (`/start@some_bot`) and followed by a payload.
pub fn is_start_command(text: &str) -> bool {
    match text.split_whitespace().next() {
        Some(command) => command == "/start" || command.starts_with("/start@"),
        None => false,
    }
}
