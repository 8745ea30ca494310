//! Guest records and the create payload.
//!
//! A guest belongs to exactly one roster partition (male / female) and is
//! identified by the id the server assigns on creation.

use serde::{Deserialize, Serialize};

use crate::error::{GuestListError, Result};

/// Minimum number of characters in a guest name.
pub const MIN_NAME_LEN: usize = 3;

const NAME_TOO_SHORT: &str = "That guest needs a real name.";

/// Which of the two rosters a guest is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Male,
    Female,
}

impl Partition {
    pub const ALL: [Partition; 2] = [Partition::Male, Partition::Female];

    pub fn from_is_male(is_male: bool) -> Self {
        if is_male {
            Partition::Male
        } else {
            Partition::Female
        }
    }

    pub fn is_male(self) -> bool {
        self == Partition::Male
    }

    /// Value of the `is_male` query parameter for this roster.
    pub fn query_value(self) -> &'static str {
        if self.is_male() {
            "true"
        } else {
            "false"
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Partition::Male => write!(f, "male"),
            Partition::Female => write!(f, "female"),
        }
    }
}

/// A guest as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    /// Server-assigned id; `None` until the guest has been saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    /// Full name of the host who put the guest on the list.
    pub host: String,
    pub is_male: bool,
    #[serde(default)]
    pub is_at_party: bool,
    /// First check-in time, as formatted by the server.
    #[serde(default)]
    pub entered_at: Option<String>,
    /// First check-out time, as formatted by the server.
    #[serde(default)]
    pub left_at: Option<String>,
}

impl Guest {
    pub fn partition(&self) -> Partition {
        Partition::from_is_male(self.is_male)
    }

    pub fn is_hosted_by(&self, full_name: &str) -> bool {
        self.host == full_name
    }

    /// Flip between checked in and checked out.
    pub fn toggle_check_in(&mut self) {
        self.is_at_party = !self.is_at_party;
    }
}

/// Payload for adding a guest to a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewGuest {
    pub name: String,
    pub is_male: bool,
    pub host: String,
}

impl NewGuest {
    /// Build a validated create payload. The name is trimmed first.
    pub fn new(name: &str, partition: Partition, host: &str) -> Result<Self> {
        let name = validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            is_male: partition.is_male(),
            host: host.to_string(),
        })
    }
}

/// Check that a guest name is long enough and return it trimmed.
pub fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(GuestListError::Validation(NAME_TOO_SHORT.to_string()));
    }
    Ok(name)
}

#[cfg(test)]
pub(crate) fn guest(id: i64, name: &str, host: &str) -> Guest {
    Guest {
        id: Some(id),
        name: name.to_string(),
        host: host.to_string(),
        is_male: true,
        is_at_party: false,
        entered_at: None,
        left_at: None,
    }
}
