use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PseudoError;

/// Entity types tracked by the detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    EmailAddress,
    Location,
    Nrp,
    Person,
    PhoneNumber,
    Url,
    Organization,
}

impl EntityLabel {
    pub const ALL: [EntityLabel; 7] = [
        EntityLabel::EmailAddress,
        EntityLabel::Location,
        EntityLabel::Nrp,
        EntityLabel::Person,
        EntityLabel::PhoneNumber,
        EntityLabel::Url,
        EntityLabel::Organization,
    ];

    /// Labels replaced unless configured otherwise.
    pub const REDACTED_BY_DEFAULT: [EntityLabel; 5] = [
        EntityLabel::EmailAddress,
        EntityLabel::Location,
        EntityLabel::Person,
        EntityLabel::PhoneNumber,
        EntityLabel::Organization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityLabel::EmailAddress => "EMAIL_ADDRESS",
            EntityLabel::Location => "LOCATION",
            EntityLabel::Nrp => "NRP",
            EntityLabel::Person => "PERSON",
            EntityLabel::PhoneNumber => "PHONE_NUMBER",
            EntityLabel::Url => "URL",
            EntityLabel::Organization => "ORGANIZATION",
        }
    }

    /// Finnish tag used by the counter strategy.
    pub fn local_tag(&self) -> &'static str {
        match self {
            EntityLabel::EmailAddress => "SÄHKÖPOSTIOSOITE",
            EntityLabel::Location => "SIJAINTI",
            EntityLabel::Nrp => "HENK_KUVAUS",
            EntityLabel::Person => "HENKILÖ",
            EntityLabel::PhoneNumber => "PUHELINNUMERO",
            EntityLabel::Url => "URL",
            EntityLabel::Organization => "YRITYS",
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityLabel {
    type Err = PseudoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        EntityLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == upper)
            .ok_or_else(|| PseudoError::UnknownLabel(s.trim().to_string()))
    }
}
