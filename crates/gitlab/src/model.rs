use jiff::{Timestamp, civil::Date, tz::TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

/// The account owning a token, as returned by `GET /api/v4/user`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub id: u64,
    pub username: String,
    pub name: String,
    pub email: Option<String>,
    pub state: String,
    pub two_factor_enabled: bool,
    pub bot: bool,
    pub is_admin: bool,
    pub is_auditor: bool,
    pub external: bool,
    pub private_profile: bool,
    pub locked: bool,
    /// Absent until the account confirmed its registration.
    pub confirmed_at: Option<Timestamp>,
    /// GitLab reports the day of the last activity. Full timestamps are accepted as well.
    #[serde(deserialize_with = "deserialize_activity")]
    pub last_activity_on: Option<Timestamp>,
    pub custom_attributes: Vec<CustomAttribute>,
}

/// Administrator defined key/value pair attached to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomAttribute {
    pub key: String,
    pub value: String,
}

/// A group membership, as returned by `GET /api/v4/groups`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub full_path: String,
    pub parent_id: Option<u64>,
}

fn deserialize_activity<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Ok(timestamp) = value.parse::<Timestamp>() {
        return Ok(Some(timestamp));
    }

    let date: Date = value.parse().map_err(serde::de::Error::custom)?;
    let zoned = date.to_zoned(TimeZone::UTC).map_err(serde::de::Error::custom)?;

    Ok(Some(zoned.timestamp()))
}
