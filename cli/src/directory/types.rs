//! Device and logon-user data types as returned by the Defender API.

use serde::{Deserialize, Deserializer, Serialize};

/// A device managed by Defender for Endpoint.
///
/// Timestamps are kept as the ISO-8601 strings the API returns; they are
/// only ever compared lexically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Vendor-assigned machine id (primary key).
    pub id: String,

    /// Host name as reported by the sensor.
    #[serde(rename = "computerDnsName", default, deserialize_with = "nullable")]
    pub host_name: String,

    /// Entra ID (Azure AD) device id, if the machine is joined.
    #[serde(rename = "aadDeviceId", default)]
    pub aad_device_id: Option<String>,

    /// Free-form health status, e.g. `Active` or `Inactive`.
    #[serde(rename = "healthStatus", default, deserialize_with = "nullable")]
    pub health_status: String,

    /// OS platform label, e.g. `Windows11`.
    #[serde(rename = "osPlatform", default, deserialize_with = "nullable")]
    pub os_platform: String,

    /// Last time the device reported in.
    #[serde(rename = "lastSeen", default, deserialize_with = "nullable")]
    pub last_seen: String,

    /// Logon users, empty until fetched.
    #[serde(skip)]
    pub logon_users: Vec<LogonUser>,

    /// Whether `logon_users` reflects a completed fetch.
    ///
    /// Distinct from `logon_users.is_empty()`: a device can have no users.
    #[serde(skip)]
    pub users_loaded: bool,
}

impl Device {
    /// Display form of the first logon user, or `No users`.
    #[must_use]
    pub fn first_user_display(&self) -> String {
        self.logon_users
            .first()
            .map_or_else(|| "No users".to_string(), LogonUser::display_name)
    }

    /// Returns a copy of this device carrying the given users.
    #[must_use]
    pub fn with_users(&self, users: Vec<LogonUser>) -> Self {
        Self {
            logon_users: users,
            users_loaded: true,
            ..self.clone()
        }
    }
}

/// An account observed signing in to a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogonUser {
    /// Id scoped to the parent device.
    pub id: String,

    #[serde(rename = "accountName")]
    pub account_name: String,

    /// May be empty for local accounts.
    #[serde(rename = "accountDomain", default, deserialize_with = "nullable")]
    pub account_domain: String,

    #[serde(rename = "firstSeen", default, deserialize_with = "nullable")]
    pub first_seen: String,

    #[serde(rename = "lastSeen", default, deserialize_with = "nullable")]
    pub last_seen: String,

    /// Comma-separated logon types, e.g. `Interactive, Network`.
    #[serde(rename = "logonTypes", default, deserialize_with = "nullable")]
    pub logon_types: String,

    #[serde(rename = "isDomainAdmin", default, deserialize_with = "nullable")]
    pub is_domain_admin: bool,

    #[serde(rename = "isOnlyNetworkUser", default, deserialize_with = "nullable")]
    pub is_only_network_user: bool,
}

impl LogonUser {
    /// `DOMAIN\account`, or the bare account name when there is no domain.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.account_domain.is_empty() {
            self.account_name.clone()
        } else {
            format!("{}\\{}", self.account_domain, self.account_name)
        }
    }
}

/// One page of the machine listing.
#[derive(Debug, Deserialize)]
pub struct DevicePage {
    pub value: Vec<Device>,

    /// Opaque link to the next page; absent on the last page.
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// Treats an explicit JSON `null` the same as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
