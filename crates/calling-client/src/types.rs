//! Data model shared by the discovery engine, the session filter and the client
//!
//! Wire bodies returned by the signaling service use camelCase JSON; the
//! serde attributes below follow that shape so the same structs are used for
//! decoding and in the public API.

use serde::{Deserialize, Serialize};

// ===== DISCOVERY TYPES =====

/// Region and country of the client, as resolved by IP geolocation or configuration
///
/// Empty strings mean the lookup failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionInfo {
    pub client_region: String,
    pub country_code: String,
}

impl RegionInfo {
    pub fn new(client_region: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            client_region: client_region.into(),
            country_code: country_code.into(),
        }
    }

    /// Both region and country are known
    pub fn is_resolved(&self) -> bool {
        !self.client_region.is_empty() && !self.country_code.is_empty()
    }
}

/// Body of the own-IP endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpInfo {
    #[serde(default)]
    pub ipv4: String,
}

/// Body of the region discovery endpoint
///
/// Both fields may be missing in a successful response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRegionInfo {
    #[serde(default)]
    pub client_address: Option<String>,
    #[serde(default)]
    pub client_region: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub region_code: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl From<ClientRegionInfo> for RegionInfo {
    fn from(info: ClientRegionInfo) -> Self {
        Self {
            client_region: info.client_region.unwrap_or_default(),
            country_code: info.country_code.unwrap_or_default(),
        }
    }
}

/// One ranked group of signaling servers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobiusServerGroup {
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub uris: Vec<String>,
}

/// Body of the ranked server list endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobiusServers {
    #[serde(default)]
    pub primary: MobiusServerGroup,
    #[serde(default)]
    pub backup: MobiusServerGroup,
}

/// Ordered primary and backup signaling server URIs
///
/// `primary` is never empty once discovery has completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobiusUriSet {
    pub primary: Vec<String>,
    pub backup: Vec<String>,
}

// ===== SERVICE TYPES =====

/// Which flavour of calling service the client registers against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceIndicator {
    #[default]
    Calling,
    #[serde(rename = "contactcenter")]
    ContactCenter,
    #[serde(rename = "guestcalling")]
    GuestCalling,
}

impl std::fmt::Display for ServiceIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceIndicator::Calling => write!(f, "calling"),
            ServiceIndicator::ContactCenter => write!(f, "contactcenter"),
            ServiceIndicator::GuestCalling => write!(f, "guestcalling"),
        }
    }
}

/// Service indicator plus the optional service domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceData {
    #[serde(default)]
    pub indicator: ServiceIndicator,
    #[serde(default)]
    pub domain: String,
}

// ===== SESSION NOTIFICATION TYPES =====

/// Kind of user session carried in a session notification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    #[serde(rename = "WEBEX_CALLING")]
    WebexCalling,
    #[serde(other)]
    Other,
}

/// One entry of a session notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub session_id: String,
    pub session_type: SessionType,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<u64>,
    /// Fields this crate does not interpret are passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserSession {
    pub fn new(session_id: impl Into<String>, session_type: SessionType) -> Self {
        let session_id = session_id.into();
        Self {
            id: session_id.clone(),
            session_id,
            session_type,
            start_time: None,
            end_time: None,
            duration_secs: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_calling(&self) -> bool {
        self.session_type == SessionType::WebexCalling
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSessions {
    /// `None` when the notification carries no session list at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_sessions: Option<Vec<UserSession>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSessionData {
    #[serde(default)]
    pub user_sessions: UserSessions,
}

/// Inclusive session notification pushed by the transport event bus
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSessionEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub data: CallSessionData,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub tracking_id: Option<String>,
}

impl CallSessionEvent {
    pub fn with_sessions(sessions: Vec<UserSession>) -> Self {
        Self {
            data: CallSessionData {
                user_sessions: UserSessions {
                    user_sessions: Some(sessions),
                },
            },
            ..Default::default()
        }
    }

    /// Sessions carried by the notification; empty when the list is absent
    pub fn sessions(&self) -> &[UserSession] {
        self.data.user_sessions.user_sessions.as_deref().unwrap_or(&[])
    }

    pub fn has_session_list(&self) -> bool {
        self.data.user_sessions.user_sessions.is_some()
    }
}
