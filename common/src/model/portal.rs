use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalClient {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalProject {
    pub id: Uuid,
    pub name: String,
    pub status: String,
}

/// What a client-portal user sees on their home page.
///
/// A portal account that is not yet linked to a client gets `client: None`
/// and an explanatory `message` instead of an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalOverview {
    pub client: Option<PortalClient>,
    pub projects: Vec<PortalProject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
