use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub addon_sig: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LegacyPingResponse {
    pub response: Option<LegacyPingBody>,
}

#[derive(Debug, Deserialize)]
pub struct LegacyPingBody {
    pub signed: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRequest<'a> {
    pub language: &'a str,
    pub region: &'a str,
    pub catalog_id: &'a str,
    pub id: &'a str,
    pub adult: bool,
    pub search: &'a str,
    pub sort: &'a str,
    pub filter: serde_json::Value,
    pub cursor: u32,
    pub client_version: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest<'a> {
    pub language: &'a str,
    pub region: &'a str,
    pub url: &'a str,
    pub client_version: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ResolvedLink {
    pub url: Option<String>,
}
