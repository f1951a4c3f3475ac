use serde::Deserialize;
use tracing::debug;

use crate::errors::AutoplayerError;

/// Lightweight Chrome DevTools HTTP client for discovering browser targets
#[derive(Debug, Clone)]
pub struct CdpClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetInfo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type", default)]
    pub target_type: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub websocket_url: Option<String>,
}

impl TargetInfo {
    pub fn is_page(&self) -> bool {
        self.target_type == "page"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser", default)]
    pub browser: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub websocket_url: Option<String>,
}

impl CdpClient {
    /// Create a new client for a browser listening on localhost
    pub fn new(debug_port: u16) -> Self {
        Self::with_host("127.0.0.1", debug_port)
    }

    pub fn with_host(host: &str, debug_port: u16) -> Self {
        Self {
            base_url: format!("http://{host}:{debug_port}"),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if a browser is running with DevTools enabled
    pub async fn is_available(&self) -> bool {
        match self
            .client
            .get(format!("{}/json/version", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub async fn version(&self) -> Result<BrowserVersion, AutoplayerError> {
        let version = self
            .client
            .get(format!("{}/json/version", self.base_url))
            .send()
            .await?
            .json::<BrowserVersion>()
            .await?;
        Ok(version)
    }

    /// Get list of all targets (tabs, workers, extensions)
    pub async fn list_targets(&self) -> Result<Vec<TargetInfo>, AutoplayerError> {
        let targets: Vec<TargetInfo> = self
            .client
            .get(format!("{}/json/list", self.base_url))
            .send()
            .await?
            .json()
            .await?;

        debug!("Found {} DevTools targets", targets.len());
        Ok(targets)
    }

    /// Only the tabs
    pub async fn list_pages(&self) -> Result<Vec<TargetInfo>, AutoplayerError> {
        Ok(self
            .list_targets()
            .await?
            .into_iter()
            .filter(TargetInfo::is_page)
            .collect())
    }

    /// Open a new tab. Recent Chrome versions only accept PUT here.
    pub async fn new_page(&self, url: &str) -> Result<TargetInfo, AutoplayerError> {
        let target = self
            .client
            .put(format!("{}/json/new?{}", self.base_url, url))
            .send()
            .await?
            .json::<TargetInfo>()
            .await?;
        debug!("Opened new tab {} at {}", target.id, target.url);
        Ok(target)
    }
}
