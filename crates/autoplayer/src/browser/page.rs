use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::cdp_client::{CdpClient, TargetInfo};
use super::connection::{wait_for_event, CdpConnection};
use super::{BrowserPage, ClickKind};
use crate::errors::AutoplayerError;
use crate::selector::Selector;

const LOAD_EVENT: &str = "Page.loadEventFired";
const POPUP_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A browser tab driven over its own DevTools WebSocket
pub struct CdpPage {
    client: CdpClient,
    target: TargetInfo,
    connection: CdpConnection,
}

impl CdpPage {
    /// Attach to an existing tab and enable the domains we listen to.
    pub async fn attach(client: CdpClient, target: TargetInfo) -> Result<Self, AutoplayerError> {
        let ws_url = target.websocket_url.clone().ok_or_else(|| {
            AutoplayerError::Browser(format!(
                "Target {} has no DevTools WebSocket (is another debugger attached?)",
                target.id
            ))
        })?;
        let connection = CdpConnection::connect(&ws_url).await?;
        connection.call("Page.enable", json!({})).await?;
        connection.call("Runtime.enable", json!({})).await?;
        debug!("Attached to tab {} ({})", target.id, target.url);

        Ok(Self {
            client,
            target,
            connection,
        })
    }

    pub fn target_id(&self) -> &str {
        &self.target.id
    }

    pub async fn bring_to_front(&self) -> Result<(), AutoplayerError> {
        self.connection
            .call("Page.bringToFront", json!({}))
            .await
            .map(|_| ())
    }

    /// Poll `document.readyState` until the document finished loading.
    pub async fn wait_for_ready(&self, timeout: Duration) -> Result<(), AutoplayerError> {
        let deadline = Instant::now() + timeout;
        loop {
            let state = self.evaluate("document.readyState").await?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AutoplayerError::Timeout(format!(
                    "Document still '{}' after {timeout:?}",
                    state.as_str().unwrap_or("unknown")
                )));
            }
            tokio::time::sleep(POPUP_POLL_INTERVAL).await;
        }
    }

    /// Run `body` against the first element matched by `selector`. The
    /// generated function returns `false` when nothing matched.
    async fn with_first_element(
        &self,
        selector: &Selector,
        body: &str,
    ) -> Result<(), AutoplayerError> {
        let query = selector
            .to_js_query()
            .ok_or_else(|| AutoplayerError::InvalidSelector(selector.to_string()))?;
        let script = format!(
            "(function(){{const el=({query})[0];if(!el){{return false;}}{body}return true;}})()"
        );
        match self.evaluate(&script).await? {
            Value::Bool(true) => Ok(()),
            _ => Err(AutoplayerError::ElementNotFound(selector.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl BrowserPage for CdpPage {
    #[instrument(level = "debug", skip(self))]
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), AutoplayerError> {
        let mut events = self.connection.subscribe();
        let result = self
            .connection
            .call_with_timeout("Page.navigate", json!({ "url": url }), timeout)
            .await?;

        if let Some(error_text) = result
            .get("errorText")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            return Err(AutoplayerError::Navigation(format!("{url}: {error_text}")));
        }

        wait_for_event(&mut events, LOAD_EVENT, timeout).await?;
        Ok(())
    }

    async fn reload(&self, timeout: Duration) -> Result<(), AutoplayerError> {
        let mut events = self.connection.subscribe();
        self.connection
            .call_with_timeout("Page.reload", json!({}), timeout)
            .await?;
        wait_for_event(&mut events, LOAD_EVENT, timeout).await?;
        Ok(())
    }

    async fn content(&self) -> Result<String, AutoplayerError> {
        let value = self
            .evaluate("document.documentElement ? document.documentElement.outerHTML : ''")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn url(&self) -> Result<String, AutoplayerError> {
        let value = self.evaluate("window.location.href").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, AutoplayerError> {
        let response = self
            .connection
            .call(
                "Runtime.evaluate",
                json!({
                    "expression": script,
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;

        if let Some(details) = response.get("exceptionDetails") {
            let message = details
                .pointer("/exception/description")
                .and_then(Value::as_str)
                .or_else(|| details.get("text").and_then(Value::as_str))
                .unwrap_or("unknown exception");
            return Err(AutoplayerError::Script(message.to_string()));
        }

        Ok(response
            .pointer("/result/value")
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn count(&self, selector: &Selector) -> Result<usize, AutoplayerError> {
        let query = selector
            .to_js_query()
            .ok_or_else(|| AutoplayerError::InvalidSelector(selector.to_string()))?;
        let value = self.evaluate(&format!("({query}).length")).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    #[instrument(level = "debug", skip(self))]
    async fn click(
        &self,
        selector: &Selector,
        kind: ClickKind,
        wait_for_navigation: Option<Duration>,
    ) -> Result<(), AutoplayerError> {
        let body = match kind {
            ClickKind::Native => "el.click();",
            ClickKind::Dispatch => {
                "el.dispatchEvent(new MouseEvent('click',{bubbles:true,cancelable:true,view:window}));"
            }
        };

        match wait_for_navigation {
            Some(timeout) => {
                let mut events = self.connection.subscribe();
                self.with_first_element(selector, body).await?;
                wait_for_event(&mut events, LOAD_EVENT, timeout).await?;
                Ok(())
            }
            None => self.with_first_element(selector, body).await,
        }
    }

    async fn fill(&self, selector: &Selector, text: &str) -> Result<(), AutoplayerError> {
        // Focus and clear through the DOM, then type through the input pipeline
        // so framework-managed inputs see real input events.
        self.with_first_element(
            selector,
            "el.focus();if(typeof el.select==='function'){el.select();}",
        )
        .await?;
        self.connection
            .call("Input.insertText", json!({ "text": text }))
            .await?;
        Ok(())
    }

    async fn click_expect_popup(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<Arc<dyn BrowserPage>, AutoplayerError> {
        let known: HashSet<String> = self
            .client
            .list_pages()
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();

        self.click(selector, ClickKind::Native, None).await?;

        let deadline = Instant::now() + timeout;
        loop {
            let opened = self
                .client
                .list_pages()
                .await?
                .into_iter()
                .find(|t| !known.contains(&t.id));

            if let Some(target) = opened {
                debug!("Popup opened: {} ({})", target.id, target.url);
                let page = CdpPage::attach(self.client.clone(), target).await?;
                page.bring_to_front().await?;
                let remaining = deadline.saturating_duration_since(Instant::now());
                page.wait_for_ready(remaining.max(POPUP_POLL_INTERVAL)).await?;
                return Ok(Arc::new(page));
            }

            if Instant::now() >= deadline {
                return Err(AutoplayerError::Timeout(format!(
                    "No new tab opened within {timeout:?} after clicking {selector}"
                )));
            }
            tokio::time::sleep(POPUP_POLL_INTERVAL).await;
        }
    }
}
