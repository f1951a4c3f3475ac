use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::cdp_client::CdpClient;
use super::page::CdpPage;
use crate::config::BrowserSettings;
use crate::errors::AutoplayerError;

const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(250);

const EXECUTABLE_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
    "msedge",
];

const WELL_KNOWN_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

/// Starts (or connects to) a Chromium-family browser with remote debugging
/// enabled. A browser we spawned is killed when the launcher is dropped.
pub struct BrowserLauncher {
    settings: BrowserSettings,
    child: Option<Child>,
}

impl BrowserLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            child: None,
        }
    }

    pub fn client(&self) -> CdpClient {
        CdpClient::new(self.settings.debug_port)
    }

    /// Launch or connect according to the settings and return the first tab.
    pub async fn start(&mut self) -> Result<CdpPage, AutoplayerError> {
        let client = self.client();

        if self.settings.connect_existing {
            info!(
                "Connecting to running browser at {}",
                client.base_url()
            );
            if !client.is_available().await {
                return Err(AutoplayerError::Browser(format!(
                    "No browser is listening at {}. Start Chrome with --remote-debugging-port={}",
                    client.base_url(),
                    self.settings.debug_port
                )));
            }
        } else {
            self.spawn().await?;
            self.wait_until_available(&client).await?;
        }

        let version = client.version().await?;
        info!("Browser ready: {}", version.browser);

        let target = match client.list_pages().await?.into_iter().next() {
            Some(target) => target,
            None => client.new_page("about:blank").await?,
        };
        CdpPage::attach(client, target).await
    }

    async fn spawn(&mut self) -> Result<(), AutoplayerError> {
        let executable = self.find_executable()?;
        std::fs::create_dir_all(&self.settings.profile_dir)?;

        let mut command = Command::new(&executable);
        command
            .arg(format!("--remote-debugging-port={}", self.settings.debug_port))
            .arg(format!(
                "--user-data-dir={}",
                self.settings.profile_dir.display()
            ))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-popup-blocking");
        if self.settings.headless {
            command.arg("--headless=new");
        }
        command
            .arg("about:blank")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        info!(
            "Launching {} (headless: {})",
            executable.display(),
            self.settings.headless
        );
        let child = command.spawn().map_err(|e| {
            AutoplayerError::Browser(format!("Failed to start {}: {e}", executable.display()))
        })?;
        self.child = Some(child);
        Ok(())
    }

    async fn wait_until_available(&mut self, client: &CdpClient) -> Result<(), AutoplayerError> {
        let deadline = Instant::now() + self.settings.startup_timeout;
        loop {
            if client.is_available().await {
                return Ok(());
            }
            if let Some(child) = self.child.as_mut() {
                if let Ok(Some(status)) = child.try_wait() {
                    return Err(AutoplayerError::Browser(format!(
                        "Browser exited during startup with {status}"
                    )));
                }
            }
            if Instant::now() >= deadline {
                return Err(AutoplayerError::Timeout(format!(
                    "DevTools endpoint {} did not come up within {:?}",
                    client.base_url(),
                    self.settings.startup_timeout
                )));
            }
            tokio::time::sleep(STARTUP_POLL_INTERVAL).await;
        }
    }

    fn find_executable(&self) -> Result<PathBuf, AutoplayerError> {
        if let Some(path) = &self.settings.executable {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(AutoplayerError::Config(format!(
                "Browser executable {} does not exist",
                path.display()
            )));
        }

        if let Some(found) = search_path(EXECUTABLE_NAMES) {
            debug!("Found browser on PATH: {}", found.display());
            return Ok(found);
        }

        WELL_KNOWN_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .ok_or_else(|| {
                AutoplayerError::Config(
                    "No Chrome/Chromium executable found; pass --chrome <path>".to_string(),
                )
            })
    }

    /// Terminate a browser we launched. Connected browsers are left running.
    pub async fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to stop browser: {}", e);
            }
        }
    }
}

fn search_path(names: &[&str]) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        for name in names {
            let candidate = executable_in(&dir, name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

fn executable_in(dir: &Path, name: &str) -> PathBuf {
    if cfg!(windows) {
        dir.join(format!("{name}.exe"))
    } else {
        dir.join(name)
    }
}
