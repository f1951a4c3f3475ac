//! Runtime settings and login credentials

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AutoplayerError;
use crate::party::Skill;

/// Default location of the credentials file, relative to the working directory
pub const DEFAULT_CREDENTIALS_PATH: &str = "RequiredData/TextFiles/user_info.txt";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoplayerConfig {
    pub navigation: NavigationSettings,
    pub battle: BattleSettings,
    pub browser: BrowserSettings,
}

/// Timeouts and retry budgets for talking to the website
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    pub navigation_timeout: Duration,
    pub navigation_retries: u32,
    pub click_retries: u32,
    pub movement_retries: u32,
    /// Pause before and after reloading the game while recovering a move
    pub settle_delay: Duration,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(60),
            navigation_retries: 5,
            click_retries: 5,
            movement_retries: 6,
            settle_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleSettings {
    /// Heal when current/max HP drops below this ratio
    pub heal_threshold: f64,
    pub max_turns: u32,
    /// Consecutive unrecognized battle pages tolerated before giving up
    pub max_invalid_pages: u32,
    /// Spells the party has learned and may cast
    pub spells: Vec<Skill>,
}

impl Default for BattleSettings {
    fn default() -> Self {
        Self {
            heal_threshold: 0.55,
            max_turns: 500,
            max_invalid_pages: 5,
            spells: Vec::new(),
        }
    }
}

impl BattleSettings {
    pub fn can_cast(&self, skill: Skill) -> bool {
        self.spells.contains(&skill)
    }

    pub fn enable_spell(&mut self, skill: Skill) {
        if !self.spells.contains(&skill) {
            self.spells.push(skill);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Chrome/Chromium binary; searched on PATH when absent
    pub executable: Option<PathBuf>,
    pub debug_port: u16,
    pub headless: bool,
    /// Persistent profile so site cookies survive between runs
    pub profile_dir: PathBuf,
    /// Attach to a browser already listening on `debug_port`
    pub connect_existing: bool,
    pub startup_timeout: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            debug_port: 9222,
            headless: false,
            profile_dir: default_data_dir().join("profile"),
            connect_existing: false,
            startup_timeout: Duration::from_secs(20),
        }
    }
}

/// Per-user data directory for the profile and logs
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("nq2-autoplayer")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    Traditional,
    Neopass,
}

impl LoginMethod {
    fn expected_layout(self) -> &'static str {
        match self {
            LoginMethod::Traditional => {
                "Traditional login requires two lines: Neopets username, Neopets password"
            }
            LoginMethod::Neopass => {
                "Neopass login requires three lines: Neopass email, Neopass password, Neopets username"
            }
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Traditional {
        username: String,
        password: String,
    },
    Neopass {
        email: String,
        password: String,
        username: String,
    },
}

// Never print passwords
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Traditional { username, .. } => f
                .debug_struct("Traditional")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Neopass {
                email, username, ..
            } => f
                .debug_struct("Neopass")
                .field("email", email)
                .field("password", &"<redacted>")
                .field("username", username)
                .finish(),
        }
    }
}

impl Credentials {
    pub fn load(path: &Path, method: LoginMethod) -> Result<Self, AutoplayerError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AutoplayerError::Config(format!(
                "Could not read credentials file {}: {e}",
                path.display()
            ))
        })?;
        let credentials = Self::parse(&text, method)?;
        info!(
            "Loaded {:?} login details for {}",
            method,
            credentials.username()
        );
        Ok(credentials)
    }

    /// One value per line; trailing blank lines are ignored.
    pub fn parse(text: &str, method: LoginMethod) -> Result<Self, AutoplayerError> {
        if text.trim().is_empty() {
            return Err(AutoplayerError::Config(
                "The user info file is empty! Please fill out your login details.".to_string(),
            ));
        }

        let mut lines: Vec<&str> = text.lines().map(str::trim).collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        match (method, lines.as_slice()) {
            (LoginMethod::Traditional, [username, password])
                if !username.is_empty() && !password.is_empty() =>
            {
                Ok(Credentials::Traditional {
                    username: username.to_string(),
                    password: password.to_string(),
                })
            }
            (LoginMethod::Neopass, [email, password, username])
                if !email.is_empty() && !password.is_empty() && !username.is_empty() =>
            {
                Ok(Credentials::Neopass {
                    email: email.to_string(),
                    password: password.to_string(),
                    username: username.to_string(),
                })
            }
            _ => Err(AutoplayerError::Config(
                method.expected_layout().to_string(),
            )),
        }
    }

    pub fn method(&self) -> LoginMethod {
        match self {
            Credentials::Traditional { .. } => LoginMethod::Traditional,
            Credentials::Neopass { .. } => LoginMethod::Neopass,
        }
    }

    /// The Neopets account name, for either login method
    pub fn username(&self) -> &str {
        match self {
            Credentials::Traditional { username, .. } | Credentials::Neopass { username, .. } => {
                username
            }
        }
    }
}
