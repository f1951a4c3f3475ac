use tracing::{info, instrument};

use crate::config::{Credentials, LoginMethod};
use crate::errors::AutoplayerError;
use crate::pages::SitePage;
use crate::selector::Selector;
use crate::urls;

const ALREADY_LOGGED_IN_LOCATOR: &str = "a[href='/logout.phtml']";

const TRADITIONAL_LOGIN_FORM_LOCATOR: &str = "form.login-form";
const TRADITIONAL_USERNAME_LOCATOR: &str = "input#loginUsername";
const TRADITIONAL_PASSWORD_LOCATOR: &str = "input#loginPassword";
const TRADITIONAL_SIGN_IN_LOCATOR: &str = "button#loginButton";

const NEOPASS_SIGN_UP_TEXT: &str = "Create A Free NeoPass";
const NEOPASS_EMAIL_LOCATOR: &str = "input[type='email'][name='email']";
const NEOPASS_PASSWORD_LOCATOR: &str = "input[type='password'][name='password']";
const NEOPASS_SIGN_IN_LOCATOR: &str = "//button[@type='submit' and contains(., 'Sign In')]";
const NEOPASS_LAUNCH_BUTTON_LOCATOR: &str = "//button[text()='Launch']";
const NEOPASS_CONTINUE_BUTTON_LOCATOR: &str = "//button[text()='Continue']";

/// Account picker button for one Neopets username
fn neopass_account_locator(username: &str) -> Selector {
    Selector::xpath(format!("//button[.//h4[contains(text(), '{username}')]]"))
}

/// Signs into Neopets and hands back the page the game should be played in.
pub struct LoginHandler {
    site: SitePage,
    credentials: Credentials,
}

impl LoginHandler {
    pub fn new(site: SitePage, credentials: Credentials) -> Self {
        Self { site, credentials }
    }

    pub fn method(&self) -> LoginMethod {
        self.credentials.method()
    }

    /// Whether the current page shows the logout link.
    pub async fn is_logged_in(&self) -> Result<bool, AutoplayerError> {
        Ok(self.site.locator(ALREADY_LOGGED_IN_LOCATOR).count().await? > 0)
    }

    /// Log in when needed, then open the main game page. NeoPass moves the
    /// session into a new tab, so callers must continue with the returned page.
    #[instrument(level = "info", skip(self), fields(method = ?self.method()))]
    pub async fn login_and_go_to_game(&self) -> Result<SitePage, AutoplayerError> {
        let session = if self.is_logged_in().await? {
            info!("Already logged in as {}", self.credentials.username());
            self.site.clone()
        } else {
            match &self.credentials {
                Credentials::Traditional { username, password } => {
                    info!("Attempting login with traditional login...");
                    self.login_traditional(username, password).await?
                }
                Credentials::Neopass {
                    email,
                    password,
                    username,
                } => {
                    info!("Attempting login with Neopass...");
                    self.login_with_neopass(email, password, username).await?
                }
            }
        };

        session
            .go_to_url_and_wait_navigation(urls::MAIN_GAME_URL)
            .await?;
        Ok(session)
    }

    async fn login_traditional(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SitePage, AutoplayerError> {
        self.site
            .go_to_url_and_wait_navigation(urls::LOGIN_TRADITIONAL_URL)
            .await?;
        self.site
            .locator(TRADITIONAL_LOGIN_FORM_LOCATOR)
            .wait(None)
            .await?;

        self.site
            .locator(TRADITIONAL_USERNAME_LOCATOR)
            .fill(username)
            .await?;
        self.site
            .locator(TRADITIONAL_PASSWORD_LOCATOR)
            .fill(password)
            .await?;
        self.site
            .locator(TRADITIONAL_SIGN_IN_LOCATOR)
            .click_and_wait()
            .await?;

        info!("Login with traditional login should be complete. Returning control to autoplayer");
        Ok(self.site.clone())
    }

    async fn login_with_neopass(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<SitePage, AutoplayerError> {
        self.site
            .go_to_url_and_wait_navigation(urls::LOGIN_NEOPASS_URL)
            .await?;

        // A previous run may have authenticated already and only the session
        // launch is missing.
        if self.site.url().await? != urls::NEOPASS_ACCOUNTS_URL {
            self.site
                .locator(Selector::text(NEOPASS_SIGN_UP_TEXT))
                .wait(None)
                .await?;
            self.site.locator(NEOPASS_EMAIL_LOCATOR).fill(email).await?;
            self.site
                .locator(NEOPASS_PASSWORD_LOCATOR)
                .fill(password)
                .await?;
            self.site.locator(NEOPASS_SIGN_IN_LOCATOR).click().await?;
        }

        let launch_button = self.site.locator(NEOPASS_LAUNCH_BUTTON_LOCATOR);
        launch_button.wait(None).await?;
        let account_tab = self
            .site
            .browser_page()
            .click_expect_popup(launch_button.selector(), launch_button.timeout())
            .await?;
        let session = SitePage::new(account_tab, self.site.settings().clone());

        let account_button = session.locator(neopass_account_locator(username));
        account_button.wait(None).await?;
        account_button.click().await?;

        session
            .locator(NEOPASS_CONTINUE_BUTTON_LOCATOR)
            .click_and_wait()
            .await?;

        info!("Login with Neopass should be complete. Returning control to autoplayer");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_locator_targets_username() {
        assert_eq!(
            neopass_account_locator("questfan"),
            Selector::XPath("//button[.//h4[contains(text(), 'questfan')]]".to_string())
        );
    }

    #[test]
    fn test_locator_strings_parse_to_expected_kinds() {
        assert!(matches!(
            Selector::from(NEOPASS_LAUNCH_BUTTON_LOCATOR),
            Selector::XPath(_)
        ));
        assert!(matches!(
            Selector::from(TRADITIONAL_USERNAME_LOCATOR),
            Selector::Css(_)
        ));
    }
}
