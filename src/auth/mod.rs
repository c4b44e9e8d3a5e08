//! Authentication module for Toodledo
//!
//! Implements the OAuth2 authorization code flow: a one-time code exchange,
//! then transparent refreshes whenever the access token nears expiry.

pub mod oauth;
pub mod store;
pub mod tokens;

use anyhow::{Context, Result};
use oauth2::{AuthUrl, ClientId, ClientSecret, Scope, TokenUrl};

use crate::config::Settings;

pub use oauth::TokenManager;
pub use store::CredentialStore;
pub use tokens::{TokenSet, TokenStatus};

/// Toodledo OAuth2 client configuration
pub struct AuthConfig {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    /// Must match the redirect URI registered for the client
    pub redirect_uri: String,
    pub auth_url: AuthUrl,
    pub token_url: TokenUrl,
    /// Requested in the authorization URL only, never at the token endpoint
    pub scopes: Vec<Scope>,
}

impl AuthConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base = settings.base_url();

        url::Url::parse(&settings.redirect_uri)
            .with_context(|| format!("Invalid redirect URI: {}", settings.redirect_uri))?;

        Ok(Self {
            client_id: ClientId::new(settings.client_id.clone()),
            client_secret: ClientSecret::new(settings.client_secret.clone()),
            redirect_uri: settings.redirect_uri.clone(),
            auth_url: AuthUrl::new(format!("{}/account/authorize.php", base))
                .context("Invalid API base URL")?,
            token_url: TokenUrl::new(format!("{}/account/token.php", base))
                .context("Invalid API base URL")?,
            scopes: settings
                .scopes
                .split_whitespace()
                .map(|s| Scope::new(s.to_string()))
                .collect(),
        })
    }
}

/// Print the consent URL and what to do with the resulting code.
pub fn print_authorization_steps(tokens: &TokenManager) {
    println!("Open this URL in your browser:\n");
    println!("  {}\n", tokens.authorization_url());
    println!("1. Click 'Allow' to authorize the application");
    println!("2. You'll be redirected to a callback URL");
    println!("3. Copy the 'code' parameter from the redirect URL");
    println!("4. Run: toodledo-mcp authorize <code>");
}

/// Show whether tokens exist and how long the access token has left.
pub fn status(tokens: &TokenManager) {
    println!("Token store: {}", tokens.store().path().display());

    match tokens.status() {
        Some(status) => {
            let state = if status.remaining_secs <= 0 {
                "expired"
            } else if status.refresh_due {
                "expiring (refresh due)"
            } else {
                "valid"
            };
            println!("Access token: {}", state);

            let expires = chrono::DateTime::from_timestamp(status.expires_at as i64, 0)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| status.expires_at.to_string());
            println!("  expires_at: {}", expires);
            if status.remaining_secs > 0 {
                println!(
                    "  remaining:  {}m {}s",
                    status.remaining_secs / 60,
                    status.remaining_secs % 60
                );
            }
        }
        None => {
            println!("Access token: none");
            println!("\nRun `toodledo-mcp auth-url` to get started.");
        }
    }
}
