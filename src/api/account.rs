//! Account endpoint (/account/get.php)

use super::client::ToodledoClient;
use crate::error::Result;
use crate::models::Account;

impl ToodledoClient {
    pub async fn account(&self) -> Result<Account> {
        self.get("/account/get.php", &[]).await
    }
}

/// Fetch and display account info.
pub async fn whoami(client: &ToodledoClient) -> anyhow::Result<()> {
    let account = client.account().await?;

    println!();
    println!("User:         {}", account.alias_or_unknown());
    println!("Email:        {}", account.email_or_unknown());
    println!(
        "Account Type: {}",
        if account.is_pro() { "Pro" } else { "Free" }
    );
    if let Some(ref id) = account.userid {
        println!("ID:           {}", id);
    }

    Ok(())
}
