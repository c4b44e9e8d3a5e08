//! API client module for Toodledo

mod account;
pub mod client;
mod lists;
pub mod tasks;

use anyhow::{Context, Result};
use oauth2::AuthorizationCode;

pub use client::ToodledoClient;
pub use tasks::{Completion, TaskQuery};

use crate::models::{NewTask, Task, TaskEdit};

/// Show current account info
pub async fn whoami(client: &ToodledoClient) -> Result<()> {
    account::whoami(client).await
}

/// Exchange an authorization code and confirm it with an account probe.
pub async fn authorize(client: &ToodledoClient, code: &str) -> Result<()> {
    tracing::info!("Exchanging authorization code...");
    client
        .tokens()
        .exchange_authorization_code(&AuthorizationCode::new(code.trim().to_string()))
        .await?;

    let account = client
        .account()
        .await
        .context("Tokens saved, but the account probe failed")?;

    println!("\nAuthorization successful!");
    println!("User:         {}", account.alias_or_unknown());
    println!("Email:        {}", account.email_or_unknown());
    println!(
        "Account Type: {}",
        if account.is_pro() { "Pro" } else { "Free" }
    );
    println!(
        "\nTokens saved to {}",
        client.tokens().store().path().display()
    );
    Ok(())
}

/// List tasks, optionally only starred ones. `query.num` is the display
/// limit.
pub async fn list_tasks(
    client: &ToodledoClient,
    query: TaskQuery,
    starred_only: bool,
) -> Result<()> {
    let limit = query.num as usize;
    let completion = query.completion;
    let query = TaskQuery {
        // Starring is filtered locally, so fetch a full page first
        num: if starred_only {
            tasks::MAX_PAGE_SIZE
        } else {
            query.num
        },
        ..query
    };

    let list = client.tasks(&query).await?;
    let tasks: Vec<&Task> = list
        .tasks
        .iter()
        .filter(|t| !starred_only || t.is_starred())
        .take(limit)
        .collect();

    println!("\nTasks ({}):", completion.as_str());
    println!("{:-<60}", "");
    print_numbered(&tasks);

    if let Some(header) = list.header {
        if header.total > header.num {
            println!(
                "(page of {} from {} total; use --offset for more)",
                header.num, header.total
            );
        }
    }
    Ok(())
}

/// Create one task and print its id.
pub async fn add_task(client: &ToodledoClient, task: NewTask) -> Result<()> {
    let created = client.add_task(task).await?;
    for task in &created {
        println!("Created task {}: {}", task.id, task.title_or_untitled());
    }
    Ok(())
}

/// Mark a task completed as of now.
pub async fn complete_task(client: &ToodledoClient, id: i64) -> Result<()> {
    let edited = client
        .edit_task(TaskEdit {
            id,
            completed: Some(chrono::Utc::now().timestamp()),
            ..TaskEdit::default()
        })
        .await?;
    if edited.is_empty() {
        anyhow::bail!("Toodledo did not confirm completing task {}", id);
    }
    println!("Completed task {}", id);
    Ok(())
}

pub async fn delete_task(client: &ToodledoClient, id: i64) -> Result<()> {
    let deleted = client.delete_task(id).await?;
    if !deleted.contains(&id) {
        anyhow::bail!("Toodledo did not confirm deleting task {}", id);
    }
    println!("Deleted task {}", id);
    Ok(())
}

/// Force a refresh regardless of the current token's expiry.
pub async fn refresh(client: &ToodledoClient) -> Result<()> {
    client.tokens().refresh().await?;
    if let Some(status) = client.tokens().status() {
        println!(
            "Token refreshed; valid for another {}m",
            status.remaining_secs / 60
        );
    }
    Ok(())
}

/// Starred "Next Action" tasks
pub async fn hot_list(client: &ToodledoClient) -> Result<()> {
    let list = client.tasks(&TaskQuery::default()).await?;
    let hot = tasks::hot_list(&list.tasks);

    println!("\n=== Hot List ({} items) ===\n", hot.len());
    print_numbered(&hot);
    Ok(())
}

fn print_numbered(tasks: &[&Task]) {
    if tasks.is_empty() {
        println!("  (no tasks found)");
        return;
    }
    for (i, task) in tasks.iter().enumerate() {
        let due = task
            .due_date_string()
            .map(|d| format!(" [Due: {}]", d))
            .unwrap_or_default();
        let star = if task.is_starred() { " *" } else { "" };
        println!("{}. {}{}{}", i + 1, task.title_or_untitled(), star, due);
    }
}
