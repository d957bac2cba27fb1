//! `supportdesk config show` and `supportdesk status`.

use console::style;
use serde_json::json;

use supportdesk_infra::sqlite::pool::DatabasePool;
use supportdesk_types::config::AppConfig;

/// Print the effective configuration. Secrets never appear in the output.
pub fn show(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    if json {
        let mut value = serde_json::to_value(config)?;
        value["auth"]["secret"] = json!("<redacted>");
        if config.completion.api_key.is_some() {
            value["completion"]["api_key"] = json!("<redacted>");
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!();
        println!("  {}", style("Supportdesk configuration").bold());
        println!();
        println!("{config:#?}");
        println!();
    }
    Ok(())
}

/// Connect to the database (running pending migrations) and report.
pub async fn status(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let pool = DatabasePool::new(&config.database.url).await?;
    pool.ping().await?;

    if json {
        let report = json!({
            "environment": config.environment.to_string(),
            "database": config.database.url,
            "database_ok": true,
            "completion_configured": config.completion.has_api_key(),
            "model": config.completion.model,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let mark = |ok: bool| {
            if ok {
                format!("{}", style("✓").green())
            } else {
                format!("{}", style("✗").red())
            }
        };
        println!();
        println!(
            "  {} Environment: {}",
            mark(true),
            style(config.environment).cyan()
        );
        println!("  {} Database: {}", mark(true), config.database.url);
        println!(
            "  {} Completion API key ({})",
            mark(config.completion.has_api_key()),
            config.completion.model
        );
        println!();
    }
    Ok(())
}
