//! `perch validate`: load the config and print each agent's settings.

use std::path::Path;

use anyhow::Result;
use console::style;
use perch_core::maintenance::normalize_schedule;
use perch_infra::config::load_config;

pub async fn validate(path: &Path, json: bool) -> Result<()> {
    let config = load_config(path).await?;

    // Schedules are only parsed at run time; check them now.
    for agent in &config.agents {
        normalize_schedule(&agent.maintenance_schedule)?;
    }

    if json {
        let report = serde_json::json!({
            "path": path.display().to_string(),
            "otel": config.otel,
            "agents": config.agents,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} is valid",
        style("✓").green(),
        style(path.display()).cyan()
    );
    println!();
    for agent in &config.agents {
        println!("  {}", style(format!("@{}", agent.own_username()?)).bold());
        println!("  Blacklist:      {} names", agent.blacklist.len());
        if let Some(file) = &agent.blacklist_file {
            println!("  Blacklist file: {}", file.display());
        }
        println!("  Session expiry: {}s", agent.session_expiry_secs);
        println!("  Bot cap:        {}", agent.bot_exchange_cap);
        println!("  Length limit:   {}", agent.message_length_limit);
        println!("  Maintenance:    {}", agent.maintenance_schedule);
        println!("  Templates:      {}", agent.reply_templates.len());
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn bad_schedule_fails_validation() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("perch.toml");
        tokio::fs::write(
            &path,
            "[[agents]]\nusername = \"bot\"\nmaintenance_schedule = \"now and then\"\n",
        )
        .await
        .unwrap();

        assert!(validate(&path, true).await.is_err());
    }

    #[tokio::test]
    async fn good_config_passes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("perch.toml");
        tokio::fs::write(&path, "[[agents]]\nusername = \"bot\"\n")
            .await
            .unwrap();

        validate(&path, true).await.unwrap();
    }
}
