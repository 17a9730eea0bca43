//! `perch run`: every configured agent over one inbound event stream.
//!
//! Events are read from a JSON-lines file (or stdin) and fanned out to each
//! agent in arrival order. Outbound actions go to a recording sink, so a run
//! never touches a real platform. Notifications are printed as they happen.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use console::style;
use futures_util::future::join_all;
use perch_core::agent::{Agent, RunStats};
use perch_core::dispatch::DispatchEngine;
use perch_core::maintenance::{BlacklistSource, MaintenanceScheduler, maintenance_task};
use perch_core::notify::NotificationBus;
use perch_infra::blacklist::BlacklistFile;
use perch_infra::composer::TemplateComposer;
use perch_infra::sink::RecordingSink;
use perch_infra::source::forward_events_from;
use perch_types::config::PerchConfig;
use perch_types::event::InboundEvent;
use perch_types::notification::Notification;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Buffered events per agent before the fan-out waits.
const AGENT_QUEUE: usize = 256;

pub async fn run(config: PerchConfig, events: Option<PathBuf>, json: bool, quiet: bool) -> Result<()> {
    let bus = NotificationBus::default();
    let cancel = CancellationToken::new();

    let scheduler = MaintenanceScheduler::new();
    scheduler.start().await?;

    let printer = tokio::spawn(print_notifications(
        bus.subscribe(),
        json,
        quiet,
        cancel.clone(),
    ));

    let mut agent_txs = Vec::with_capacity(config.agents.len());
    let mut handles: Vec<JoinHandle<(String, RunStats)>> = Vec::with_capacity(config.agents.len());

    for agent_config in &config.agents {
        let engine = Arc::new(
            DispatchEngine::new(agent_config, RecordingSink::new())?.with_bus(bus.clone()),
        );
        let username = engine.username().to_string();

        let blacklist_file = agent_config.blacklist_file.clone().map(BlacklistFile::new);
        if let Some(file) = &blacklist_file {
            let names = file.load().await?;
            let size = engine.replace_blacklist(names);
            tracing::info!(agent = %username, size, "blacklist loaded");
        }

        scheduler
            .schedule(
                &username,
                &agent_config.maintenance_schedule,
                maintenance_task(engine.clone(), blacklist_file.map(Arc::new)),
            )
            .await?;

        let agent = Agent::new(engine, TemplateComposer::new(agent_config.reply_templates.clone()))
            .with_follow_back(agent_config.follow_back);

        let (tx, rx) = mpsc::channel(AGENT_QUEUE);
        agent_txs.push(tx);

        let agent_cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            let stats = agent.run(rx, agent_cancel).await;
            (username, stats)
        }));
    }

    let (source_tx, source_rx) = mpsc::channel(AGENT_QUEUE);
    let source = tokio::spawn(async move { forward_events_from(events.as_deref(), source_tx).await });
    tokio::spawn(fan_out(source_rx, agent_txs));

    let all = join_all(handles);
    tokio::pin!(all);
    let results = tokio::select! {
        results = &mut all => results,
        _ = crate::shutdown_signal() => {
            tracing::info!("shutdown requested");
            cancel.cancel();
            all.await
        }
    };

    cancel.cancel();
    scheduler.stop().await?;
    let _ = printer.await;

    // An interrupted run may still be waiting on stdin.
    if !source.is_finished() {
        source.abort();
    }
    match source.await {
        Ok(Ok(forwarded)) => tracing::debug!(forwarded, "event source finished"),
        Ok(Err(e)) => tracing::warn!("event source stopped: {e}"),
        Err(e) if e.is_cancelled() => tracing::debug!("event source aborted"),
        Err(e) => tracing::warn!("event source task failed: {e}"),
    }

    let mut stats = Vec::with_capacity(results.len());
    for result in results {
        stats.push(result?);
    }
    print_stats(&stats, json, quiet)?;
    Ok(())
}

/// Copy every event to each agent, in arrival order.
async fn fan_out(mut source: mpsc::Receiver<InboundEvent>, agents: Vec<mpsc::Sender<InboundEvent>>) {
    while let Some(event) = source.recv().await {
        for tx in &agents {
            // A closed agent has been cancelled; the others keep going.
            let _ = tx.send(event.clone()).await;
        }
    }
}

/// Print notifications until cancelled, draining anything already queued.
async fn print_notifications(
    mut rx: broadcast::Receiver<Notification>,
    json: bool,
    quiet: bool,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            received = rx.recv() => match received {
                Ok(notification) => {
                    if !quiet {
                        print_notification(&notification, json);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "notification printer lagged, skipping {n} notifications");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = cancel.cancelled() => break,
        }
    }
}

fn print_notification(notification: &Notification, json: bool) {
    if json {
        match serde_json::to_string(notification) {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::warn!("Failed to serialize notification: {err}"),
        }
        return;
    }

    let label = style(format!("{:>14}", notification.name())).cyan();
    match notification {
        Notification::Startup { username } => println!("{label}  @{username} ready"),
        Notification::Connected { friend_count } => {
            println!("{label}  online, {friend_count} friends")
        }
        Notification::Mention { message, context } | Notification::Timeline { message, context } => {
            println!(
                "{label}  @{}: {} {}",
                message.author,
                context.mentionless_text,
                style(format!("(budget {})", context.char_budget)).dim()
            )
        }
        Notification::DirectMessage { message } => {
            println!("{label}  @{}: {}", message.sender, message.text)
        }
        Notification::Follow { follower } => println!("{label}  @{follower}"),
    }
}

fn print_stats(stats: &[(String, RunStats)], json: bool, quiet: bool) -> Result<()> {
    if json {
        let summary: Vec<_> = stats
            .iter()
            .map(|(agent, stats)| serde_json::json!({ "agent": agent, "stats": stats }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    if quiet {
        return Ok(());
    }

    println!();
    for (agent, s) in stats {
        println!("  {}", style(format!("@{agent}")).bold());
        println!("  Events:     {}", s.events);
        println!("  Notified:   {}", s.notified);
        println!("  Engaged:    {}", style(s.engaged).green());
        if s.suppressed > 0 {
            println!("  Suppressed: {}", style(s.suppressed).yellow());
        }
        if s.failed > 0 {
            println!("  Failed:     {}", style(s.failed).red());
        }
        println!();
    }
    Ok(())
}
