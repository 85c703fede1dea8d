use std::collections::HashSet;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use tidings::alerts::AlertStore;
use tidings::api::HttpApi;
use tidings::config::{self, Config};
use tidings::jobs::UpdateDetector;
use tidings::models::alert::Alert;
use tidings::models::session::SessionHandle;
use tidings::models::status::ReleaseId;
use tidings::notification::{FeedEntry, NotificationFeed};
use tidings::store::{self, MemoryStorage, SeenRegistry};

/// Everything one client session needs, wired once and shared by the commands.
struct App {
    cfg: Config,
    alerts: AlertStore,
    seen: SeenRegistry,
    detector: Arc<UpdateDetector>,
    feed: NotificationFeed,
}

impl App {
    async fn build(cfg: Config) -> anyhow::Result<Self> {
        let session = SessionHandle::new(cfg.session());
        let api = Arc::new(HttpApi::from_config(&cfg, session.clone())?);

        let storage = match store::open(&cfg.seen_store).await {
            Ok(storage) => storage,
            Err(e) => {
                tracing::warn!(
                    url = %cfg.seen_store,
                    error = %e,
                    "seen registry unavailable, falling back to memory"
                );
                Arc::new(MemoryStorage::new())
            }
        };
        let seen = SeenRegistry::new(storage);
        let alerts = AlertStore::new();

        let detector = Arc::new(
            UpdateDetector::new(api.clone(), session.clone(), alerts.clone(), seen.clone())
                .with_schedule(cfg.startup_delay, cfg.poll_interval),
        );
        let feed = NotificationFeed::new(api);

        Ok(Self {
            cfg,
            alerts,
            seen,
            detector,
            feed,
        })
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "tidings=info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load()?;
    init_tracing(cfg.log_json);
    let args = cli::Cli::parse();

    let app = App::build(cfg).await?;

    let result = match args.command {
        Some(cli::Commands::Watch) | None => watch(&app).await,
        Some(cli::Commands::Status) => status(&app).await,
        Some(cli::Commands::Feed) => feed(&app).await,
        Some(cli::Commands::Read { notification_id }) => read(&app, notification_id).await,
        Some(cli::Commands::ReadAll) => read_all(&app).await,
        Some(cli::Commands::Seen { command }) => handle_seen_command(&app, command).await,
        Some(cli::Commands::Trigger { command }) => handle_trigger_command(&app, command).await,
    };

    app.alerts.dispose();
    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

fn print_alert(alert: &Alert) {
    let surface = if alert.is_modal { "modal" } else { "toast" };
    println!("[{}/{}] {}", alert.kind, surface, alert.title);
    for line in alert.message.lines() {
        println!("    {}", line);
    }
}

async fn watch(app: &App) -> anyhow::Result<()> {
    let _detector = app.detector.spawn();
    let _feed = app.feed.spawn(app.cfg.feed_interval);
    tracing::info!(
        poll_interval = ?app.cfg.poll_interval,
        feed_interval = ?app.cfg.feed_interval,
        "watching for updates, Ctrl-C to stop"
    );

    let mut alerts = app.alerts.subscribe();
    let mut shown = HashSet::new();
    let mut unread_ticker = tokio::time::interval(app.cfg.feed_interval);
    let mut last_unread = None;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            res = &mut shutdown => {
                res?;
                break;
            }
            changed = alerts.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = alerts.borrow_and_update().clone();
                for alert in &snapshot {
                    if shown.insert(alert.id) {
                        print_alert(alert);
                    }
                }
                shown.retain(|id| snapshot.iter().any(|a| a.id == *id));
            }
            _ = unread_ticker.tick() => {
                let unread = app.feed.unread_count().await;
                if last_unread != Some(unread) {
                    println!("unread notifications: {}", unread);
                    last_unread = Some(unread);
                }
            }
        }
    }

    tracing::info!("shutting down");
    Ok(())
}

async fn status(app: &App) -> anyhow::Result<()> {
    let outcome = app.detector.tick().await;
    println!("update check: {:?}", outcome);
    for alert in app.alerts.list_active() {
        print_alert(&alert);
    }
    Ok(())
}

async fn feed(app: &App) -> anyhow::Result<()> {
    let feed = &app.feed;
    futures::join!(feed.refresh_unread_count(), feed.open_dropdown());

    println!("unread: {}", feed.unread_count().await);
    for entry in feed.entries().await {
        match entry {
            FeedEntry::Release(note) => println!(
                "{} [release {} {:?}] {}: {}",
                if note.is_new { "*" } else { " " },
                note.version,
                note.release_type,
                note.title,
                note.summary
            ),
            FeedEntry::Separator => println!("  ----"),
            FeedEntry::Activity(item) => println!(
                "{} #{} {:?} by {} {}",
                if item.is_read { " " } else { "*" },
                item.id,
                item.kind,
                item.triggered_by.username,
                item.target_path().unwrap_or_default()
            ),
        }
    }
    Ok(())
}

async fn read(app: &App, notification_id: i64) -> anyhow::Result<()> {
    app.feed.open_dropdown().await;
    if app.feed.mark_one_read(notification_id).await? {
        println!("Notification {} marked as read.", notification_id);
    } else {
        println!("Notification {} is already read or unknown.", notification_id);
    }
    Ok(())
}

async fn read_all(app: &App) -> anyhow::Result<()> {
    app.feed.mark_all_read().await?;
    println!("All notifications marked as read.");
    Ok(())
}

async fn handle_seen_command(app: &App, cmd: cli::SeenCommands) -> anyhow::Result<()> {
    match cmd {
        cli::SeenCommands::List => {
            println!("registry: {}", app.seen.describe());
            for id in app.seen.seen_ids().await {
                println!("{}", id);
            }
        }
        cli::SeenCommands::Check { release_id } => {
            let seen = app.seen.has_seen(&ReleaseId(release_id.clone())).await;
            println!("{}: {}", release_id, if seen { "seen" } else { "not seen" });
        }
        cli::SeenCommands::Mark { release_id } => {
            if app.seen.mark_seen(&ReleaseId(release_id.clone())).await {
                println!("{}: recorded", release_id);
            } else {
                println!("{}: already recorded (or store unavailable)", release_id);
            }
        }
    }
    Ok(())
}

async fn handle_trigger_command(app: &App, cmd: cli::TriggerCommands) -> anyhow::Result<()> {
    match cmd {
        cli::TriggerCommands::Maintenance { message } => {
            app.detector.trigger_maintenance_warning(message.as_deref());
        }
        cli::TriggerCommands::Release { id, title, notes } => {
            if !app
                .detector
                .trigger_release_announcement(&ReleaseId(id.clone()), title.as_deref(), &notes)
                .await
            {
                println!("release {} was already announced", id);
            }
        }
    }
    for alert in app.alerts.list_active() {
        print_alert(&alert);
    }
    Ok(())
}
