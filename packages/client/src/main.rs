use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use client::config::ClientConfig;
use client::dashboard::Dashboard;
use client::{ConnectionManager, Endpoints, LiveHandler, LiveSession, SessionEnd, ToastTray};
use common::{LiveChannel, Toast, ToastLevel, strip_control};
use console::style;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dojo-live", version, about = "Follow Dojo live notifications and first bloods")]
struct Cli {
    /// Site address, e.g. https://ctf.example.org (overrides config)
    #[arg(long)]
    base_url: Option<String>,

    /// Access token for the notifications channel
    #[arg(long, env = "DOJO_LIVE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Which live channels to follow
    #[arg(long, value_enum, default_value_t = ChannelArg::Both)]
    channel: ChannelArg,

    /// Also receive first bloods scoped to this event
    #[arg(long)]
    event_id: Option<i64>,

    /// Do not refresh dashboard panels after events
    #[arg(long)]
    no_dashboard: bool,

    /// Print toasts as HTML markup instead of coloured text
    #[arg(long)]
    html: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ChannelArg {
    Notifications,
    FirstBlood,
    Both,
}

impl ChannelArg {
    fn channels(self) -> &'static [LiveChannel] {
        match self {
            ChannelArg::Notifications => &[LiveChannel::Notifications],
            ChannelArg::FirstBlood => &[LiveChannel::FirstBlood],
            ChannelArg::Both => &LiveChannel::ALL,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::load().context("Failed to load config")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if cli.token.is_some() {
        config.token = cli.token;
    }
    if cli.event_id.is_some() {
        config.event_id = cli.event_id;
    }
    if cli.no_dashboard {
        config.dashboard = false;
    }

    let endpoints = Endpoints::parse(&config.base_url).context("Invalid base URL")?;

    let mut session = LiveSession::new(ToastTray::new(config.max_toasts)).on_toast(if cli.html {
        print_html
    } else {
        print_plain
    });
    if config.dashboard {
        let dashboard = Dashboard::new(
            endpoints.clone(),
            config.token.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
        .context("Failed to build dashboard HTTP client")?;
        session = session.with_dashboard(Arc::new(dashboard));
    }
    let handler: Arc<dyn LiveHandler> = Arc::new(session);

    let shutdown = CancellationToken::new();
    let mut managers = Vec::new();
    for &channel in cli.channel.channels() {
        if channel == LiveChannel::Notifications && config.token.is_none() {
            warn!("No token configured; skipping the notifications channel");
            continue;
        }
        let mut manager = ConnectionManager::new(
            channel,
            endpoints.websocket(channel, config.token.as_deref()),
            config.reconnect.clone(),
            Arc::clone(&handler),
        )
        .with_connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .with_keepalive(Duration::from_secs(config.keepalive_secs))
        .with_shutdown(shutdown.clone());
        if let (LiveChannel::FirstBlood, Some(event_id)) = (channel, config.event_id) {
            manager = manager.with_event_subscription(event_id);
        }
        managers.push(manager);
    }
    if managers.is_empty() {
        bail!("Nothing to follow: the notifications channel needs --token");
    }

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    println!(
        "{} {}",
        style("Following").green().bold(),
        style(endpoints.base()).cyan()
    );

    let channels: Vec<LiveChannel> = managers.iter().map(ConnectionManager::channel).collect();
    let ends = join_all(managers.into_iter().map(ConnectionManager::run)).await;

    for (channel, end) in channels.into_iter().zip(ends) {
        match end {
            SessionEnd::Cancelled => info!(%channel, "Stopped"),
            SessionEnd::GaveUp { attempts } => println!(
                "{} {} after {} reconnect attempts",
                style("Gave up on").red().bold(),
                channel,
                attempts
            ),
        }
    }
    Ok(())
}

fn print_plain(toast: &Toast) {
    let level = match toast.level {
        ToastLevel::Success => style(toast.level.as_str()).green(),
        ToastLevel::Info => style(toast.level.as_str()).cyan(),
        ToastLevel::Warning => style(toast.level.as_str()).yellow(),
        ToastLevel::Error => style(toast.level.as_str()).red(),
    };
    println!(
        "{} {} {}",
        style(format!("[{level}]")).bold(),
        style(strip_control(&toast.title)).bold(),
        strip_control(&toast.body)
    );
}

fn print_html(toast: &Toast) {
    println!("{}", toast.to_html());
}
