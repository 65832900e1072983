mod app;
mod event;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{poll, read, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tazvm::azure::auth::AzureCredentials;
use tazvm::azure::AzureClient;
use tazvm::config::Config;
use tazvm::resource::{Fleet, Scope};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use ui::splash::{render as render_splash, SplashState};

/// Terminal UI for Azure virtual machines
#[derive(Parser, Debug)]
#[command(name = "tazvm", version, about, long_about = None)]
struct Args {
    /// Subscription id or display name ("all" for every subscription)
    #[arg(short, long)]
    subscription: Option<String>,

    /// Seconds between automatic status polls
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Timeout in seconds for a single Azure call
    #[arg(long)]
    timeout: Option<u64>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Run in read-only mode (block start/stop/restart)
    #[arg(long)]
    readonly: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("tazvm {} started with log level: {:?}", tazvm::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(dir) = Config::config_dir() {
        return dir.join("tazvm.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".tazvm").join("tazvm.log");
    }
    PathBuf::from("tazvm.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = initialize_with_splash(&mut terminal, &args).await;

    match result {
        Ok(Some(mut app)) => {
            let run_result = run_app(&mut terminal, &mut app).await;
            app.fleet.stop_auto_poll().await;
            cleanup_terminal(&mut terminal)?;

            if let Err(err) = run_result {
                eprintln!("Error: {err:?}");
            }
        }
        Ok(None) => {
            cleanup_terminal(&mut terminal)?;
        }
        Err(err) => {
            cleanup_terminal(&mut terminal)?;
            eprintln!("Initialization error: {err:?}");
        }
    }

    Ok(())
}

fn cleanup_terminal<B: Backend + std::io::Write>(terminal: &mut Terminal<B>) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

async fn initialize_with_splash<B: Backend>(
    terminal: &mut Terminal<B>,
    args: &Args,
) -> Result<Option<App>>
where
    B::Error: Send + Sync + 'static,
{
    let mut splash = SplashState::new();
    terminal.draw(|f| render_splash(f, &splash))?;

    if check_abort()? {
        return Ok(None);
    }

    // Step 1: Load configuration
    let config = Config::load();
    let mut scope = config.effective_scope(args.subscription.as_deref());
    let poll_interval = config.effective_poll_interval(args.poll_interval);
    let fleet_config = config.fleet_config(args.timeout);

    tracing::info!("Using scope: {}, fleet config: {:?}", scope.label(), fleet_config);

    splash.set_message(&format!("Loading config [scope: {}]", scope.label()));
    terminal.draw(|f| render_splash(f, &splash))?;
    splash.complete_step();

    if check_abort()? {
        return Ok(None);
    }

    // Step 2: Credentials
    splash.set_message("Acquiring Azure CLI credentials");
    terminal.draw(|f| render_splash(f, &splash))?;

    let client = AzureClient::new(AzureCredentials::from_environment())?;
    if let Err(e) = client.get_token().await {
        splash.set_message("Error: not signed in to Azure");
        terminal.draw(|f| render_splash(f, &splash))?;
        tokio::time::sleep(Duration::from_secs(2)).await;
        return Err(e.context("Run `az login` or set AZURE_ACCESS_TOKEN"));
    }
    let fleet = Arc::new(Fleet::new(Arc::new(client), fleet_config));
    splash.complete_step();

    if check_abort()? {
        return Ok(None);
    }

    // Step 3: Subscriptions
    splash.set_message("Fetching subscriptions");
    terminal.draw(|f| render_splash(f, &splash))?;

    let (subscriptions, subscription_error) = match fleet.list_subscriptions().await {
        Ok(subs) => {
            tracing::info!("Loaded {} subscriptions", subs.len());
            (subs, None)
        }
        Err(e) => {
            tracing::warn!("Failed to list subscriptions: {}", e);
            (Vec::new(), Some(app::describe_error(&e)))
        }
    };

    let unknown_scope = matches!(
        &scope,
        Scope::Subscription(key)
            if !subscriptions.is_empty() && !subscriptions.iter().any(|s| s.matches(key))
    );
    if unknown_scope {
        tracing::warn!("Subscription {} not found, showing all", scope.label());
        scope = Scope::All;
    }
    splash.complete_step();

    if check_abort()? {
        return Ok(None);
    }

    // Step 4: VMs
    splash.set_message(&format!("Fetching virtual machines [{}]", scope.label()));
    terminal.draw(|f| render_splash(f, &splash))?;

    let mut app = App::from_initialized(
        fleet,
        scope,
        subscriptions,
        config,
        poll_interval,
        args.readonly,
    );
    app.refresh().await;
    if subscription_error.is_some() {
        app.error_message = subscription_error;
    }

    if app.error_message.is_none() {
        app.toggle_auto_poll().await;
    }
    splash.complete_step();

    splash.complete_step();
    splash.set_message("Ready!");
    terminal.draw(|f| render_splash(f, &splash))?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    Ok(Some(app))
}

fn check_abort() -> Result<bool> {
    if poll(Duration::from_millis(50))? {
        if let Event::Key(key) = read()? {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if event::handle_events(app).await? {
            return Ok(());
        }

        app.process_background().await;
    }
}
