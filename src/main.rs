use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use cloudtune::audio::{AudioSink, MpvSink, SilentSink};
use cloudtune::config::{Backend, Config};
use cloudtune::controller::{AppController, AppEvent, Collaborators, EngineSettings};
use cloudtune::logging;
use cloudtune::model::{FileStore, HttpCatalogueClient};
use cloudtune::notify;
use cloudtune::view::AppView;

#[derive(Parser)]
#[command(name = "cloudtune", version, about = "Terminal client for a NetEase-compatible music catalogue")]
struct Cli {
    /// Configuration file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the configuration file path and exit
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Config::default_path);

    if let Some(Command::Config) = cli.command {
        println!("{}", config_path.display());
        return Ok(());
    }

    let config = Config::load(&config_path)?;

    if let Err(e) = logging::init_logging(&config.log_dir()) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!(config = %config_path.display(), "=== cloudtune starting ===");

    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let (audio_tx, mut audio_rx) = mpsc::unbounded_channel();
    let sink: Box<dyn AudioSink> = match config.player.backend {
        Backend::Mpv => Box::new(MpvSink::new(
            config.player.mpv_path.clone(),
            config.player.default_volume,
            audio_tx,
        )),
        Backend::Silent => Box::new(SilentSink::new(audio_tx)),
    };
    let forward_tx = events_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = audio_rx.recv().await {
            if forward_tx.send(AppEvent::Audio(event)).is_err() {
                break;
            }
        }
    });

    let client = HttpCatalogueClient::new(config.remote.base_url.clone(), config.request_timeout())?;
    let parts = Collaborators {
        client: Arc::new(client),
        store: Arc::new(FileStore::new(config.store_dir())),
        sink,
        notifier: notify::build(config.startup.notify),
    };

    let mut controller = AppController::new(parts, EngineSettings::from(&config), events_tx.clone());
    controller.startup();

    spawn_input_reader(events_tx.clone());
    spawn_ticker(events_tx.clone(), config.tick());

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut controller, events_rx).await;

    controller.shutdown().await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("cloudtune shutting down");
    Ok(())
}

/// Terminal input is read on its own thread and posted into the event queue
fn spawn_input_reader(tx: mpsc::UnboundedSender<AppEvent>) {
    std::thread::spawn(move || {
        while !tx.is_closed() {
            match event::poll(Duration::from_millis(100)) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "Terminal poll failed");
                    break;
                }
            }
            let event = match event::read() {
                Ok(Event::Key(key)) => AppEvent::Key(key),
                Ok(Event::Resize(..)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "Terminal read failed");
                    break;
                }
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    });
}

fn spawn_ticker(tx: mpsc::UnboundedSender<AppEvent>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut AppController,
    mut events: mpsc::UnboundedReceiver<AppEvent>,
) -> io::Result<()> {
    loop {
        let view = controller.current_view();
        terminal.draw(|f| AppView::render(f, &view))?;

        let Some(event) = events.recv().await else {
            break;
        };
        controller.handle_event(event);
        // Apply whatever else is queued before drawing again
        while let Ok(event) = events.try_recv() {
            controller.handle_event(event);
        }

        if controller.should_quit() {
            break;
        }
    }

    Ok(())
}
