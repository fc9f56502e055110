//! GreenTrace - Disaster Relief Volunteer Coordination
//!
//! Terminal front end for relief volunteers. Reads configuration from the
//! environment, logs to a file so the alternate screen stays clean, and runs
//! the draw/input loop until the user quits.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use greentrace::application::App;
use greentrace::config::AppConfig;
use greentrace::infrastructure::{
    FixedLocationProvider, IpLocationProvider, LocationProvider, XaiAdviceClient,
};
use greentrace::presentation::{render_ui, InputHandler};

/// Entry point for the GreenTrace terminal application.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened, the HTTP client
/// cannot be built, or terminal setup fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "greentrace=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    info!(
        "Loaded configuration: model={}, location_url={}, timeout={:?}",
        config.advice.model, config.location_url, config.request_timeout
    );

    let advice = XaiAdviceClient::new(
        config.advice.api_key.clone(),
        config.advice.base_url.clone(),
        config.advice.model.clone(),
        config.request_timeout,
    )?;
    if !advice.has_credential() {
        warn!("XAI_API_KEY is not set, AI advice will be unavailable");
    }

    let location: Box<dyn LocationProvider> =
        match IpLocationProvider::new(config.location_url.clone(), config.request_timeout) {
            Ok(provider) => Box::new(provider),
            Err(e) => {
                warn!("Location lookup disabled: {}", e);
                Box::new(FixedLocationProvider::default())
            }
        };

    let mut app = App::new(Box::new(advice), location).with_export_file(config.export_file.clone());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }
    info!("GreenTrace exited");

    Ok(())
}

/// Main application event loop.
///
/// Blocking work queued by a key press (advice requests, location lookups)
/// runs only after the frame showing its pending state has been drawn.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_ui(f, app))?;

        if app.has_pending_work() {
            app.run_pending();
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                InputHandler::handle_key_event(app, key.code, key.modifiers);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
