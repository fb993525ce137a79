//! DealSpot - Terminal Deal Storefront
//!
//! A terminal storefront for browsing discounted local deals. Shoppers filter
//! the catalog by category and free-text search, sign in or create accounts,
//! and administrators manage deals from a dashboard.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{error, info};

use dealspot::application::{App, SessionContext};
use dealspot::domain::Catalog;
use dealspot::infrastructure::{
    init_logging, sample_deals, AppConfig, Cli, DealSource, LogNotifier, StubIdentityProvider,
};
use dealspot::presentation::{render_ui, InputHandler};

const TICK_RATE: Duration = Duration::from_millis(100);

/// Entry point for the DealSpot terminal storefront.
///
/// Reads configuration, starts file logging, loads the catalog, and runs the
/// main event loop until the user quits.
///
/// # Errors
///
/// Returns an error if the deal file cannot be loaded, logging cannot be
/// initialized, or terminal setup fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from(Cli::parse());
    let _log_guard = init_logging(&config)?;

    let deals = match &config.deals_path {
        Some(path) => DealSource::load(path)?,
        None => sample_deals(),
    };
    info!(count = deals.len(), "starting storefront");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;
    let session = SessionContext::new(
        Arc::new(StubIdentityProvider::with_demo_accounts()),
        Arc::new(LogNotifier::default()),
    );
    let mut app = App::new(Catalog::new(deals), session, runtime.handle().clone());

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
        error!(%err, "terminal loop failed");
        println!("{err:?}");
    }

    info!("storefront closed");
    Ok(())
}

/// Main application event loop.
///
/// Applies finished session transitions every tick, redraws, and forwards key
/// presses. Continues running until the user presses 'q' while browsing.
///
/// # Errors
///
/// Returns an IO error if terminal operations fail.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        app.tick();
        terminal.draw(|f| render_ui(f, app))?;

        if !event::poll(TICK_RATE)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                if InputHandler::quits(app, key.code) {
                    return Ok(());
                }
                InputHandler::handle_key_event(app, key.code, key.modifiers);
            }
        }
    }
}
