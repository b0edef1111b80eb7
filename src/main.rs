//! Lingo-Lah - Malaysian lingo explained in the terminal
//!
//! A terminal UI application that lists local slang terms by category and
//! fetches an explanation for the selected term from Gemini.

use std::io;
use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use lingolah::app::App;
use lingolah::cli::{Cli, StartupConfig};
use lingolah::fetch::{FetchConfig, FetchCoordinator};
use lingolah::provider::GeminiClient;
use lingolah::{config, logging, ui};

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments
    let cli = Cli::parse();

    let startup = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    match logging::init(startup.log_file.clone()) {
        Ok(path) => tracing::info!(path = %path.display(), "Logging initialised"),
        Err(e) => eprintln!("Warning: logging disabled: {}", e),
    }

    for duplicate in startup.glossary.duplicate_terms() {
        tracing::warn!(
            term = %duplicate.term,
            categories = ?duplicate.categories,
            "Term listed in more than one category"
        );
    }

    let api_key = config::load_api_key();
    if api_key.is_none() {
        tracing::warn!("{} is not set; explanations will fail", config::API_KEY_ENV);
    }

    let provider = GeminiClient::new(api_key)
        .with_model(startup.model.clone())
        .with_streaming(startup.streaming);
    let fetcher = FetchCoordinator::new(
        Arc::new(provider),
        FetchConfig {
            region: startup.region.clone(),
            timeout: startup.timeout,
        },
    );

    tracing::info!(
        model = %startup.model,
        region = %startup.region,
        streaming = startup.streaming,
        policy = ?startup.policy,
        categories = startup.glossary.len(),
        terms = startup.glossary.term_count(),
        "Starting lingolah"
    );

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app instance
    let mut app = App::new(startup.glossary, startup.policy, fetcher);

    // Main event loop
    loop {
        // Render UI
        terminal.draw(|f| ui::render(f, &mut app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        // Apply whatever the background fetches produced since the last frame
        app.poll_fetches();

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    tracing::info!("Exiting lingolah");
    Ok(())
}
