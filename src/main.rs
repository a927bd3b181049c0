use std::io;
use std::time::Duration;

use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

mod app;
mod config;
mod error;
mod models;
mod store;
mod tui;
mod worker;

use app::App;
use config::Config;
use error::Result;
use models::ArticleFilter;
use store::{ArticleRepository, StoreClient};
use tui::{draw, handle_key_event};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Load configuration
    let config = Config::load()?;

    // Headless connection check
    if args.iter().any(|a| a == "--check") {
        match StoreClient::connect(&config).await {
            Ok(_) => println!("Connected"),
            Err(e) => {
                eprintln!("Connection failed: {e}");
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Headless article listing
    if args.iter().any(|a| a == "--list") {
        let store = StoreClient::connect(&config).await?;
        let repo = ArticleRepository::new(store);
        for heading in repo.list_headings(&ArticleFilter::default()).await {
            println!(
                "{:>6}  {}",
                heading.id,
                heading.title.as_deref().unwrap_or("Untitled")
            );
        }
        return Ok(());
    }

    // One-shot JSON message against the background worker, mostly for
    // poking at the store from scripts
    if let Some(pos) = args.iter().position(|a| a == "--request") {
        let Some(raw) = args.get(pos + 1) else {
            eprintln!("--request needs a JSON message");
            std::process::exit(2);
        };
        let Some(request) = worker::decode_request(raw) else {
            eprintln!("unrecognized request");
            std::process::exit(2);
        };
        let handle = worker::spawn(StoreClient::new(&config)?, &config);
        if let Some(response) = handle.request(request).await {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        return Ok(());
    }

    // Start the background worker, then hand the terminal to the popup
    let handle = worker::spawn(StoreClient::new(&config)?, &config);
    let mut app = App::new(handle);
    app.init().await;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        // Expire the transient status banner
        app.tick();

        // Drain pushed worker events (connection status, stats)
        app.poll_events();

        // Poll for events with timeout to allow async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let edit_active = app.view == app::View::Edit;
                    if let Some(action) = handle_key_event(key, edit_active, app.show_help) {
                        let should_quit = app.handle_action(action).await?;
                        if should_quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
