use basket_tui::{
    api::GeocodeProvider,
    app::App,
    catalog,
    config::Config,
    dispatch::dispatch,
    events::{Event, EventHandler},
    location::{CoordinateSource, LocationResolver},
    logging, ui,
};
use color_eyre::Result;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc, time::Duration};
use tracing::info;

type Resolver = LocationResolver<CoordinateSource, GeocodeProvider>;

#[tokio::main]
async fn main() -> Result<()> {
    // Instrumentation and safety
    let _log_guard = logging::initialize_logging();
    color_eyre::install()?;
    // After color_eyre so its hook runs once the terminal is restored.
    install_panic_hook();

    let config = Config::load();
    let products = catalog::load(&config.catalog);
    info!("Catalog has {} products", products.len());

    let resolver: Arc<Resolver> = Arc::new(LocationResolver::from_config(
        &config.location,
        GeocodeProvider::new(&config.geocode)?,
    ));
    let compare_delay = Duration::from_millis(config.compare.delay_ms);

    // Ready terminal and state
    let mut terminal = setup_terminal()?;
    let mut event_handler = EventHandler::new(config.ui.tick_rate_ms);
    let mut app = App::new(config, products);

    // Main loop
    while !app.should_quit {
        terminal.draw(|f| ui::render(f, &app))?;

        let Some(event) = event_handler.next().await else {
            break;
        };
        match event {
            Event::Tick => app.on_tick(),
            Event::Input(key) => {
                if let Some(action) = app.handle_key(key) {
                    dispatch(action, &resolver, compare_delay, &event_handler.tx);
                }
            }
            Event::LocationResolved { request_id, result } => {
                app.on_location_resolved(request_id, result)
            }
            Event::ComparisonReady { request_id, result } => {
                app.on_comparison_ready(request_id, result)
            }
        }
    }

    restore_terminal(terminal)?;
    info!("Exiting.");
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::cursor::Hide
    )?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Force terminal cleanup!
        crossterm::terminal::disable_raw_mode().ok();
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show
        )
        .ok();
        original_hook(panic_info);
    }));
}
