use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::execute;
use geojson::GeoJson;
use ratatui::DefaultTerminal;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zeitung_atlas::aggregate::{aggregate_range, MissingYears, RangePolicy, YearRange};
use zeitung_atlas::app::{App, AtlasOptions};
use zeitung_atlas::config::AtlasConfig;
use zeitung_atlas::data::{self, places::load_place_index};
use zeitung_atlas::markers::{build_markers, to_feature_collection};
use zeitung_atlas::places::YearlyPlaceIndex;
use zeitung_atlas::ui;

#[derive(Parser, Debug)]
#[command(name = "zeitung-atlas", version, about = "Map of places in Rigasche Zeitung headings")]
struct Cli {
    /// TOML config file (defaults to ./zeitung-atlas.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Yearly place index JSON
    #[arg(long)]
    places: Option<PathBuf>,

    /// Directory with Natural Earth GeoJSON basemap files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// How the selected end year is treated
    #[arg(long, value_enum)]
    policy: Option<RangePolicy>,

    /// Fail when a selected year has no data
    #[arg(long)]
    strict: bool,

    /// Write logs here while the map view is open
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal map (default)
    View {
        #[arg(long)]
        from: Option<i32>,
        #[arg(long)]
        to: Option<i32>,
    },
    /// Print the markers for one selection and exit
    Markers {
        #[arg(long)]
        from: i32,
        #[arg(long)]
        to: i32,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Geojson,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let command = cli.command.unwrap_or(Command::View { from: None, to: None });

    init_tracing(&command, config.log_file.as_deref())?;

    let index = load_place_index(&config.input.places)
        .with_context(|| format!("Failed to load place index from {}", config.input.places.display()))?;
    let index = Arc::new(index);

    match command {
        Command::View { from, to } => run_view(&config, index, from, to),
        Command::Markers { from, to, format } => print_markers(&config, &index, from, to, format),
    }
}

/// Config file values with command-line overrides applied
fn resolve_config(cli: &Cli) -> Result<AtlasConfig> {
    let mut config = AtlasConfig::load(cli.config.as_deref())?;
    if let Some(places) = &cli.places {
        config.input.places = places.clone();
    }
    if let Some(data_dir) = &cli.data_dir {
        config.input.data_dir = data_dir.clone();
    }
    if let Some(policy) = cli.policy {
        config.range.policy = policy;
    }
    if cli.strict {
        config.range.strict = true;
    }
    if let Some(log_file) = &cli.log_file {
        config.log_file = Some(log_file.clone());
    }
    Ok(config)
}

/// The map owns the terminal, so it only logs when given a file.
/// Every other command logs to stderr.
fn init_tracing(command: &Command, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    match (command, log_file) {
        (Command::View { .. }, None) => {}
        (Command::View { .. }, Some(path)) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
        }
        (Command::Markers { .. }, _) => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
    Ok(())
}

fn print_markers(
    config: &AtlasConfig,
    index: &YearlyPlaceIndex,
    from: i32,
    to: i32,
    format: OutputFormat,
) -> Result<()> {
    let range = YearRange::from_selection(from, to, config.range.policy)?;
    let result = aggregate_range(index, range, MissingYears::from_strict(config.range.strict))?;
    let markers = build_markers(&result, &config.markers.scaler())?;
    info!(
        start = range.start(),
        end = range.end(),
        places = markers.len(),
        max_count = result.max_count(),
        "aggregated selection"
    );

    match format {
        OutputFormat::Text => {
            for marker in &markers {
                println!(
                    "{}\t{:.4}\t{:.4}\t{:.0} m",
                    marker.label, marker.lon, marker.lat, marker.radius_m
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&markers)?),
        OutputFormat::Geojson => println!("{}", GeoJson::from(to_feature_collection(&markers))),
    }
    Ok(())
}

fn run_view(config: &AtlasConfig, index: Arc<YearlyPlaceIndex>, from: Option<i32>, to: Option<i32>) -> Result<()> {
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, config, index, from, to);

    // Restore before the caller reports any error
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for panning, zooming and hover
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Trackpad two-finger swipe
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

fn run(
    terminal: &mut DefaultTerminal,
    config: &AtlasConfig,
    index: Arc<YearlyPlaceIndex>,
    from: Option<i32>,
    to: Option<i32>,
) -> Result<()> {
    let size = terminal.size()?;
    let options = AtlasOptions::from_config(config);
    let (min_year, max_year) = (options.min_year, options.max_year);
    let mut app = App::new(size.width as usize, size.height as usize, index, options, config.view.clone());
    app.map_renderer.settings.show_labels = config.markers.show_labels;

    if from.is_some() || to.is_some() {
        app.select(from.unwrap_or(min_year), to.unwrap_or(max_year));
    }

    data::load_basemap(&mut app.map_renderer, &config.input.data_dir);
    if !app.map_renderer.has_data() {
        info!("no basemap data found, using built-in outline");
        data::generate_fallback_outline(&mut app.map_renderer);
    }

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // ~60fps
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                    KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                    KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                    KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                    KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                    KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                    // Year range
                    KeyCode::Tab | KeyCode::BackTab => app.toggle_handle(),
                    KeyCode::Char(',') | KeyCode::Char('<') => {
                        app.nudge(-1);
                    }
                    KeyCode::Char('.') | KeyCode::Char('>') => {
                        app.nudge(1);
                    }
                    KeyCode::PageDown => {
                        app.nudge(-10);
                    }
                    KeyCode::PageUp => {
                        app.nudge(10);
                    }
                    KeyCode::Char('a') | KeyCode::Char('A') => app.reset_range(),

                    // Layer toggles
                    KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_borders(),
                    KeyCode::Char('m') | KeyCode::Char('M') => app.map_renderer.toggle_markers(),
                    KeyCode::Char('L') => app.map_renderer.toggle_labels(),

                    KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
