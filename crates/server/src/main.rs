mod config;
mod tui;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use config::Settings;
use nmea_sim::{
    BroadcastServer, GeoPoint, Navigator, Route, RouteBuilder, RouteSpec, ServerEvent,
    ServerHandle, SimulatorConfig,
};
use tui::TuiState;

#[derive(Parser)]
#[command(name = "nmea-sim")]
#[command(about = "TCP server streaming simulated NMEA 0183 data for a vessel on a route")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the simulator
    Run(RunArgs),
    /// Build a route and print its waypoints
    #[command(subcommand)]
    Route(RouteCommand),
    /// Save or inspect a settings file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(clap::Args)]
struct RunArgs {
    #[arg(long, help = "Host to bind to")]
    host: Option<String>,

    #[arg(short, long, help = "Port to bind to")]
    port: Option<u16>,

    #[arg(short, long, help = "Speed in knots")]
    speed: Option<f64>,

    #[arg(long, help = "Seed for repeatable sensor noise")]
    seed: Option<u64>,

    #[arg(short, long, help = "Settings file to load")]
    config: Option<PathBuf>,

    #[arg(long)]
    headless: bool,
}

#[derive(Subcommand)]
enum RouteCommand {
    /// Straight line between two points
    Line {
        #[arg(long, default_value_t = -33.8587, allow_negative_numbers = true)]
        start_lat: f64,
        #[arg(long, default_value_t = 151.2140, allow_negative_numbers = true)]
        start_lon: f64,
        #[arg(long, default_value_t = -33.8400, allow_negative_numbers = true)]
        end_lat: f64,
        #[arg(long, default_value_t = 151.2200, allow_negative_numbers = true)]
        end_lon: f64,
        #[arg(long, default_value_t = 10)]
        points: usize,
    },
    /// Closed loop of points on a circle
    Circle {
        #[arg(long, default_value_t = -33.8587, allow_negative_numbers = true)]
        center_lat: f64,
        #[arg(long, default_value_t = 151.2140, allow_negative_numbers = true)]
        center_lon: f64,
        #[arg(long, default_value_t = 0.5, help = "Radius in nautical miles")]
        radius: f64,
        #[arg(long, default_value_t = 8)]
        points: usize,
    },
    /// Closed rectangle around a center point
    Rectangle {
        #[arg(long, default_value_t = -33.8587, allow_negative_numbers = true)]
        center_lat: f64,
        #[arg(long, default_value_t = 151.2140, allow_negative_numbers = true)]
        center_lon: f64,
        #[arg(long, default_value_t = 0.3, help = "Width in nautical miles")]
        width: f64,
        #[arg(long, default_value_t = 0.2, help = "Height in nautical miles")]
        height: f64,
    },
    /// Waypoints read from a JSON file
    Waypoints {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        closed: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write the default settings
    Save {
        #[arg(long, default_value = "config.json")]
        file: PathBuf,
    },
    /// Load, validate and print a settings file
    Load {
        #[arg(long)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run(args),
        Command::Route(route) => print_route(route),
        Command::Config(ConfigCommand::Save { file }) => {
            Settings::default().save(&file)?;
            println!("Configuration saved to {}", file.display());
            Ok(())
        }
        Command::Config(ConfigCommand::Load { file }) => {
            let settings = Settings::load(&file)?;
            let route = RouteBuilder::build(&settings.route_spec()?)
                .with_context(|| format!("invalid route in {}", file.display()))?;
            println!("Configuration loaded:");
            println!("{}", serde_json::to_string_pretty(&settings)?);
            println!(
                "Route: {} waypoints, {:.3} nm{}",
                route.len(),
                route.total_length_nm(),
                if route.is_closed() { " (closed)" } else { "" }
            );
            Ok(())
        }
    }
}

fn print_route(command: RouteCommand) -> Result<()> {
    let (label, spec) = match command {
        RouteCommand::Line {
            start_lat,
            start_lon,
            end_lat,
            end_lon,
            points,
        } => (
            "line",
            RouteSpec::Line {
                start: GeoPoint::new(start_lat, start_lon),
                end: GeoPoint::new(end_lat, end_lon),
                points,
            },
        ),
        RouteCommand::Circle {
            center_lat,
            center_lon,
            radius,
            points,
        } => (
            "circular",
            RouteSpec::Circle {
                center: GeoPoint::new(center_lat, center_lon),
                radius_nm: radius,
                points,
            },
        ),
        RouteCommand::Rectangle {
            center_lat,
            center_lon,
            width,
            height,
        } => (
            "rectangular",
            RouteSpec::Rectangle {
                center: GeoPoint::new(center_lat, center_lon),
                width_nm: width,
                height_nm: height,
            },
        ),
        RouteCommand::Waypoints { file, closed } => (
            "waypoint",
            RouteSpec::Waypoints {
                points: config::load_waypoints(&file)?,
                closed,
            },
        ),
    };

    let route = RouteBuilder::build(&spec)?;
    println!("Created {} route with {} waypoints", label, route.len());
    for (i, point) in route.points().iter().enumerate() {
        println!("  {}: {}", i + 1, point);
    }
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(speed) = args.speed {
        settings.speed_knots = speed;
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }

    let config = settings.into_simulator_config()?;
    let route = RouteBuilder::build(&config.route).context("invalid route")?;

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let runtime = Runtime::new().context("failed to start tokio runtime")?;

    if args.headless {
        runtime.block_on(run_headless(config, route))
    } else {
        run_with_tui(&runtime, config, route)
    }
}

async fn run_headless(config: SimulatorConfig, route: Route) -> Result<()> {
    log::info!(
        "{} route, {} waypoints, {:.3} nm at {:.1} kn",
        config.route.kind(),
        route.len(),
        route.total_length_nm(),
        config.speed_knots
    );

    let navigator = Navigator::new(route, &config);
    let server = BroadcastServer::bind(&config, navigator).await?;
    let handle = server.handle();
    let task = tokio::spawn(server.run());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    log::info!("Server shutting down");

    handle.shutdown();
    task.await.context("server task panicked")?;
    Ok(())
}

fn run_with_tui(runtime: &Runtime, config: SimulatorConfig, route: Route) -> Result<()> {
    let (tx, events) = mpsc::unbounded_channel();
    let navigator = Navigator::new(route, &config);
    let server = runtime
        .block_on(BroadcastServer::bind(&config, navigator))?
        .with_event_sink(tx);
    let handle = server.handle();
    let task = runtime.spawn(server.run());

    let result = tui_loop(&handle, events, config.max_clients);

    handle.shutdown();
    runtime
        .block_on(task)
        .context("server task panicked")?;
    result.context("terminal error")
}

fn tui_loop(
    handle: &ServerHandle,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
    max_clients: usize,
) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut tui_state = TuiState::new(max_clients);

    let result = loop {
        while let Ok(event) = events.try_recv() {
            tui_state.apply(event);
        }

        if let Err(e) = terminal.draw(|frame| tui::render(frame, &tui_state)) {
            break Err(e);
        }

        match event::poll(Duration::from_millis(50)) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => break Err(e),
        }

        let key = match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
            Ok(_) => continue,
            Err(e) => break Err(e),
        };

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break Ok(()),
            KeyCode::Up => tui_state.select_prev(),
            KeyCode::Down => tui_state.select_next(),
            KeyCode::Char('k') | KeyCode::Char('K') => {
                if let Some(client_id) = tui_state.selected_client() {
                    tui_state.log_info(format!("Kicking client {}", client_id));
                    handle.kick(client_id);
                }
            }
            _ => {}
        }
    };

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    result
}
