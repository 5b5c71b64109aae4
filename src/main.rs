use std::env;
use std::fs::{create_dir_all, OpenOptions};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use std::{io, sync::Arc};

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::{mpsc, RwLock};

mod client;
mod config;
mod errors;
mod fetch;
mod market;
mod model;
mod nav;
mod theme;
mod ui;

use client::MarketClient;
use errors::{AppError, AppErrorKind};
use fetch::FetchCoordinator;
use market::SortKey;
use model::{AppEvent, AppSettings, AppState, Focus, SettingsField};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};

/// Follow-up work a key press asks the loop to start outside the state lock.
enum Command {
    FetchMateria { world: String },
    FetchTimings,
    OpenMarket { item_id: u64 },
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_cli()?;
    init_tracing(&cli)?;

    if cli.init_config {
        let path = config::config_path();
        config::save(&config::AppConfig::default(), &path)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let (app_cfg, config_error) = match config::load() {
        Ok(c) => (c, None),
        Err(err) => {
            warn!(error = ?err, "Failed to load config; using defaults");
            let error = AppError::new(AppErrorKind::Config, format!("{err:#}"));
            (config::AppConfig::default(), Some(error))
        }
    };
    let mut settings = AppSettings::from(app_cfg.clone());
    if let Some(world) = cli.world.clone() {
        settings.world = world;
    }

    let state = Arc::new(RwLock::new(AppState::new(&settings)));
    state.write().await.last_error = config_error;

    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
    let market_client = MarketClient::new(app_cfg.api_base_url.clone(), app_cfg.request_timeout())
        .context("Failed to build HTTP client")?;
    let mut fetcher = FetchCoordinator::new(Arc::new(market_client), tx);
    info!(api = %app_cfg.api_base_url, world = %settings.world, "Starting materia board");

    {
        let ticket = state.write().await.begin_fetch(&settings.world);
        fetcher.fetch_materia(ticket);
    }

    // TUI init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick = Duration::from_millis(100);
    let mut last_draw: Option<Instant> = None;
    let mut running = true;

    while running {
        // Apply completed fetches before drawing so a frame never shows half a snapshot
        while let Ok(evt) = rx.try_recv() {
            let mut s = state.write().await;
            s.apply(evt);
        }

        if last_draw.map_or(true, |at| at.elapsed() >= tick) {
            let snapshot = state.read().await.clone_snapshot();
            terminal.draw(|f| ui::draw(f, &snapshot))?;
            last_draw = Some(Instant::now());
        }

        if event::poll(Duration::from_millis(10))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let command = {
                    let mut s = state.write().await;
                    handle_key(&mut s, key)
                };
                match command {
                    Some(Command::Quit) => running = false,
                    Some(Command::FetchMateria { world }) => {
                        let ticket = state.write().await.begin_fetch(&world);
                        fetcher.fetch_materia(ticket);
                    }
                    Some(Command::FetchTimings) => fetcher.fetch_timings(),
                    Some(Command::OpenMarket { item_id }) => {
                        if let Err(err) = nav::open_market_page(item_id) {
                            warn!(item_id, error = ?err, "Failed to open market page");
                            state.write().await.last_error =
                                Some(AppError::new(AppErrorKind::Navigation, format!("{err:#}")));
                        }
                    }
                    None => {}
                }
                last_draw = None;
            }
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn handle_key(s: &mut AppState, key: KeyEvent) -> Option<Command> {
    if let Some(input) = s.world_input.as_mut() {
        match key.code {
            KeyCode::Esc => s.world_input = None,
            KeyCode::Enter => {
                return s
                    .submit_world_input()
                    .map(|world| Command::FetchMateria { world });
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) => input.push(c),
            _ => {}
        }
        return None;
    }

    if s.show_settings {
        match key.code {
            KeyCode::Char('s') | KeyCode::Esc | KeyCode::Char('q') => s.show_settings = false,
            KeyCode::Up => s.prev_setting(),
            KeyCode::Down => s.next_setting(),
            KeyCode::Left => s.adjust_selected_setting(false),
            KeyCode::Right => s.adjust_selected_setting(true),
            _ => {}
        }
        return None;
    }

    if s.timing.visible {
        if matches!(
            key.code,
            KeyCode::Char('t') | KeyCode::Esc | KeyCode::Char('q')
        ) {
            s.timing.close();
        }
        return None;
    }

    if s.show_listings {
        match key.code {
            KeyCode::Char('l') | KeyCode::Esc | KeyCode::Char('q') => s.show_listings = false,
            KeyCode::Up => s.move_row(-1),
            KeyCode::Down => s.move_row(1),
            _ => {}
        }
        return None;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Some(Command::Quit),
        KeyCode::Char('r') => {
            return Some(Command::FetchMateria {
                world: s.world.clone(),
            })
        }
        KeyCode::Char('w') => s.begin_world_input(),
        KeyCode::Char('s') => {
            s.show_settings = true;
            s.settings_cursor = SettingsField::default();
        }
        KeyCode::Char('t') => {
            if s.timing.open() {
                return Some(Command::FetchTimings);
            }
        }
        KeyCode::Tab => s.toggle_focus(),
        KeyCode::Char(c @ '1'..='8') => {
            let idx = c as usize - '1' as usize;
            if let Some(key) = SortKey::ALL.get(idx) {
                s.set_sort(*key);
            }
        }
        _ => match s.focus {
            Focus::Stats => match key.code {
                KeyCode::Left => s.move_stat_cursor(-1),
                KeyCode::Right => s.move_stat_cursor(1),
                KeyCode::Char(' ') | KeyCode::Enter => s.toggle_stat_at_cursor(),
                _ => {}
            },
            Focus::Tables => match key.code {
                KeyCode::Up => s.move_row(-1),
                KeyCode::Down => s.move_row(1),
                KeyCode::PageUp => s.move_row(-10),
                KeyCode::PageDown => s.move_row(10),
                KeyCode::Left => s.cycle_column(-1),
                KeyCode::Right => s.cycle_column(1),
                KeyCode::Char('l') => s.show_listings = true,
                KeyCode::Enter => {
                    if let Some(row) = s.selected_row() {
                        return Some(Command::OpenMarket {
                            item_id: row.entry.id,
                        });
                    }
                }
                _ => {}
            },
        },
    }
    None
}

#[derive(Debug, Default)]
struct CliArgs {
    debug: Option<DebugTarget>,
    world: Option<String>,
    init_config: bool,
}

#[derive(Debug)]
enum DebugTarget {
    Default,
    Path(PathBuf),
}

fn parse_cli() -> Result<CliArgs> {
    parse_args(env::args().skip(1))
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<CliArgs> {
    let mut args = args.peekable();
    let mut cli = CliArgs::default();

    while let Some(arg) = args.next() {
        if arg == "--debug" {
            if cli.debug.is_some() {
                bail!("`--debug` specified more than once");
            }
            match args.next_if(|next| !next.starts_with('-')) {
                Some(path) => cli.debug = Some(DebugTarget::Path(PathBuf::from(path))),
                None => cli.debug = Some(DebugTarget::Default),
            }
        } else if let Some(rest) = arg.strip_prefix("--debug=") {
            if cli.debug.is_some() {
                bail!("`--debug` specified more than once");
            }
            if rest.is_empty() {
                cli.debug = Some(DebugTarget::Default);
            } else {
                cli.debug = Some(DebugTarget::Path(PathBuf::from(rest)));
            }
        } else if arg == "--world" {
            let Some(world) = args.next() else {
                bail!("`--world` requires a world name");
            };
            cli.world = Some(world);
        } else if let Some(rest) = arg.strip_prefix("--world=") {
            cli.world = Some(rest.to_string());
        } else if arg == "--init-config" {
            cli.init_config = true;
        } else {
            bail!("unknown argument: {arg}");
        }
    }

    if let Some(world) = &cli.world {
        if world.trim().is_empty() {
            bail!("`--world` requires a world name");
        }
    }

    Ok(cli)
}

fn init_tracing(cli: &CliArgs) -> Result<()> {
    if let Some(target) = &cli.debug {
        let log_path = match target {
            DebugTarget::Default => config::config_dir().join("debug.log"),
            DebugTarget::Path(path) => path.clone(),
        };

        if let Some(parent) = log_path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent).with_context(|| {
                    format!("failed to create log directory {}", parent.display())
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("failed to open log file {}", log_path.display()))?;

        let subscriber = tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .with_max_level(LevelFilter::DEBUG);

        subscriber.try_init().map_err(|err| {
            anyhow::anyhow!(
                "failed to initialize logging to {}: {}",
                log_path.display(),
                err
            )
        })?;
    }

    Ok(())
}
