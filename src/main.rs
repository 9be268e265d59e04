use anyhow::Result;
use panemux::browser::Services;
use panemux::cli::commands::{self, ControlCommand, Line};
use panemux::cli::{self, RuntimeOptions};
use panemux::surface::Vt100SurfaceFactory;
use panemux::transport::WebSocketConnector;
use panemux::{Collaborators, ManagerOptions, PanelManager, PanelNotice, SplitOptions};
use panemux_config::{Config, FileStateStore};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::{Builder, Handle};

fn main() -> Result<()> {
    // Process CLI arguments first (before logging init for cleaner output)
    let options = match cli::process_cli() {
        cli::CliResult::Exit(code) => {
            if code == 0 {
                return Ok(());
            }
            std::process::exit(code);
        }
        cli::CliResult::Continue(options) => options,
    };
    // CLI --log-level wins, then RUST_LOG, then the config file (applied below)
    panemux::debug::init_log_bridge(options.log_level);

    log::info!("Starting panemux {}", panemux::VERSION);

    let config = options.load_config()?;
    panemux::debug::apply_config_level(config.log_level.to_level_filter());

    // One thread: attachment workers and the controller interleave in FIFO order
    let runtime = Builder::new_current_thread().enable_all().build()?;
    let result = runtime.block_on(run(config, options));

    log::info!("Controller exited, shutting down runtime");
    runtime.shutdown_timeout(std::time::Duration::from_secs(2));

    if let Err(ref e) = result {
        eprintln!("panemux: error: {e:#}");
    }
    result
}

async fn run(config: Config, options: RuntimeOptions) -> Result<()> {
    let store = FileStateStore::open(Config::state_path())?;
    let collaborators = Collaborators {
        connector: Arc::new(WebSocketConnector::from_config(&config)),
        surfaces: Arc::new(Vt100SurfaceFactory::stdout()),
        services: Services::unavailable(),
        store: Arc::new(store),
    };
    let (mut manager, mut notices) = PanelManager::new(
        Handle::current(),
        collaborators,
        ManagerOptions::from_config(&config),
    );

    match &options.session {
        Some(session) => {
            manager.resume_session(session, options.window);
            manager.restore_split();
        }
        None => eprintln!("panemux: no session; use :session NAME [WINDOW] (:help for commands)"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&mut manager, &line) {
                    break;
                }
            }
            alive = manager.next_event() => {
                if !alive {
                    break;
                }
            }
            Some(notice) = notices.recv() => report(&notice),
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted");
                break;
            }
        }
    }

    manager.shutdown();
    Ok(())
}

/// Apply one stdin line. Returns false to quit.
fn handle_line(manager: &mut PanelManager, line: &str) -> bool {
    let command = match commands::parse_line(line) {
        Ok(Line::Input(text)) => {
            let mut bytes = text.into_bytes();
            bytes.push(b'\r');
            if !manager.route_input(&bytes) {
                eprintln!("panemux: no terminal focused");
            }
            return true;
        }
        Ok(Line::Command(command)) => command,
        Err(e) => {
            eprintln!("panemux: {e}");
            return true;
        }
    };

    let session = manager.current_session().map(str::to_string);
    match command {
        ControlCommand::Quit => return false,
        ControlCommand::Help => eprintln!("{}", commands::HELP),
        ControlCommand::Split => manager.toggle_split(SplitOptions::default()),
        ControlCommand::SplitBare => manager.toggle_split(SplitOptions {
            skip_auto_connect: true,
        }),
        ControlCommand::Focus => manager.switch_focus(),
        ControlCommand::Session { name, window } => manager.resume_session(&name, window),
        ControlCommand::Reconnect => manager.reconnect_now(),
        ControlCommand::Online => manager.network_restored(),
        ControlCommand::Ratio(ratio) => manager.set_divider_ratio(ratio),
        ControlCommand::Width(px) => manager.set_viewport_width(px),
        ControlCommand::Drawer(px) => manager.set_drawer_width(px),
        ControlCommand::Terminal => manager.show_terminal_view(),
        ControlCommand::Up => manager.focused_panel_mut().files_parent(),
        ControlCommand::Refresh => manager.focused_panel_mut().refresh(),
        ControlCommand::Commit(hash) => manager.focused_panel_mut().select_commit(&hash),
        ControlCommand::Diff(path) => manager.focused_panel_mut().show_file_diff(&path),
        ControlCommand::Log => manager.focused_panel_mut().close_diff(),
        ControlCommand::Close(key) => {
            if !manager.focused_panel_mut().close_tab(key) {
                eprintln!("panemux: {key} is not a hidden cached tab");
            }
        }
        ControlCommand::Layout => match serde_json::to_string(&manager.layout()) {
            Ok(json) => eprintln!("{json}"),
            Err(e) => eprintln!("panemux: {e}"),
        },
        ControlCommand::Files(path) => match &session {
            Some(session) => manager.show_file_browser(session, path.as_deref()),
            None => eprintln!("panemux: no session"),
        },
        ControlCommand::Git => match &session {
            Some(session) => manager.show_git_browser(session),
            None => eprintln!("panemux: no session"),
        },
        ControlCommand::Window(index) => match &session {
            Some(session) => manager.connect_to_window(session, index),
            None => eprintln!("panemux: no session"),
        },
    }
    true
}

/// Status line for a controller notice
fn report(notice: &PanelNotice) {
    match notice {
        PanelNotice::ClientStatus {
            panel,
            session,
            window_index,
        } => eprintln!("[{panel}] {session}:{window_index}"),
        PanelNotice::ConnectionState { panel, state } => eprintln!("[{panel}] {state}"),
        PanelNotice::FocusChanged { panel } => eprintln!("[{panel}] focused"),
        PanelNotice::TitleChanged { panel, title } if title.is_empty() => {
            eprintln!("[{panel}] title cleared")
        }
        PanelNotice::TitleChanged { panel, title } => eprintln!("[{panel}] title: {title}"),
        PanelNotice::ViewModeChanged { panel, mode } => eprintln!("[{panel}] view: {mode}"),
        PanelNotice::LayoutChanged => log::debug!("Layout changed"),
    }
}
