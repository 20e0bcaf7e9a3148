use std::io::{BufRead, BufReader, Read};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::cli::{Cli, Command};
use crate::clipboard_watch::{ClipboardError, ClipboardSource, ClipboardWatcher, SystemClipboard};
use crate::config::{self, Config, ConfigError};
use crate::coordinator::{QueryCoordinator, RoundOutcome};
use crate::extract::extract;
use crate::model::QueryResult;
use crate::notifier::{self, Notifier, SilentNotifier};
use crate::present::{OutputFormat, TerminalPresenter};
use crate::sound::{Cue, SoundBoard};

pub const STATUS_TIMEOUT: Duration = Duration::from_secs(2);
pub const FAILURE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("logging setup failed: {0}")]
    Logging(std::io::Error),
}

/// Out-of-band requests delivered between rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Toggle,
    Shutdown,
}

/// Everything pipe mode waits on, merged into one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipeEvent {
    Line(String),
    Control(ControlEvent),
    Closed,
}

impl From<ControlEvent> for PipeEvent {
    fn from(event: ControlEvent) -> Self {
        PipeEvent::Control(event)
    }
}

/// The coordinator plus every presenter that consumes its rounds.
pub struct Session {
    coordinator: QueryCoordinator,
    terminal: Option<TerminalPresenter>,
    notifier: Box<dyn Notifier>,
    sounds: SoundBoard,
    can_activate: bool,
}

impl Session {
    pub fn new(
        coordinator: QueryCoordinator,
        terminal: Option<TerminalPresenter>,
        notifier: Box<dyn Notifier>,
        sounds: SoundBoard,
    ) -> Self {
        Self {
            coordinator,
            terminal,
            notifier,
            sounds,
            can_activate: true,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let terminal = cfg
            .terminal_output
            .then(|| TerminalPresenter::new(OutputFormat::Text));
        Self::new(
            QueryCoordinator::from_config(cfg),
            terminal,
            notifier::from_config(cfg),
            SoundBoard::from_config(cfg),
        )
        .with_activation(cfg.has_output())
    }

    /// A session with no output channel starts paused and ignores toggles.
    pub fn with_activation(mut self, can_activate: bool) -> Self {
        self.can_activate = can_activate;
        if !can_activate {
            self.coordinator.set_enabled(false);
        }
        self
    }

    pub fn coordinator(&self) -> &QueryCoordinator {
        &self.coordinator
    }

    pub fn is_enabled(&self) -> bool {
        self.coordinator.is_enabled()
    }

    pub fn start(&mut self) {
        let failures = self.coordinator.connect_missing();
        self.report_failures(&failures);
        if !self.can_activate {
            tracing::warn!("no output is enabled; lookups stay disabled");
        }
        self.sounds.play(Cue::Startup);
        self.notifier.simple_notify("Started clipfind", STATUS_TIMEOUT);
    }

    /// Runs one round for the given clipboard text and hands the results to every presenter.
    pub fn handle_clipboard(&mut self, raw: &str) -> Vec<QueryResult> {
        match self.coordinator.run_round(raw) {
            RoundOutcome::Disabled | RoundOutcome::Rejected => Vec::new(),
            RoundOutcome::Completed {
                results, failures, ..
            } => {
                self.report_failures(&failures);
                for result in &results {
                    self.present(result);
                }
                results
            }
        }
    }

    pub fn toggle(&mut self) {
        if !self.can_activate {
            tracing::warn!("toggle ignored; no output is enabled");
            return;
        }

        let activation = self.coordinator.toggle();
        if activation.enabled {
            self.sounds.play(Cue::Startup);
            self.notifier.simple_notify("Resumed clipfind", STATUS_TIMEOUT);
            self.report_failures(&activation.reconnect_failures);
        } else {
            self.sounds.play(Cue::Shutdown);
            self.notifier.simple_notify("Paused clipfind", STATUS_TIMEOUT);
        }
        tracing::info!(enabled = activation.enabled, "lookups toggled");
    }

    pub fn shutdown(&mut self) {
        self.sounds.play(Cue::Shutdown);
        self.notifier.simple_notify("Exited clipfind", STATUS_TIMEOUT);
        self.coordinator.shutdown();
        tracing::info!("session stopped");
    }

    fn present(&mut self, result: &QueryResult) {
        if let Some(terminal) = &self.terminal {
            terminal.present(result);
        }
        self.notifier.deliver(result);
        self.sounds.play(if result.found() {
            Cue::Success
        } else {
            Cue::Failure
        });
    }

    fn report_failures(&mut self, failures: &[CatalogError]) {
        for failure in failures {
            let message = failure.to_string();
            if let Some(terminal) = &self.terminal {
                terminal.failure(&message);
            }
            self.notifier.simple_notify(&message, FAILURE_TIMEOUT);
        }
    }
}

/// Forwards process signals to `events` from a dedicated thread.
pub fn spawn_signal_listener<E>(events: Sender<E>) -> std::io::Result<thread::JoinHandle<()>>
where
    E: From<ControlEvent> + Send + 'static,
{
    thread::Builder::new()
        .name("clipfind-signals".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(error) => {
                    tracing::error!(%error, "signal runtime failed to start");
                    return;
                }
            };
            runtime.block_on(forward_signals(events));
        })
}

#[cfg(unix)]
async fn forward_signals<E: From<ControlEvent>>(events: Sender<E>) {
    use tokio::signal::unix::{signal, SignalKind};

    let handlers = (
        signal(SignalKind::user_defined1()),
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    );
    let (mut toggle, mut interrupt, mut terminate) = match handlers {
        (Ok(toggle), Ok(interrupt), Ok(terminate)) => (toggle, interrupt, terminate),
        _ => {
            tracing::error!("failed to install signal handlers");
            return;
        }
    };

    loop {
        let event = tokio::select! {
            _ = toggle.recv() => ControlEvent::Toggle,
            _ = interrupt.recv() => ControlEvent::Shutdown,
            _ = terminate.recv() => ControlEvent::Shutdown,
        };
        tracing::debug!(?event, "signal received");
        if events.send(event.into()).is_err() || event == ControlEvent::Shutdown {
            return;
        }
    }
}

#[cfg(not(unix))]
async fn forward_signals<E: From<ControlEvent>>(events: Sender<E>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            let _ = events.send(ControlEvent::Shutdown.into());
        }
        Err(error) => tracing::error!(%error, "failed to listen for ctrl-c"),
    }
}

/// Polls the clipboard until a shutdown event arrives.
pub fn drive<S: ClipboardSource>(
    session: &mut Session,
    watcher: &mut ClipboardWatcher<S>,
    events: &Receiver<ControlEvent>,
    interval: Duration,
) {
    loop {
        match events.recv_timeout(interval) {
            Ok(ControlEvent::Toggle) => session.toggle(),
            Ok(ControlEvent::Shutdown) => return,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => thread::sleep(interval),
        }
        if let Some(text) = watcher.poll() {
            session.handle_clipboard(&text);
        }
    }
}

/// Reads `input` line by line on its own thread; `Closed` follows EOF or a read error.
pub fn spawn_line_reader<R>(
    input: R,
    events: Sender<PipeEvent>,
) -> std::io::Result<thread::JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("clipfind-stdin".to_string())
        .spawn(move || {
            for line in BufReader::new(input).lines() {
                match line {
                    Ok(line) => {
                        if events.send(PipeEvent::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(error) => {
                        tracing::error!(%error, "failed to read input");
                        break;
                    }
                }
            }
            let _ = events.send(PipeEvent::Closed);
        })
}

/// Treats each input line as one clipboard event; stops when input closes or on shutdown.
pub fn drive_lines(session: &mut Session, events: &Receiver<PipeEvent>) {
    while let Ok(event) = events.recv() {
        match event {
            PipeEvent::Line(line) => {
                session.handle_clipboard(&line);
            }
            PipeEvent::Control(ControlEvent::Toggle) => session.toggle(),
            PipeEvent::Control(ControlEvent::Shutdown) | PipeEvent::Closed => return,
        }
    }
}

pub fn run_with_options(cli: Cli) -> Result<(), RuntimeError> {
    let mut cfg = config::load(cli.config.as_deref())?;
    config::apply_overrides(&mut cfg, &cli.overrides());
    config::validate(&cfg)?;

    match cli.selected_command() {
        Command::Watch => run_watch(cfg),
        Command::Pipe => run_pipe(cfg),
        Command::Query { json, text } => run_query(cfg, &text.join(" "), json),
        Command::Extract { text } => {
            run_extract(&text.join(" "));
            Ok(())
        }
        Command::Catalogs => {
            run_catalogs(&cfg);
            Ok(())
        }
    }
}

fn run_watch(cfg: Config) -> Result<(), RuntimeError> {
    config::ensure_default_file(&cfg)?;

    let (tx, rx) = mpsc::channel::<ControlEvent>();
    spawn_signal_listener(tx)?;

    let mut watcher = ClipboardWatcher::new(SystemClipboard::open()?);
    watcher.prime();

    let mut session = Session::from_config(&cfg);
    session.start();
    tracing::info!(
        interval_ms = cfg.poll_interval_ms,
        catalogs = session.coordinator().catalogs().len(),
        "watching clipboard"
    );
    drive(
        &mut session,
        &mut watcher,
        &rx,
        Duration::from_millis(cfg.poll_interval_ms),
    );
    session.shutdown();
    Ok(())
}

fn run_pipe(cfg: Config) -> Result<(), RuntimeError> {
    let (tx, rx) = mpsc::channel::<PipeEvent>();
    spawn_signal_listener(tx.clone())?;

    let mut session = Session::from_config(&cfg);
    session.start();
    spawn_line_reader(std::io::stdin(), tx)?;
    drive_lines(&mut session, &rx);
    session.shutdown();
    Ok(())
}

fn run_query(cfg: Config, text: &str, json: bool) -> Result<(), RuntimeError> {
    let format = if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let terminal = TerminalPresenter::new(format);
    if extract(text).is_none() {
        terminal.message("rejected: no usable search token");
        return Ok(());
    }

    let mut session = Session::new(
        QueryCoordinator::from_config(&cfg),
        Some(terminal),
        Box::new(SilentNotifier),
        SoundBoard::silent(),
    );
    session.start();
    session.handle_clipboard(text);
    session.shutdown();
    Ok(())
}

fn run_extract(text: &str) {
    match extract(text) {
        Some(token) => println!("{token}"),
        None => println!("rejected"),
    }
}

fn run_catalogs(cfg: &Config) {
    let mut coordinator = QueryCoordinator::from_config(cfg);
    let failures = coordinator.connect_missing();
    for catalog in coordinator.catalogs() {
        let status = if catalog.is_connected() {
            "connected"
        } else {
            "unavailable"
        };
        println!("{status}\t{}\t{}", catalog.name(), catalog.source().filepath.display());
    }
    for failure in &failures {
        eprintln!("{failure}");
    }
    println!(
        "active catalogs: {} / {}",
        coordinator.active_count(),
        coordinator.catalogs().len()
    );
    coordinator.shutdown();
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::mpsc;

    use super::{drive_lines, spawn_line_reader, ControlEvent, PipeEvent, Session};
    use crate::catalog_store::SqliteConnector;
    use crate::coordinator::QueryCoordinator;
    use crate::notifier::SilentNotifier;
    use crate::sound::SoundBoard;

    fn empty_session() -> Session {
        Session::new(
            QueryCoordinator::new(Vec::new(), Box::new(SqliteConnector)),
            None,
            Box::new(SilentNotifier),
            SoundBoard::silent(),
        )
    }

    #[test]
    fn session_without_outputs_ignores_toggles() {
        let mut session = empty_session().with_activation(false);
        assert!(!session.is_enabled());
        session.toggle();
        assert!(!session.is_enabled());
    }

    #[test]
    fn toggle_flips_enabled_flag() {
        let mut session = empty_session();
        assert!(session.is_enabled());
        session.toggle();
        assert!(!session.is_enabled());
        session.toggle();
        assert!(session.is_enabled());
    }

    #[test]
    fn queued_toggle_applies_before_next_line() {
        let mut session = empty_session();
        let (tx, rx) = mpsc::channel();
        tx.send(ControlEvent::Toggle.into()).unwrap();
        spawn_line_reader(Cursor::new("first line\n"), tx).unwrap();

        drive_lines(&mut session, &rx);

        assert!(!session.is_enabled());
    }

    #[test]
    fn shutdown_event_stops_line_processing() {
        let mut session = empty_session();
        let (tx, rx) = mpsc::channel();
        tx.send(ControlEvent::Shutdown.into()).unwrap();
        tx.send(ControlEvent::Toggle.into()).unwrap();
        tx.send(PipeEvent::Line("a line".to_string())).unwrap();

        drive_lines(&mut session, &rx);

        assert!(session.is_enabled());
        assert_eq!(rx.try_recv(), Ok(PipeEvent::Control(ControlEvent::Toggle)));
    }

    #[test]
    fn line_reader_sends_lines_then_closed() {
        let (tx, rx) = mpsc::channel();
        spawn_line_reader(Cursor::new("one\ntwo"), tx)
            .unwrap()
            .join()
            .unwrap();

        let events: Vec<PipeEvent> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                PipeEvent::Line("one".to_string()),
                PipeEvent::Line("two".to_string()),
                PipeEvent::Closed,
            ]
        );
    }
}
