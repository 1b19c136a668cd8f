//! TUI event loop: terminal input, spinner ticks, coach updates, and key picker requests.

use std::sync::Arc;
use std::time::Duration;

use coach::{ChatSessionController, ChatTransport, CredentialStore, HostKeyProbe, ProbePolicy};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use proto::{CoachEvent, CoachSnapshot, ProbeError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use super::action::{Action, Command};
use super::app::{Screen, TuiApp};
use super::picker::{PickerRequest, TuiKeyPicker};
use crate::config::Config;

/// Pending `pick()` calls the loop can hold before the picker task waits.
const PICKER_CHANNEL_CAPACITY: usize = 4;

/// A controller bound to the coach screen while it is open.
struct MountedCoach {
    controller: Arc<ChatSessionController>,
    events: broadcast::Receiver<CoachEvent>,
}

/// Owns the coach services and runs the coach-side effects of `Command`s.
pub struct CoachHost {
    probe: Arc<HostKeyProbe>,
    transport: Arc<dyn ChatTransport>,
    policy: ProbePolicy,
    mounted: Option<MountedCoach>,
    pending_picker: Option<oneshot::Sender<Result<String, ProbeError>>>,
}

impl CoachHost {
    pub fn new(
        probe: Arc<HostKeyProbe>,
        transport: Arc<dyn ChatTransport>,
        policy: ProbePolicy,
    ) -> Self {
        Self {
            probe,
            transport,
            policy,
            mounted: None,
            pending_picker: None,
        }
    }

    fn controller(&self) -> Option<Arc<ChatSessionController>> {
        self.mounted.as_ref().map(|m| Arc::clone(&m.controller))
    }

    /// Runs `command`, feeding any immediate state change back into `app`.
    pub fn execute(&mut self, command: Command, app: &mut TuiApp) {
        match command {
            Command::None => {}
            Command::OpenCoach => {
                let snapshot = self.mount();
                app.update(Action::CoachChanged(snapshot));
            }
            Command::CloseCoach => self.unmount(),
            Command::SendToCoach(text) => {
                if let Some(controller) = self.controller() {
                    tokio::spawn(async move {
                        controller.send_message(&text).await;
                    });
                }
            }
            Command::SelectKey => {
                if let Some(controller) = self.controller() {
                    tokio::spawn(async move { controller.request_key_selection().await });
                }
            }
            Command::RetryCoach => {
                if let Some(controller) = self.controller() {
                    tokio::spawn(async move { controller.probe_and_initialize().await });
                }
            }
            Command::ResetCoach => {
                if let Some(controller) = self.controller() {
                    self.probe.store().clear();
                    controller.reset();
                    info!("API key cleared by user");
                }
            }
            Command::ResolveKeyPicker(result) => match self.pending_picker.take() {
                Some(reply) => {
                    debug!(selected = result.is_ok(), "Key picker resolved");
                    let _ = reply.send(result);
                }
                None => debug!("Key picker answer with no pending request"),
            },
        }
    }

    /// Mounts a fresh controller and starts key detection.
    fn mount(&mut self) -> CoachSnapshot {
        self.unmount();
        let controller = Arc::new(
            ChatSessionController::new(self.probe.clone(), Arc::clone(&self.transport))
                .with_probe_policy(self.policy),
        );
        let events = controller.subscribe();
        let snapshot = controller.snapshot();
        let initializing = Arc::clone(&controller);
        tokio::spawn(async move { initializing.probe_and_initialize().await });
        self.mounted = Some(MountedCoach { controller, events });
        info!("Coach mounted");
        snapshot
    }

    /// Deactivates the mounted controller and dismisses any open picker.
    pub fn unmount(&mut self) {
        if let Some(reply) = self.pending_picker.take() {
            let _ = reply.send(Err(ProbeError::Cancelled));
        }
        if let Some(mounted) = self.mounted.take() {
            mounted.controller.deactivate();
            info!("Coach unmounted");
        }
    }

    /// Shows the picker modal for `request`; only the latest request is kept.
    pub fn present_picker(&mut self, request: PickerRequest, app: &mut TuiApp) {
        if self.mounted.is_none() {
            let _ = request.reply.send(Err(ProbeError::Cancelled));
            return;
        }
        if let Some(previous) = self.pending_picker.replace(request.reply) {
            let _ = previous.send(Err(ProbeError::Cancelled));
        }
        app.update(Action::OpenKeyPicker);
    }

    /// Next snapshot after a controller change. Pends while no coach is mounted.
    pub async fn changed(&mut self) -> Option<CoachSnapshot> {
        let Some(mounted) = self.mounted.as_mut() else {
            return std::future::pending().await;
        };
        match mounted.events.recv().await {
            Ok(_) => Some(mounted.controller.snapshot()),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "Coach events lagged");
                Some(mounted.controller.snapshot())
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

/// RAII guard that restores the terminal on drop (even on panic).
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
    }
}

/// Run the full-screen TUI until the user quits.
pub async fn run_tui(config: Config, start: Screen) -> anyhow::Result<()> {
    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard; // Drop restores terminal

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = TuiApp::new(config.game.starting_points, StdRng::from_entropy());

    let store = Arc::new(CredentialStore::with_key(config.coach.api_key()));
    let probe = Arc::new(HostKeyProbe::new(Arc::clone(&store)));
    let transport: Arc<dyn ChatTransport> = Arc::new(config.coach.gemini_transport(store));
    let mut host = CoachHost::new(Arc::clone(&probe), transport, config.coach.probe_policy());

    // The key service becomes available once this loop can answer picker requests.
    let (picker_tx, mut picker_rx) = mpsc::channel::<PickerRequest>(PICKER_CHANNEL_CAPACITY);
    probe.attach(Arc::new(TuiKeyPicker::new(picker_tx)));

    debug!(
        start = ?start,
        starting_points = config.game.starting_points,
        "TUI started"
    );

    if start != Screen::Home {
        let command = app.update(Action::OpenScreen(start));
        host.execute(command, &mut app);
    }

    // Crossterm event stream (async)
    let mut crossterm_stream = EventStream::new();

    // Spinner tick interval (100ms)
    let mut spinner_interval = tokio::time::interval(Duration::from_millis(100));
    spinner_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        terminal.draw(|frame| app.render(frame))?;

        tokio::select! {
            maybe_event = crossterm_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        let command = app.handle_key(key);
                        host.execute(command, &mut app);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => warn!(error = %e, "Terminal event error"),
                    None => break,
                }
            }
            Some(snapshot) = host.changed() => {
                app.update(Action::CoachChanged(snapshot));
            }
            Some(request) = picker_rx.recv() => {
                host.present_picker(request, &mut app);
            }
            _ = spinner_interval.tick() => {
                app.update(Action::Tick);
            }
        }

        if app.should_quit {
            break;
        }
    }

    host.unmount();
    info!(points = app.ledger.points(), "TUI exited");
    Ok(())
}
