use std::path::{Path, PathBuf};
use std::process::{Child, Command as ProcessCommand, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::config::CountermeasureSettings;
use crate::error::{GuardianError, Result};
use crate::types::{AttentionState, CountermeasureAction};

/// Starts and stops the external action. Both calls may fail; callers log
/// and discard the error.
pub trait Launcher: Send + 'static {
    type Handle: Send + 'static;

    fn launch(&mut self, media: &Path) -> Result<Self::Handle>;

    fn terminate(&mut self, handle: Self::Handle) -> Result<()>;
}

/// Plays the media in an external player, falling back to the OS opener.
pub struct ProcessLauncher {
    player: PathBuf,
    args: Vec<String>,
    fallback_open: bool,
}

impl ProcessLauncher {
    pub fn new(player: impl Into<PathBuf>, args: Vec<String>, fallback_open: bool) -> Self {
        Self {
            player: player.into(),
            args,
            fallback_open,
        }
    }

    pub fn from_settings(settings: &CountermeasureSettings) -> Self {
        Self::new(
            settings.player.clone(),
            settings.player_args.clone(),
            settings.fallback_open,
        )
    }

    fn spawn_player(&self, media: &Path) -> std::io::Result<Child> {
        ProcessCommand::new(&self.player)
            .args(&self.args)
            .arg(media)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
    }

    fn spawn_opener(media: &Path) -> std::io::Result<Child> {
        #[cfg(target_os = "windows")]
        let mut cmd = {
            let mut c = ProcessCommand::new("cmd");
            c.args(["/C", "start", ""]);
            c
        };
        #[cfg(target_os = "macos")]
        let mut cmd = ProcessCommand::new("open");
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let mut cmd = ProcessCommand::new("xdg-open");

        cmd.arg(media)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
    }
}

impl Launcher for ProcessLauncher {
    type Handle = Child;

    fn launch(&mut self, media: &Path) -> Result<Child> {
        if !media.is_file() {
            return Err(GuardianError::MediaUnavailable(media.to_path_buf()));
        }

        match self.spawn_player(media) {
            Ok(child) => Ok(child),
            Err(e) if self.fallback_open => {
                debug!("Player {:?} unavailable ({}), using system opener", self.player, e);
                Self::spawn_opener(media).map_err(|e| GuardianError::Launch(e.to_string()))
            }
            Err(e) => Err(GuardianError::Launch(format!("{:?}: {}", self.player, e))),
        }
    }

    fn terminate(&mut self, mut child: Child) -> Result<()> {
        if let Ok(Some(status)) = child.try_wait() {
            return Err(GuardianError::Terminate(format!(
                "process {} already exited ({})",
                child.id(),
                status
            )));
        }

        child
            .kill()
            .map_err(|e| GuardianError::Terminate(e.to_string()))?;
        // reap
        let _ = child.wait();
        Ok(())
    }
}

enum Command {
    Start { id: u64, media: PathBuf },
    Stop { id: u64 },
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    Started(u64),
    Failed(u64),
    Stopped(u64),
}

fn run_worker<L: Launcher>(
    mut launcher: L,
    commands: Receiver<Command>,
    events: Sender<WorkerEvent>,
) {
    let mut live: Option<(u64, L::Handle)> = None;

    // FIFO: a stop sent before its start finished is handled right after it.
    for command in commands.iter() {
        match command {
            Command::Start { id, media } => {
                if let Some((old, handle)) = live.take() {
                    terminate_quietly(&mut launcher, old, handle);
                }
                match launcher.launch(&media) {
                    Ok(handle) => {
                        live = Some((id, handle));
                        let _ = events.send(WorkerEvent::Started(id));
                    }
                    Err(e) => {
                        warn!(session = id, "Countermeasure launch failed: {}", e);
                        let _ = events.send(WorkerEvent::Failed(id));
                    }
                }
            }
            Command::Stop { id } => {
                match live.take() {
                    Some((live_id, handle)) if live_id == id => {
                        terminate_quietly(&mut launcher, live_id, handle)
                    }
                    other => live = other,
                }
                let _ = events.send(WorkerEvent::Stopped(id));
            }
            Command::Shutdown => break,
        }
    }

    if let Some((id, handle)) = live.take() {
        terminate_quietly(&mut launcher, id, handle);
    }
}

fn terminate_quietly<L: Launcher>(launcher: &mut L, id: u64, handle: L::Handle) {
    if let Err(e) = launcher.terminate(handle) {
        debug!(session = id, "Ignoring terminate failure: {}", e);
    }
}

/// Tracks at most one countermeasure session and drives the worker.
pub struct CountermeasureController {
    media: PathBuf,
    session: Option<u64>,
    next_id: u64,
    commands: Option<Sender<Command>>,
    events: Receiver<WorkerEvent>,
    worker: Option<JoinHandle<()>>,
}

impl CountermeasureController {
    pub fn spawn<L: Launcher>(launcher: L, media: impl Into<PathBuf>) -> Self {
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("countermeasure".into())
            .spawn(move || run_worker(launcher, command_rx, event_tx));

        let (commands, worker) = match worker {
            Ok(handle) => (Some(command_tx), Some(handle)),
            Err(e) => {
                warn!("Countermeasure worker unavailable: {}", e);
                (None, None)
            }
        };

        Self {
            media: media.into(),
            session: None,
            next_id: 1,
            commands,
            events: event_rx,
            worker,
        }
    }

    pub fn session(&self) -> Option<u64> {
        self.session
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn on_state_change(
        &mut self,
        previous: AttentionState,
        current: AttentionState,
    ) -> CountermeasureAction {
        self.drain_events();

        if current.is_lost() && !previous.is_lost() {
            self.start()
        } else if current.is_focused() && !previous.is_focused() {
            self.stop()
        } else {
            CountermeasureAction::None
        }
    }

    /// Applies worker reports without blocking.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                WorkerEvent::Failed(id) if self.session == Some(id) => {
                    // allow the next Lost-entry to retry
                    self.session = None;
                }
                WorkerEvent::Started(id) => debug!(session = id, "Countermeasure running"),
                _ => {}
            }
        }
    }

    fn start(&mut self) -> CountermeasureAction {
        if self.session.is_some() {
            return CountermeasureAction::None;
        }
        if !self.media.is_file() {
            debug!("Countermeasure media {:?} missing, skipping", self.media);
            return CountermeasureAction::None;
        }
        let Some(commands) = &self.commands else {
            return CountermeasureAction::None;
        };

        let id = self.next_id;
        let request = Command::Start {
            id,
            media: self.media.clone(),
        };
        if commands.send(request).is_err() {
            warn!("Countermeasure worker has exited");
            return CountermeasureAction::None;
        }

        self.next_id += 1;
        self.session = Some(id);
        info!(session = id, "Countermeasure started");
        CountermeasureAction::Started(id)
    }

    fn stop(&mut self) -> CountermeasureAction {
        let Some(id) = self.session.take() else {
            return CountermeasureAction::None;
        };

        if let Some(commands) = &self.commands {
            let _ = commands.send(Command::Stop { id });
        }
        info!(session = id, "Countermeasure stopped");
        CountermeasureAction::Stopped(id)
    }

    /// Stops any live session and joins the worker. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        self.stop();

        if let Some(commands) = self.commands.take() {
            let _ = commands.send(Command::Shutdown);
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Countermeasure worker panicked");
            }
        }
        self.drain_events();
    }
}

impl Drop for CountermeasureController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
