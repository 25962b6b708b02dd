//! Protocol session with one engine process.
//!
//! [`EngineController::send_command`] is a synchronous request/response call.
//! It parks a completion sender in the session's single pending slot, writes
//! the command, and blocks on the receiver. The reader thread fills the slot
//! with the first non-`message` line, or with the exit code if the process
//! dies first, so every request is released exactly once and a crashed
//! engine surfaces as [`EngineError::Crashed`] instead of a hang.
//!
//! There is no timeout: a live engine that never answers blocks the caller
//! until it is killed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, instrument, warn};

use crate::config::EngineRecord;
use crate::connection::{ConnectionHandler, Device, EngineConnection, ProcessState};
use crate::constants::LOCAL_COPY_PREFIX;
use crate::error::{EngineError, EngineResult};
use crate::game::Game;
use crate::protocol::{self, EngineLine, Reply};

/// What wakes a waiting request.
#[derive(Debug)]
enum Completion {
    Answer(Reply),
    Exited(Option<i32>),
}

/// Human-facing echo of engine traffic.
///
/// Lines go to the tracing log and, when subscribed, to a channel.
struct Console {
    slot: usize,
    prompt: Mutex<String>,
    show_io: AtomicBool,
    sink: Mutex<Option<Sender<String>>>,
}

impl Console {
    fn new(slot: usize) -> Self {
        Self {
            slot,
            prompt: Mutex::new(format!("[{slot}]")),
            show_io: AtomicBool::new(false),
            sink: Mutex::new(None),
        }
    }

    fn prompt(&self) -> String {
        self.prompt.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_prompt(&self, info: &BTreeMap<String, String>) {
        let mut prompt = format!("[{}]", self.slot);
        if let Some(name) = info.get("name") {
            prompt.push_str(name);
            if let Some(version) = info.get("version") {
                prompt.push(' ');
                prompt.push_str(version);
            }
            if let Some(author) = info.get("author") {
                prompt.push_str(" by ");
                prompt.push_str(author);
            }
        }
        *self.prompt.lock().unwrap_or_else(PoisonError::into_inner) = prompt;
    }

    fn emit(&self, line: String) {
        debug!(slot = self.slot, "{line}");
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = sink.as_ref() {
            if tx.send(line).is_err() {
                *sink = None;
            }
        }
    }

    fn input(&self, text: &str) {
        if self.show_io.load(Ordering::Relaxed) {
            self.emit(format!("{} <<< {text}", self.prompt()));
        }
    }

    fn output(&self, text: &str) {
        if self.show_io.load(Ordering::Relaxed) {
            self.emit(format!("{} >>> {text}", self.prompt()));
        }
    }

    fn notice(&self, text: &str) {
        self.emit(format!("{}: {text}", self.prompt()));
    }
}

struct SessionState {
    process: ProcessState,
    /// Set by `shutdown`/`kill`; the process may still be running.
    closing: bool,
    pending: Option<Sender<Completion>>,
    last: Option<Reply>,
}

/// Shared between the controller and the reader threads of one process.
struct Session {
    slot: usize,
    console: Arc<Console>,
    state: Mutex<SessionState>,
}

impl Session {
    fn new(slot: usize, console: Arc<Console>) -> Self {
        Self {
            slot,
            console,
            state: Mutex::new(SessionState {
                process: ProcessState::NotStarted,
                closing: false,
                pending: None,
                last: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn exit_code(&self) -> Option<i32> {
        match self.lock().process {
            ProcessState::Exited(code) => code,
            _ => None,
        }
    }
}

impl ConnectionHandler for Session {
    fn on_stdout(&self, line: &str) {
        match protocol::classify(line) {
            EngineLine::Message(text) => {
                if !text.is_empty() {
                    self.console.notice(&text);
                }
            }
            EngineLine::Answer(reply) => {
                self.console.output(line);
                let mut state = self.lock();
                match state.pending.take() {
                    Some(tx) => {
                        state.last = Some(reply.clone());
                        // The waiter only disappears if it already gave up on a crash.
                        let _ = tx.send(Completion::Answer(reply));
                    }
                    None => warn!(slot = self.slot, line, "discarding unsolicited engine output"),
                }
            }
        }
    }

    fn on_stderr(&self, line: &str) {
        warn!(slot = self.slot, "engine stderr: {line}");
    }

    fn on_exit(&self, code: Option<i32>) {
        info!(slot = self.slot, ?code, "engine finished");
        let mut state = self.lock();
        state.process = ProcessState::Exited(code);
        if let Some(tx) = state.pending.take() {
            let _ = tx.send(Completion::Exited(code));
        }
    }
}

pub struct EngineController {
    slot: usize,
    console: Arc<Console>,
    session: Arc<Session>,
    device: Option<Box<dyn Device>>,
    info: BTreeMap<String, String>,
    local_dir: PathBuf,
}

impl EngineController {
    pub fn new(slot: usize) -> Self {
        let console = Arc::new(Console::new(slot));
        Self {
            slot,
            session: Arc::new(Session::new(slot, console.clone())),
            console,
            device: None,
            info: BTreeMap::new(),
            local_dir: PathBuf::from("."),
        }
    }

    /// Directory that receives per-slot engine copies.
    pub fn with_local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = dir.into();
        self
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Identification collected by the `about` handshake.
    pub fn info(&self) -> &BTreeMap<String, String> {
        &self.info
    }

    /// `[slot]name version by author`, as far as the engine reported it.
    pub fn prompt(&self) -> String {
        self.console.prompt()
    }

    /// The most recent answer to a request.
    pub fn last_reply(&self) -> Option<Reply> {
        self.session.lock().last.clone()
    }

    pub fn set_show_engine_io(&self, value: bool) {
        self.console.show_io.store(value, Ordering::Relaxed);
    }

    /// Receive console lines (notices, and traffic when IO echo is on).
    pub fn subscribe_console(&self) -> Receiver<String> {
        let (tx, rx) = mpsc::channel();
        *self.console.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        rx
    }

    /// A process is attached, still running, and not being shut down.
    pub fn ready(&self) -> bool {
        let state = self.session.lock();
        self.device.is_some() && state.process == ProcessState::Running && !state.closing
    }

    /// A request is outstanding.
    pub fn locked(&self) -> bool {
        self.session.lock().pending.is_some()
    }

    pub fn process_state(&self) -> ProcessState {
        self.session.lock().process
    }

    /// Path of this slot's private copy of an engine executable.
    pub fn local_copy_path(&self) -> PathBuf {
        self.local_dir.join(format!(
            "{LOCAL_COPY_PREFIX}{}{}",
            self.slot,
            std::env::consts::EXE_SUFFIX
        ))
    }

    fn crashed(&self, code: Option<i32>) -> EngineError {
        EngineError::Crashed { slot: self.slot, code }
    }

    /// Launch the engine described by `record` and run the handshake.
    #[instrument(skip(self, record), fields(slot = self.slot, engine = %record.name))]
    pub fn start(&mut self, record: &EngineRecord) -> EngineResult<()> {
        let path = if record.need_local_copy {
            let local = self.local_copy_path();
            fs::copy(&record.path, &local).map_err(|source| EngineError::LocalCopy {
                from: record.path.clone(),
                to: local.clone(),
                source,
            })?;
            local
        } else {
            record.path.clone()
        };
        let args = record.args.clone();
        self.connect(move |handler| {
            let connection = EngineConnection::start(Path::new(&path), &args, handler)
                .map_err(|source| EngineError::Launch { path: path.clone(), source })?;
            Ok(Box::new(connection) as Box<dyn Device>)
        })
    }

    /// Attach a device built by `open` and run the handshake.
    ///
    /// `open` receives the handler that must see everything the device emits.
    pub fn connect<F>(&mut self, open: F) -> EngineResult<()>
    where
        F: FnOnce(Arc<dyn ConnectionHandler>) -> EngineResult<Box<dyn Device>>,
    {
        if let Some(mut old) = self.device.take() {
            old.shutdown();
        }
        self.info.clear();
        self.console.set_prompt(&self.info);
        self.session = Arc::new(Session::new(self.slot, self.console.clone()));
        let handler: Arc<dyn ConnectionHandler> = self.session.clone();
        let device = open(handler)?;
        {
            let mut state = self.session.lock();
            if state.process == ProcessState::NotStarted {
                state.process = ProcessState::Running;
            }
        }
        self.device = Some(device);
        self.call_about()
    }

    /// Send one command and wait for its answer.
    ///
    /// Returns `Ok(None)` without sending anything when no engine is running.
    pub fn send_command(&mut self, text: &str) -> EngineResult<Option<Reply>> {
        let slot = self.slot;
        let Some(device) = self.device.as_mut() else {
            error!(slot, command = text, "no engine attached");
            return Ok(None);
        };
        let rx = {
            let mut state = self.session.lock();
            if state.process != ProcessState::Running {
                error!(slot, command = text, "engine is not ready");
                return Ok(None);
            }
            if state.closing {
                error!(slot, command = text, "engine is shutting down");
                return Ok(None);
            }
            let (tx, rx) = mpsc::channel();
            state.pending = Some(tx);
            rx
        };
        self.console.input(text);

        if let Err(err) = device.send_line(text) {
            warn!(slot, %err, "failed to write to engine");
            let mut state = self.session.lock();
            if state.pending.take().is_some() {
                let code = match state.process {
                    ProcessState::Exited(code) => code,
                    _ => None,
                };
                error!(slot, command = text, "engine crashed");
                return Err(EngineError::Crashed { slot, code });
            }
        }

        match rx.recv() {
            Ok(Completion::Answer(reply)) => match self.session.lock().process {
                ProcessState::Exited(code) if code != Some(0) => {
                    error!(slot, command = text, ?code, "engine crashed after command");
                    Err(self.crashed(code))
                }
                _ => Ok(Some(reply)),
            },
            Ok(Completion::Exited(code)) => {
                error!(slot, command = text, ?code, "engine crashed after command");
                Err(self.crashed(code))
            }
            Err(_) => Err(self.crashed(self.session.exit_code())),
        }
    }

    /// `about` handshake. An unparseable answer leaves `info` empty.
    fn call_about(&mut self) -> EngineResult<()> {
        let Some(reply) = self.send_command(protocol::ABOUT)? else {
            return Ok(());
        };
        let pairs = protocol::parse_about(&reply.text);
        if pairs.is_empty() {
            if reply.is("unknown") {
                debug!(slot = self.slot, "engine does not support about");
            } else {
                warn!(slot = self.slot, answer = %reply.text, "unparseable about answer");
            }
            return Ok(());
        }
        self.info.extend(pairs);
        self.console.set_prompt(&self.info);
        info!(slot = self.slot, prompt = %self.console.prompt(), "engine identified");
        Ok(())
    }

    /// Declare the board size for the next game.
    pub fn new_game(&mut self, width: usize, height: usize) -> EngineResult<()> {
        let Some(reply) = self.send_command(&protocol::start_command(width, height))? else {
            return Ok(());
        };
        if reply.is("error") {
            error!(slot = self.slot, width, height, answer = %reply.text, "engine rejected board size");
        } else if !reply.is("ok") {
            warn!(slot = self.slot, answer = %reply.text, "unexpected answer to start");
        }
        Ok(())
    }

    /// Send the move history. Nothing is sent for an empty game.
    pub fn load_game(&mut self, game: &Game, want_best_move: bool) -> EngineResult<Option<Reply>> {
        match protocol::board_payload(game.moves(), want_best_move) {
            Some(payload) => self.send_command(&payload),
            None => Ok(None),
        }
    }

    /// Ask for the best move in `game` and play it.
    #[instrument(skip(self, game), fields(slot = self.slot))]
    pub fn think(&mut self, game: &mut Game) -> EngineResult<()> {
        self.new_game(game.width(), game.height())?;
        let reply = if game.moves().is_empty() {
            self.send_command(protocol::BEGIN)?
        } else {
            self.load_game(game, true)?
        };
        let Some(reply) = reply else { return Ok(()) };
        match protocol::parse_coord(&reply.command) {
            Ok((x, y)) => {
                if let Err(err) = game.play(x, y) {
                    error!(slot = self.slot, x, y, %err, "engine chose an illegal move");
                }
            }
            Err(err) => warn!(slot = self.slot, %err, "engine did not answer with a move"),
        }
        Ok(())
    }

    /// Ask the engine to play `game` out by itself and apply its moves.
    #[instrument(skip(self, game), fields(slot = self.slot))]
    pub fn play(&mut self, game: &mut Game) -> EngineResult<()> {
        self.new_game(game.width(), game.height())?;
        self.load_game(game, false)?;
        let Some(reply) = self.send_command(protocol::SINGLE_PLAY)? else {
            return Ok(());
        };
        if reply.is("play") {
            let moves = match protocol::parse_play_moves(reply.args.as_deref().unwrap_or_default()) {
                Ok(moves) => moves,
                Err(err) => {
                    warn!(slot = self.slot, %err, "malformed play answer");
                    return Ok(());
                }
            };
            for (x, y) in moves {
                if let Err(err) = game.play(x, y) {
                    warn!(slot = self.slot, x, y, %err, "skipping rejected move");
                }
            }
        } else if reply.is("unknown") {
            info!(slot = self.slot, "single play is not supported by this engine");
        } else {
            warn!(slot = self.slot, answer = %reply.text, "unexpected answer to single_play");
        }
        Ok(())
    }

    /// Ask for diagnostics about `(x, y)` and show them on the console.
    pub fn print_square_info(&mut self, game: &Game, x: usize, y: usize) -> EngineResult<()> {
        self.new_game(game.width(), game.height())?;
        self.load_game(game, false)?;
        if let Some(reply) = self.send_command(&protocol::squareinfo_command(x, y))? {
            self.console.notice(&reply.text);
        }
        Ok(())
    }

    /// Ask the engine to exit. Later commands are refused at once.
    pub fn shutdown(&mut self) {
        if let Some(device) = self.device.as_mut() {
            self.session.lock().closing = true;
            device.shutdown();
        }
    }

    /// Terminate the engine process. Wakes any request waiting on it.
    pub fn kill(&mut self) {
        if let Some(device) = self.device.as_mut() {
            self.session.lock().closing = true;
            device.kill();
        }
    }
}
