//! Play sessions and their cancellation.
//!
//! A session is one audio-playback attempt. It owns every timer derived from
//! that attempt (the playback sampler tick and the blink loop), so tearing a
//! session down is one call. At most one session is live: starting a new one
//! cancels the previous handle before anything new is armed.
//!
//! Timer tasks never write to the event channel directly. They go through a
//! [`SessionEmitter`], which checks the live session id on every send, so a
//! tick that completes after its session was replaced is dropped instead of
//! overwriting the newer session's state.
//!
//! The live id and the channel send share one lock. Teardown takes the same
//! lock to retire the id and queue its final events, so on any runtime
//! flavour nothing from a session can follow its `SessionEnded`.

use crate::runtime::{EndReason, LipSyncEvent};
use crate::viseme::Viseme;
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Value of the live-session cell when nothing is playing.
const NO_SESSION: u64 = 0;

/// Opaque identity of one play session. Never reused within a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Id of the live session, guarded together with sends on the channel.
type LiveCell = Arc<Mutex<u64>>;

/// Lock the live-session cell.
///
/// The guarded value is a plain id that is always valid, so a poisoned lock
/// is recovered rather than propagated.
fn lock_live(live: &Mutex<u64>) -> MutexGuard<'_, u64> {
    live.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Retire `id` if it is still live. Caller holds the lock.
fn retire(live: &mut u64, id: SessionId) {
    if *live == id.0 {
        *live = NO_SESSION;
    }
}

/// Event channel shared by all sessions of one manager.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<LipSyncEvent>,
    live: LiveCell,
}

impl EventSink {
    /// Emitter bound to `session`.
    pub fn for_session(&self, session: SessionId) -> SessionEmitter {
        SessionEmitter {
            session,
            sink: self.clone(),
        }
    }

    fn live_session(&self) -> u64 {
        *lock_live(&self.live)
    }

    /// Send without the liveness check. Callers hold the live lock.
    fn send_unguarded(&self, event: LipSyncEvent) {
        // No receiver is not an error: the renderer may already be gone.
        let _ = self.tx.send(event);
    }
}

/// Session-scoped event sender held by timer tasks.
#[derive(Debug, Clone)]
pub struct SessionEmitter {
    session: SessionId,
    sink: EventSink,
}

impl SessionEmitter {
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Whether this emitter's session is still the live one.
    pub fn is_live(&self) -> bool {
        self.sink.live_session() == self.session.0
    }

    /// Emit a mouth shape. Returns `false` if the session is no longer live.
    pub fn emit_viseme(&self, viseme: Viseme) -> bool {
        self.emit(LipSyncEvent::Viseme {
            session: self.session,
            viseme,
        })
    }

    /// Emit an eye state. Returns `false` if the session is no longer live.
    pub fn emit_eyes(&self, open: bool) -> bool {
        self.emit(LipSyncEvent::Eyes {
            session: self.session,
            open,
        })
    }

    fn emit(&self, event: LipSyncEvent) -> bool {
        // Held across the send so teardown cannot slip in between.
        let live = lock_live(&self.sink.live);
        if *live != self.session.0 {
            trace!(session = %self.session, ?event, "dropping event from stale session");
            return false;
        }
        self.sink.send_unguarded(event);
        true
    }
}

struct BlinkTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owner of one session's timers.
///
/// Dropping the handle cancels it.
pub struct SessionHandle {
    id: SessionId,
    live: LiveCell,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    blink: Option<BlinkTask>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("tasks", &self.tasks.len())
            .field("blinking", &self.blink.is_some())
            .finish()
    }
}

impl SessionHandle {
    fn new(id: SessionId, live: LiveCell) -> Self {
        Self {
            id,
            live,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
            blink: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Child token cancelled together with this session.
    pub fn token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Spawn a task owned by this session.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_cancelled() {
            debug!(session = %self.id, "not spawning task on cancelled session");
            return;
        }
        self.tasks.push(tokio::spawn(task));
    }

    /// Spawn the blink loop, replacing any running one.
    ///
    /// `make` receives the token the loop must stop on.
    pub fn spawn_blink<F>(&mut self, make: impl FnOnce(CancellationToken) -> F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.stop_blink();
        if self.is_cancelled() {
            return;
        }
        let cancel = self.cancel.child_token();
        let handle = tokio::spawn(make(cancel.clone()));
        self.blink = Some(BlinkTask { cancel, handle });
    }

    /// Stop the blink loop. Returns `true` if one was running.
    pub fn stop_blink(&mut self) -> bool {
        match self.blink.take() {
            Some(task) => {
                task.cancel.cancel();
                task.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_blinking(&self) -> bool {
        self.blink.is_some()
    }

    /// Cancel every timer of this session. Idempotent.
    ///
    /// Tasks are aborted, not just signalled, so none of them runs again.
    pub fn cancel(&mut self) {
        // Invalidate first so anything still in flight is dropped at the emitter.
        retire(&mut lock_live(&self.live), self.id);
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.stop_blink();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        debug!(session = %self.id, "session cancelled");
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Owns the single live session and the event channel.
#[derive(Debug)]
pub struct SessionManager {
    sink: EventSink,
    live: LiveCell,
    next_id: u64,
    current: Option<SessionHandle>,
}

impl SessionManager {
    pub fn new(tx: mpsc::UnboundedSender<LipSyncEvent>) -> Self {
        let live = Arc::new(Mutex::new(NO_SESSION));
        Self {
            sink: EventSink {
                tx,
                live: Arc::clone(&live),
            },
            live,
            next_id: 1,
            current: None,
        }
    }

    pub fn sink(&self) -> &EventSink {
        &self.sink
    }

    /// Start a new session, superseding the current one.
    ///
    /// The previous session is cancelled and invalidated before the new id
    /// becomes live.
    pub fn start_session(&mut self) -> &mut SessionHandle {
        self.end_current(EndReason::Superseded);

        let id = SessionId(self.next_id);
        self.next_id += 1;
        *lock_live(&self.live) = id.0;
        info!(session = %id, "session started");

        self.current.insert(SessionHandle::new(id, Arc::clone(&self.live)))
    }

    /// Id of the live session, if any.
    pub fn current_id(&self) -> Option<SessionId> {
        self.current
            .as_ref()
            .filter(|h| !h.is_cancelled())
            .map(SessionHandle::id)
    }

    /// The live session's handle.
    pub fn current_mut(&mut self) -> Option<&mut SessionHandle> {
        self.current.as_mut().filter(|h| !h.is_cancelled())
    }

    pub fn is_live(&self, id: SessionId) -> bool {
        *lock_live(&self.live) == id.0
    }

    /// End session `id` if it is still the live one.
    ///
    /// Returns `false` (and does nothing) for a stale id.
    pub fn end_session(&mut self, id: SessionId, reason: EndReason) -> bool {
        if self.current_id() != Some(id) {
            debug!(session = %id, ?reason, "ignoring end for stale session");
            return false;
        }
        self.end_current(reason).is_some()
    }

    /// End whatever session is live.
    ///
    /// Except when superseded, the renderer is sent a final rest mouth and
    /// open eyes before the end marker.
    pub fn end_current(&mut self, reason: EndReason) -> Option<SessionId> {
        let mut handle = self.current.take()?;
        let id = handle.id();
        if handle.is_cancelled() {
            return None;
        }

        {
            // Retire the id and queue the final events in one critical
            // section: emitters either sent before it or see a stale id.
            let mut live = lock_live(&self.live);
            retire(&mut live, id);
            if reason != EndReason::Superseded {
                self.sink.send_unguarded(LipSyncEvent::Viseme {
                    session: id,
                    viseme: Viseme::Rest,
                });
                self.sink.send_unguarded(LipSyncEvent::Eyes {
                    session: id,
                    open: true,
                });
            }
            self.sink.send_unguarded(LipSyncEvent::SessionEnded {
                session: id,
                reason,
            });
        }
        handle.cancel();
        info!(session = %id, ?reason, "session ended");
        Some(id)
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(mut handle) = self.current.take() {
            handle.cancel();
        }
    }
}
