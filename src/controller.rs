use crate::config::ManipulatorConfig;
use crate::drag::{DragOptions, DragSession};
use crate::error::{ManipulatorError, ManipulatorResult};
use crate::geometry::Point;
use crate::guides::Debouncer;
use crate::host::Host;
use crate::resize::{ResizeOptions, ResizeSession};
use std::time::{Duration, Instant};
use ulid::Ulid;

/// Handle returned when a session starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerInput {
    /// Viewport coordinates
    pub position: Point,
    pub shift: bool,
}

impl PointerInput {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            shift: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

/// Result of a finished gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureOutcome {
    pub session: SessionId,
    pub component: Ulid,
    pub moved: bool,
    pub cancelled: bool,
}

#[derive(Debug)]
pub enum ActiveSession {
    Drag(DragSession),
    Resize(ResizeSession),
}

impl ActiveSession {
    pub fn component(&self) -> Ulid {
        match self {
            ActiveSession::Drag(drag) => drag.component(),
            ActiveSession::Resize(resize) => resize.component(),
        }
    }
}

/// Routes pointer events to at most one drag or resize session; the host is
/// passed in per call
#[derive(Debug)]
pub struct Manipulator {
    config: ManipulatorConfig,
    active: Option<(SessionId, ActiveSession)>,
    next_id: u64,
    /// Last id handed out that has since finished
    finished: Option<SessionId>,
    refresh: Debouncer,
}

impl Manipulator {
    pub fn new(config: ManipulatorConfig) -> Self {
        let delay = Duration::from_millis(config.guides.refresh_debounce_ms);
        Self {
            config,
            active: None,
            next_id: 1,
            finished: None,
            refresh: Debouncer::new(delay),
        }
    }

    pub fn config(&self) -> &ManipulatorConfig {
        &self.config
    }

    fn ensure_idle(&self) -> ManipulatorResult<()> {
        if self.active.is_some() {
            return Err(ManipulatorError::SessionActive);
        }
        Ok(())
    }

    fn activate(&mut self, session: ActiveSession) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        self.refresh.reset();
        self.active = Some((id, session));
        id
    }

    #[tracing::instrument(skip(self, host))]
    pub fn start_drag<H: Host + ?Sized>(&mut self, host: &mut H, opts: DragOptions) -> ManipulatorResult<SessionId> {
        self.ensure_idle()?;
        let session = DragSession::start(host, opts, &self.config)?;
        Ok(self.activate(ActiveSession::Drag(session)))
    }

    #[tracing::instrument(skip(self, host))]
    pub fn start_resize<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        opts: ResizeOptions,
    ) -> ManipulatorResult<SessionId> {
        self.ensure_idle()?;
        let session = ResizeSession::start(host, opts, &self.config)?;
        Ok(self.activate(ActiveSession::Resize(session)))
    }

    pub fn pointer_move<H: Host + ?Sized>(&mut self, host: &mut H, input: PointerInput) -> ManipulatorResult<()> {
        let (_, session) = self.active.as_mut().ok_or(ManipulatorError::NoActiveSession)?;
        match session {
            ActiveSession::Drag(drag) => {
                drag.on_move(host, input.position, input.shift);
            }
            ActiveSession::Resize(resize) => {
                resize.on_move(host, input.position, input.shift);
            }
        }
        Ok(())
    }

    /// Terminal commit of the active session
    #[tracing::instrument(skip(self, host))]
    pub fn pointer_up<H: Host + ?Sized>(&mut self, host: &mut H) -> ManipulatorResult<GestureOutcome> {
        let (id, mut session) = self.active.take().ok_or(ManipulatorError::NoActiveSession)?;
        let component = session.component();
        let moved = match &mut session {
            ActiveSession::Drag(drag) => drag.on_end(host),
            ActiveSession::Resize(resize) => resize.on_end(host),
        };
        Ok(self.finish(id, component, moved, false))
    }

    /// Abort the active session, restoring the style it found
    #[tracing::instrument(skip(self, host))]
    pub fn cancel<H: Host + ?Sized>(&mut self, host: &mut H) -> ManipulatorResult<GestureOutcome> {
        let (id, mut session) = self.active.take().ok_or(ManipulatorError::NoActiveSession)?;
        let component = session.component();
        let moved = match &mut session {
            ActiveSession::Drag(drag) => {
                drag.cancel(host);
                drag.moved()
            }
            ActiveSession::Resize(resize) => {
                resize.cancel(host);
                resize.moved()
            }
        };
        Ok(self.finish(id, component, moved, true))
    }

    /// Stop a session by handle. The active one commits as on pointer-up;
    /// a handle that already finished yields `None`.
    pub fn stop<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        handle: SessionId,
    ) -> ManipulatorResult<Option<GestureOutcome>> {
        let active = self.active.as_ref().map(|(id, _)| *id);
        match active {
            Some(id) if id == handle => self.pointer_up(host).map(Some),
            _ if handle.0 > 0 && handle.0 < self.next_id => Ok(None),
            _ => Err(ManipulatorError::UnknownSession(handle)),
        }
    }

    fn finish(&mut self, session: SessionId, component: Ulid, moved: bool, cancelled: bool) -> GestureOutcome {
        self.refresh.reset();
        self.finished = Some(session);
        tracing::debug!(session = session.0, %component, moved, cancelled, "session finished");
        GestureOutcome {
            session,
            component,
            moved,
            cancelled,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_session(&self) -> Option<(SessionId, &ActiveSession)> {
        self.active.as_ref().map(|(id, session)| (*id, session))
    }

    pub fn last_finished(&self) -> Option<SessionId> {
        self.finished
    }

    /// Record a canvas scroll or resize; guides refresh once it settles
    pub fn notify_canvas_changed(&mut self, now: Instant) {
        if self.active.is_some() {
            self.refresh.signal(now);
        }
    }

    /// Drive the guide refresh debounce; returns true when guides were refreshed
    pub fn poll<H: Host + ?Sized>(&mut self, host: &H, now: Instant) -> bool {
        if !self.refresh.check_timeout(now) {
            return false;
        }
        match self.active.as_mut() {
            Some((_, ActiveSession::Drag(drag))) => {
                drag.refresh_guides(host);
                true
            }
            _ => false,
        }
    }
}

impl Default for Manipulator {
    fn default() -> Self {
        Self::new(ManipulatorConfig::default())
    }
}
