// Editing sessions. A session owns one document, its live preview surface and
// the last generated cover letter. All access goes through a tokio Mutex, which
// an export holds from start to finish.
//
// AI actions run without the lock. Each takes a ticket first; the result is
// applied only while the ticket is still current (no document replacement in
// between), while the field it writes has not been edited by hand since and,
// for entry descriptions, while the entry still exists.

pub mod handlers;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;
use uuid::Uuid;

use crate::export::surface::{PreviewSurface, Presentation};
use crate::models::document::Document;
use crate::models::edit::{Applied, Edit, EditError};
use crate::preview::{self, Debouncer, Viewport};
use crate::render::{self, Template};

/// Proof that a session's single AI slot is taken. Released on drop.
pub struct AiPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for AiPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Identifies the document an AI request was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    revision: u64,
}

/// The part of a document an AI result is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Summary,
    Entry(Uuid),
}

impl Field {
    fn touched_by(edit: &Edit) -> Option<Self> {
        match edit {
            Edit::SetSummary { .. } => Some(Field::Summary),
            Edit::UpdateEntry { id, .. } | Edit::RemoveEntry { id, .. } => Some(Field::Entry(*id)),
            _ => None,
        }
    }
}

pub struct Session {
    pub id: Uuid,
    document: Document,
    surface: PreviewSurface,
    cover_letter: Option<String>,
    viewport: Option<Viewport>,
    epoch: u64,
    revision: u64,
    touched: HashMap<Field, u64>,
}

impl Session {
    fn new(id: Uuid, document: Document, template: Template) -> Self {
        let document = document.normalized();
        let page = render::render(&document, template);
        Self {
            id,
            surface: PreviewSurface::new(page, template),
            document,
            cover_letter: None,
            viewport: None,
            epoch: 0,
            revision: 0,
            touched: HashMap::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn template(&self) -> Template {
        self.surface.template()
    }

    pub fn surface(&self) -> &PreviewSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut PreviewSurface {
        &mut self.surface
    }

    pub fn cover_letter(&self) -> Option<&str> {
        self.cover_letter.as_deref()
    }

    pub fn set_cover_letter(&mut self, letter: String) {
        self.cover_letter = Some(letter);
    }

    /// Mutates the document in place and re-renders from scratch. On error
    /// nothing is re-rendered.
    pub fn update<T, E>(
        &mut self,
        change: impl FnOnce(&mut Document) -> Result<T, E>,
    ) -> Result<T, E> {
        let out = change(&mut self.document)?;
        self.redraw();
        Ok(out)
    }

    /// Applies a client edit and remembers which field it touched.
    pub fn apply_edit(&mut self, edit: Edit) -> Result<Applied, EditError> {
        let field = Field::touched_by(&edit);
        let applied = self.update(|doc| edit.apply(doc))?;
        if let Some(field) = field {
            self.revision += 1;
            self.touched.insert(field, self.revision);
        }
        Ok(applied)
    }

    /// Swaps in a whole new document. Outstanding AI tickets go stale.
    pub fn replace_document(&mut self, document: Document) {
        self.document = document.normalized();
        self.epoch += 1;
        self.touched.clear();
        self.redraw();
    }

    pub fn switch_template(&mut self, template: Template) {
        let page = render::render(&self.document, template);
        self.surface.redraw(page, template);
        self.refit();
    }

    /// Remembers the client's viewport and fits the preview to it.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Presentation {
        self.viewport = Some(viewport);
        self.refit();
        self.surface.presentation()
    }

    /// Natural width and height of the current layout.
    pub fn natural_size(&self) -> (f32, f32) {
        (self.surface.page().width, self.surface.place().height)
    }

    fn refit(&mut self) {
        if let Some(viewport) = self.viewport {
            let (width, height) = self.natural_size();
            let current = self.surface.presentation();
            self.surface
                .set_presentation(preview::fit(width, height, viewport, current));
        }
    }

    pub fn ticket(&self) -> Ticket {
        Ticket {
            epoch: self.epoch,
            revision: self.revision,
        }
    }

    /// False once the document was replaced after `ticket` was taken.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.epoch == ticket.epoch
    }

    /// Like `is_current`, and `field` was not edited by hand since `ticket`.
    pub fn is_untouched(&self, ticket: Ticket, field: Field) -> bool {
        self.is_current(ticket)
            && self
                .touched
                .get(&field)
                .map_or(true, |&revision| revision <= ticket.revision)
    }

    fn redraw(&mut self) {
        let template = self.surface.template();
        let page = render::render(&self.document, template);
        self.surface.redraw(page, template);
        self.refit();
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            document: self.document.clone(),
            template: self.template(),
            presentation: self.surface.presentation(),
            has_cover_letter: self.cover_letter.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub document: Document,
    pub template: Template,
    pub presentation: Presentation,
    pub has_cover_letter: bool,
}

/// A session plus the pieces that must be reachable without its lock.
pub struct SessionHandle {
    pub state: Mutex<Session>,
    pub debouncer: Debouncer,
    ai_busy: Arc<AtomicBool>,
}

impl SessionHandle {
    /// Claims the AI slot, or `None` while another action is pending.
    pub fn try_begin_ai(&self) -> Option<AiPermit> {
        self.ai_busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| AiPermit {
                busy: Arc::clone(&self.ai_busy),
            })
    }
}

/// Sessions untouched for this long are dropped by the sweeper.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

struct Slot {
    handle: Arc<SessionHandle>,
    last_touched: Instant,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<StdMutex<HashMap<Uuid, Slot>>>,
    debounce: Duration,
}

impl SessionStore {
    pub fn new(debounce: Duration) -> Self {
        Self {
            sessions: Arc::new(StdMutex::new(HashMap::new())),
            debounce,
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Uuid, Slot>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create(&self, document: Document, template: Template) -> Arc<SessionHandle> {
        let id = Uuid::new_v4();
        let handle = Arc::new(SessionHandle {
            state: Mutex::new(Session::new(id, document, template)),
            debouncer: Debouncer::new(self.debounce),
            ai_busy: Arc::new(AtomicBool::new(false)),
        });
        self.slots().insert(
            id,
            Slot {
                handle: Arc::clone(&handle),
                last_touched: Instant::now(),
            },
        );
        handle
    }

    /// Looks a session up and marks it as used.
    pub fn get(&self, id: Uuid) -> Option<Arc<SessionHandle>> {
        let mut slots = self.slots();
        let slot = slots.get_mut(&id)?;
        slot.last_touched = Instant::now();
        Some(Arc::clone(&slot.handle))
    }

    /// Forgets a session. Requests already holding it finish normally.
    pub fn remove(&self, id: Uuid) -> bool {
        self.slots().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    /// Drops sessions idle for longer than `ttl`. A session some request
    /// still holds is kept. Returns how many were dropped.
    pub fn sweep_idle(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut slots = self.slots();
        let before = slots.len();
        slots.retain(|_, slot| {
            Arc::strong_count(&slot.handle) > 1 || now.duration_since(slot.last_touched) <= ttl
        });
        before - slots.len()
    }

    /// Sweeps idle sessions in the background for the life of the process.
    pub fn spawn_sweeper(&self, ttl: Duration) -> JoinHandle<()> {
        let store = self.clone();
        let period = (ttl / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let removed = store.sweep_idle(ttl);
                if removed > 0 {
                    info!(removed, remaining = store.len(), "idle sessions expired");
                }
            }
        })
    }
}
