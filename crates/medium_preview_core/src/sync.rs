//! Keeping the preview panel in sync with the host document.
//!
//! The host raises [`Trigger`]s on a [`TriggerBus`]; an open [`PreviewView`]
//! re-renders the preview for every trigger from a fresh document snapshot.
//! Everything here runs on the host's single event thread.

use crate::clipboard::{
    ClipboardInjector, ClipboardPayload, CopyOutcome, Notifier, NOTHING_TO_COPY_NOTICE,
};
use crate::config::PanelConfig;
use crate::document::DocumentSource;
use crate::render::rules::escape_html;
use crate::render::{to_html, RenderMode};
use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

/// Element id of the copy button inside the panel header.
pub const COPY_BUTTON_ID: &str = "medium-preview-copy";

const HEADER_STYLE: &str =
    "display: flex; justify-content: space-between; align-items: center; padding: 10px;";
const BODY_STYLE: &str = "padding: 0 10px 10px 10px; user-select: text; -webkit-user-select: text;";

/// Host notification that may change what the panel should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    PanelOpened,
    FocusChanged,
    DocumentEdited,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Idle,
    Rendering,
}

/// The on-screen container the preview is written into.
pub trait PreviewPanel {
    fn set_inner_html(&mut self, html: &str);
    fn inner_html(&self) -> &str;
}

/// Full panel markup: header with title and copy button, then the preview.
pub fn panel_html(config: &PanelConfig, preview_html: &str) -> String {
    format!(
        "<div class=\"medium-preview-header\" style=\"{HEADER_STYLE}\">\
         <h4 style=\"margin: 0;\">{}</h4>\
         <button id=\"{COPY_BUTTON_ID}\" class=\"mod-cta\">Copy to Medium</button>\
         </div>\n\
         <div class=\"medium-preview\" style=\"{BODY_STYLE}\">{preview_html}</div>\n",
        escape_html(&config.title)
    )
}

pub fn placeholder_html(config: &PanelConfig) -> String {
    format!(
        "<div class=\"medium-preview-placeholder\">{}</div>\n",
        escape_html(&config.placeholder)
    )
}

/// Renders the latest document snapshot into the panel.
pub struct PreviewController<D, P> {
    source: D,
    panel: P,
    config: PanelConfig,
    state: SyncState,
    /// Last snapshot that made it into the panel.
    last_snapshot: Option<String>,
}

impl<D: DocumentSource, P: PreviewPanel> PreviewController<D, P> {
    pub fn new(source: D, panel: P, config: PanelConfig) -> Self {
        Self {
            source,
            panel,
            config,
            state: SyncState::Idle,
            last_snapshot: None,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    pub fn has_rendered(&self) -> bool {
        self.last_snapshot.is_some()
    }

    /// Re-render the panel for `trigger`.
    ///
    /// With no compatible document focused the panel keeps what it shows,
    /// unless nothing was ever rendered, then it shows the placeholder.
    pub fn handle(&mut self, trigger: Trigger) {
        self.state = SyncState::Rendering;

        match self.source.current_text() {
            Some(text) => {
                let preview = to_html(&text, RenderMode::Preview);
                self.panel.set_inner_html(&panel_html(&self.config, &preview));
                tracing::debug!(?trigger, bytes = text.len(), "Refreshed preview");
                self.last_snapshot = Some(text);
            }
            None if self.last_snapshot.is_none() && self.panel.inner_html().is_empty() => {
                tracing::debug!(?trigger, "No document to preview, showing placeholder");
                self.panel.set_inner_html(&placeholder_html(&self.config));
            }
            None => {
                tracing::trace!(?trigger, "No document focused, keeping panel content");
            }
        }

        self.state = SyncState::Idle;
    }

    /// Clipboard payload rendered fresh from the latest snapshot.
    ///
    /// Uses the focused document if there is one, otherwise the last rendered
    /// snapshot. The Markdown source rides along as the plain-text alternative.
    pub fn clipboard_payload(&self) -> Option<ClipboardPayload> {
        let text = self
            .source
            .current_text()
            .or_else(|| self.last_snapshot.clone())?;
        let html = to_html(&text, RenderMode::Clipboard);
        Some(ClipboardPayload::html(html).with_alt_text(text))
    }
}

/// Handle returned by [`TriggerBus::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

pub type TriggerHandler = Box<dyn FnMut(Trigger)>;

/// Callback registry for host notifications.
#[derive(Default)]
pub struct TriggerBus {
    next_id: u64,
    handlers: Vec<(HandlerId, TriggerHandler)>,
}

impl TriggerBus {
    pub fn register(&mut self, handler: TriggerHandler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, handler));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn deregister(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    pub fn emit(&mut self, trigger: Trigger) {
        for (_, handler) in self.handlers.iter_mut() {
            handler(trigger);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Render `trigger`, coalescing triggers that arrive while a render runs.
fn dispatch<D: DocumentSource, P: PreviewPanel>(
    controller: &RefCell<PreviewController<D, P>>,
    pending: &Cell<bool>,
    trigger: Trigger,
) {
    let Ok(mut controller) = controller.try_borrow_mut() else {
        tracing::trace!(?trigger, "Render in flight, coalescing trigger");
        pending.set(true);
        return;
    };

    controller.handle(trigger);
    while pending.replace(false) {
        controller.handle(trigger);
    }
}

/// A preview panel attached to the host's notifications.
pub struct PreviewView<D, P> {
    controller: Rc<RefCell<PreviewController<D, P>>>,
    pending: Rc<Cell<bool>>,
    subscription: Option<HandlerId>,
}

impl<D, P> PreviewView<D, P>
where
    D: DocumentSource + 'static,
    P: PreviewPanel + 'static,
{
    pub fn new(controller: PreviewController<D, P>) -> Self {
        Self {
            controller: Rc::new(RefCell::new(controller)),
            pending: Rc::new(Cell::new(false)),
            subscription: None,
        }
    }

    /// Register for focus and edit notifications and render once.
    pub fn open(&mut self, bus: &mut TriggerBus) {
        if self.subscription.is_none() {
            let controller = self.controller.clone();
            let pending = self.pending.clone();
            let id = bus.register(Box::new(move |trigger| {
                dispatch(&controller, &pending, trigger)
            }));
            self.subscription = Some(id);
        }
        self.trigger(Trigger::PanelOpened);
    }

    /// Deregister from the bus. The panel keeps its content.
    pub fn close(&mut self, bus: &mut TriggerBus) {
        if let Some(id) = self.subscription.take() {
            bus.deregister(id);
        }
    }

    pub fn is_open(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn trigger(&self, trigger: Trigger) {
        dispatch(&self.controller, &self.pending, trigger);
    }

    pub fn controller(&self) -> Ref<'_, PreviewController<D, P>> {
        self.controller.borrow()
    }

    /// Copy the clipboard rendering of the latest snapshot.
    ///
    /// The panel is never touched: the clipboard HTML is rendered from source,
    /// not taken from the panel.
    pub async fn copy(
        &self,
        injector: &mut ClipboardInjector,
        notifier: &dyn Notifier,
    ) -> Option<CopyOutcome> {
        let payload = self.controller.borrow().clipboard_payload();
        let Some(payload) = payload else {
            notifier.notify(NOTHING_TO_COPY_NOTICE);
            return None;
        };
        Some(injector.copy(payload, notifier).await)
    }
}
