use std::sync::Arc;

use shipnote_core::automation::{Automation, EventSource, SubscriberDirectory};
use shipnote_core::config::BoardConfig;
use shipnote_core::dispatch::Mailer;
use shipnote_core::store::AutomationStore;
use shipnote_core::template::DefaultTemplateRegistry;

/// Shared application state passed to all route handlers.
///
/// The event and subscriber stores belong to the board's CRUD layer; the
/// embedding application injects its implementations here along with the
/// mail transport.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AutomationStore>,
    pub registry: Arc<DefaultTemplateRegistry>,
    pub automation: Arc<Automation>,
    pub config: Arc<BoardConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<AutomationStore>,
        config: BoardConfig,
        events: Arc<dyn EventSource>,
        subscribers: Arc<dyn SubscriberDirectory>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let registry = DefaultTemplateRegistry::standard();
        let automation = Automation::new(
            store.clone(),
            registry.clone(),
            events,
            subscribers,
            mailer,
            config.branding.clone(),
        );
        Self {
            store,
            registry: Arc::new(registry),
            automation: Arc::new(automation),
            config: Arc::new(config),
        }
    }
}
