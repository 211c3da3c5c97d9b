//! Testing utilities for the Cadastre workspace
//!
//! Shared test doubles and fixtures: in-memory repository and store, a
//! scripted authority, recording listener and importer.

#![allow(missing_docs)]

use cadastre_actions::{
    ActionConfig, ActionEnvironment, ActionId, ActionListener, ActionRequest, ActionStatus,
    AuthorityClient, IntervalPoller, LogOutcome, PendingActionRecord, PendingActionStore,
    ResultDocument, StoreError, Ticket, TransportError, UpdateSource, VersionImporter,
};
use cadastre_core::{
    Catalogue, CatalogueId, CatalogueRegistry, CatalogueRepository, RepositoryError, Version,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory catalogue repository.
#[derive(Default)]
pub struct InMemoryRepository {
    saved: Mutex<HashMap<CatalogueId, Catalogue>>,
    save_count: AtomicU64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self, id: CatalogueId) -> Option<Catalogue> {
        self.saved.lock().get(&id).cloned()
    }

    pub fn save_count(&self) -> u64 {
        self.save_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CatalogueRepository for InMemoryRepository {
    async fn load_all(&self) -> Result<Vec<Catalogue>, RepositoryError> {
        Ok(self.saved.lock().values().cloned().collect())
    }

    async fn save(&self, catalogue: &Catalogue) -> Result<(), RepositoryError> {
        self.save_count.fetch_add(1, Ordering::SeqCst);
        self.saved.lock().insert(catalogue.id, catalogue.clone());
        Ok(())
    }
}

/// In-memory pending-action store tracking deletions.
#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<HashMap<ActionId, PendingActionRecord>>,
    deletes: Mutex<HashMap<ActionId, u32>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: ActionId) -> bool {
        self.rows.lock().contains_key(&id)
    }

    pub fn record(&self, id: ActionId) -> Option<PendingActionRecord> {
        self.rows.lock().get(&id).cloned()
    }

    pub fn records(&self) -> Vec<PendingActionRecord> {
        self.rows.lock().values().cloned().collect()
    }

    /// Successful deletions seen for this id.
    pub fn delete_count(&self, id: ActionId) -> u32 {
        self.deletes.lock().get(&id).copied().unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl PendingActionStore for InMemoryStore {
    async fn insert(&self, record: &PendingActionRecord) -> Result<(), StoreError> {
        self.rows.lock().insert(record.id, record.clone());
        Ok(())
    }

    async fn update(&self, record: &PendingActionRecord) -> Result<(), StoreError> {
        let mut rows = self.rows.lock();
        if !rows.contains_key(&record.id) {
            return Err(StoreError::NotFound(record.id.to_string()));
        }
        rows.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete(&self, id: ActionId) -> Result<(), StoreError> {
        if self.rows.lock().remove(&id).is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        *self.deletes.lock().entry(id).or_insert(0) += 1;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<PendingActionRecord>, StoreError> {
        Ok(self.rows.lock().values().cloned().collect())
    }
}

struct Script {
    empty_probes: u32,
    probes_seen: u32,
    document: Option<ResultDocument>,
}

/// Scripted authority: tickets are handed out in order, and each ticket
/// answers its probes according to the next queued script.
///
/// With no script queued a ticket stays silent forever, which is how the
/// busy-authority scenarios are driven.
#[derive(Default)]
pub struct ScriptedAuthority {
    next_ticket: AtomicU64,
    queue: Mutex<VecDeque<Script>>,
    scripts: Mutex<HashMap<Ticket, Script>>,
    requests: Mutex<Vec<ActionRequest>>,
}

impl ScriptedAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next submitted ticket answers its first probe with `document`.
    pub fn enqueue_response(&self, document: ResultDocument) {
        self.enqueue_delayed_response(0, document);
    }

    /// The next submitted ticket stays empty for `empty_probes` probes,
    /// then answers with `document`.
    pub fn enqueue_delayed_response(&self, empty_probes: u32, document: ResultDocument) {
        self.queue.lock().push_back(Script {
            empty_probes,
            probes_seen: 0,
            document: Some(document),
        });
    }

    /// The next submitted ticket never answers.
    pub fn enqueue_silence(&self) {
        self.queue.lock().push_back(Script {
            empty_probes: 0,
            probes_seen: 0,
            document: None,
        });
    }

    /// Requests submitted so far, in order.
    pub fn requests(&self) -> Vec<ActionRequest> {
        self.requests.lock().clone()
    }

    /// Make a late answer available for an already-issued ticket.
    pub fn answer_now(&self, ticket: &Ticket, document: ResultDocument) {
        self.scripts.lock().insert(
            ticket.clone(),
            Script {
                empty_probes: 0,
                probes_seen: 0,
                document: Some(document),
            },
        );
    }
}

#[async_trait::async_trait]
impl AuthorityClient for ScriptedAuthority {
    async fn submit(&self, request: ActionRequest) -> Result<Ticket, TransportError> {
        self.requests.lock().push(request);
        let n = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        let ticket = Ticket::new(format!("T-{n}"));
        if let Some(script) = self.queue.lock().pop_front() {
            self.scripts.lock().insert(ticket.clone(), script);
        }
        Ok(ticket)
    }

    async fn fetch_result(&self, ticket: &Ticket) -> Result<Option<ResultDocument>, TransportError> {
        let mut scripts = self.scripts.lock();
        let Some(script) = scripts.get_mut(ticket) else {
            return Ok(None);
        };
        if script.probes_seen < script.empty_probes {
            script.probes_seen += 1;
            return Ok(None);
        }
        Ok(script.document.clone())
    }
}

/// Version importer that records calls and can be switched to fail.
#[derive(Default)]
pub struct RecordingImporter {
    calls: Mutex<Vec<(CatalogueId, String)>>,
    failing: AtomicBool,
}

impl RecordingImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(CatalogueId, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl VersionImporter for RecordingImporter {
    async fn import_latest(
        &self,
        catalogue_id: CatalogueId,
        version: &Version,
    ) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Network("import endpoint unreachable".into()));
        }
        self.calls.lock().push((catalogue_id, version.to_string()));
        Ok(())
    }
}

/// Update source serving a fixed byte blob, switchable to fail.
pub struct StaticUpdateSource {
    bytes: Vec<u8>,
    failing: AtomicBool,
}

impl StaticUpdateSource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Default for StaticUpdateSource {
    fn default() -> Self {
        Self::new(b"<updates/>".to_vec())
    }
}

#[async_trait::async_trait]
impl UpdateSource for StaticUpdateSource {
    async fn fetch_updates(&self, _catalogue_id: CatalogueId) -> Result<Vec<u8>, TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Network("updates file unavailable".into()));
        }
        Ok(self.bytes.clone())
    }
}

/// Everything a listener reported, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
    Prepared,
    Sent(ActionId),
    Status(ActionId, ActionStatus),
    Response(ActionId, LogOutcome),
}

/// Listener capturing every notification.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ListenerEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().clone()
    }

    /// Statuses reported for one action, in order.
    pub fn statuses(&self, id: ActionId) -> Vec<ActionStatus> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ListenerEvent::Status(event_id, status) if *event_id == id => Some(*status),
                _ => None,
            })
            .collect()
    }

    /// Outcomes reported for one action.
    pub fn outcomes(&self, id: ActionId) -> Vec<LogOutcome> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ListenerEvent::Response(event_id, outcome) if *event_id == id => Some(*outcome),
                _ => None,
            })
            .collect()
    }
}

impl ActionListener for RecordingListener {
    fn request_prepared(&self) {
        self.events.lock().push(ListenerEvent::Prepared);
    }

    fn request_sent(&self, action: &PendingActionRecord, _ticket: &Ticket) {
        self.events.lock().push(ListenerEvent::Sent(action.id));
    }

    fn status_changed(&self, action: &PendingActionRecord, status: ActionStatus) {
        self.events
            .lock()
            .push(ListenerEvent::Status(action.id, status));
    }

    fn response_received(&self, action: &PendingActionRecord, outcome: LogOutcome) {
        self.events
            .lock()
            .push(ListenerEvent::Response(action.id, outcome));
    }
}

/// The full test fixture: every collaborator plus the assembled
/// environment.
pub struct TestEnv {
    pub registry: Arc<CatalogueRegistry>,
    pub repository: Arc<InMemoryRepository>,
    pub store: Arc<InMemoryStore>,
    pub authority: Arc<ScriptedAuthority>,
    pub importer: Arc<RecordingImporter>,
    pub updates: Arc<StaticUpdateSource>,
    pub listener: Arc<RecordingListener>,
    pub env: Arc<ActionEnvironment>,
}

/// Millisecond-scale schedules so protocol tests finish quickly.
pub fn fast_config() -> ActionConfig {
    ActionConfig::new()
        .with_high_schedule(Duration::from_millis(2), 3)
        .with_low_interval(Duration::from_millis(5))
}

pub fn test_env() -> TestEnv {
    test_env_with(fast_config())
}

pub fn test_env_with(config: ActionConfig) -> TestEnv {
    let repository = Arc::new(InMemoryRepository::new());
    let registry = Arc::new(CatalogueRegistry::new(repository.clone()));
    let store = Arc::new(InMemoryStore::new());
    let authority = Arc::new(ScriptedAuthority::new());
    let importer = Arc::new(RecordingImporter::new());
    let updates = Arc::new(StaticUpdateSource::default());
    let listener = Arc::new(RecordingListener::new());
    let env = Arc::new(ActionEnvironment {
        registry: registry.clone(),
        store: store.clone(),
        poller: Arc::new(IntervalPoller::new(authority.clone())),
        authority: authority.clone(),
        importer: importer.clone(),
        updates: updates.clone(),
        listener: listener.clone(),
        config,
    });
    TestEnv {
        registry,
        repository,
        store,
        authority,
        importer,
        updates,
        listener,
        env,
    }
}

/// Register a fresh remote catalogue and return its id.
pub fn seed_catalogue(env: &TestEnv, code: &str, version: &str) -> CatalogueId {
    let catalogue = Catalogue::new(code, Version::parse(version));
    let id = catalogue.id;
    env.registry.insert(catalogue);
    id
}

/// Register a local-only catalogue and return its id.
pub fn seed_local_catalogue(env: &TestEnv, code: &str) -> CatalogueId {
    let catalogue = Catalogue::new(code, Version::parse("1.0")).local();
    let id = catalogue.id;
    env.registry.insert(catalogue);
    id
}
