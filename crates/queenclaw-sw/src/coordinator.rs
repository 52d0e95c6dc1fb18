//! The offline cache coordinator.
//!
//! One long-lived instance per origin. The embedder drives it through
//! [`OfflineCoordinator::dispatch`], an explicit table mapping each worker
//! event kind to its handler. Handlers whose work must outlive the
//! invocation hand back a [`PendingWork`] task handle instead of relying on
//! implicit lifetime extension.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use queenclaw_common::{QueenClawError, Result};
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::cache::{Cache, CacheStorage};
use crate::clients::WindowClients;
use crate::config::SwConfig;
use crate::net::{FetchRequest, FetchResponse, RemoteFetch};
use crate::push::{NotificationClick, NotificationHost, PushPayload};

/// Control token an application window posts to force activation.
pub const SKIP_WAITING: &str = "skipWaiting";

/// Coordinator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Initial state.
    Parsed,
    /// Baseline installation running.
    Installing,
    /// Installed, waiting for activation.
    Installed,
    /// Generation pruning and client claim running.
    Activating,
    /// Active and intercepting traffic.
    Activated,
    /// Install failed; this version never becomes current.
    Redundant,
}

/// Worker events the coordinator dispatches on.
#[derive(Debug)]
pub enum WorkerEvent {
    /// Install the static asset baseline.
    Install,
    /// Prune stale generations and claim open windows.
    Activate,
    /// An intercepted network request.
    Fetch(FetchRequest),
    /// An inbound push message, possibly without a payload.
    Push(Option<Bytes>),
    /// A user click on a displayed notification.
    NotificationClick(NotificationClick),
    /// A message posted from an application window.
    Message(Value),
}

/// Handle to work a handler detached past its own invocation.
///
/// Dropping the handle never cancels the work; it only gives up the ability
/// to observe settlement.
#[derive(Debug)]
pub struct PendingWork(JoinHandle<()>);

impl PendingWork {
    fn new(handle: JoinHandle<()>) -> Self {
        Self(handle)
    }

    /// Wait until the detached work has settled, successfully or not.
    pub async fn settled(self) {
        let _ = self.0.await;
    }

    /// Whether the detached work has already settled.
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

/// Decision for one intercepted request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Request does not qualify; default handling applies.
    Passthrough,
    /// Response decided by the policy, plus any detached revalidation.
    Respond {
        response: FetchResponse,
        revalidation: Option<PendingWork>,
    },
}

/// Result of dispatching one worker event.
#[derive(Debug)]
pub enum EventOutcome {
    /// Install completed; the generation is populated.
    Installed,
    /// Activation completed; this version is current.
    Activated,
    /// Fetch decision.
    Fetch(FetchOutcome),
    /// The handler detached work the event must stay alive for.
    Extended(PendingWork),
    /// The event required no action.
    Ignored,
}

/// Lifecycle events observed by the embedder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwEvent {
    /// The lifecycle state changed.
    StateChanged { from: WorkerState, to: WorkerState },
    /// Activation claimed open uncontrolled windows.
    ClientsClaimed { count: usize },
}

/// The offline cache coordinator.
pub struct OfflineCoordinator {
    config: SwConfig,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    caches: Arc<RwLock<CacheStorage>>,
    clients: Arc<RwLock<WindowClients>>,
    network: Arc<dyn RemoteFetch>,
    notifications: Arc<dyn NotificationHost>,
    event_tx: mpsc::UnboundedSender<SwEvent>,
}

impl OfflineCoordinator {
    /// Create a coordinator and the lifecycle event receiver.
    pub fn new(
        config: SwConfig,
        network: Arc<dyn RemoteFetch>,
        notifications: Arc<dyn NotificationHost>,
    ) -> (Self, mpsc::UnboundedReceiver<SwEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        (
            Self {
                config,
                state: RwLock::new(WorkerState::Parsed),
                skip_waiting: AtomicBool::new(false),
                caches: Arc::new(RwLock::new(CacheStorage::new())),
                clients: Arc::new(RwLock::new(WindowClients::new())),
                network,
                notifications,
                event_tx,
            },
            event_rx,
        )
    }

    /// The coordinator's configuration.
    pub fn config(&self) -> &SwConfig {
        &self.config
    }

    /// Shared cache storage.
    pub fn caches(&self) -> Arc<RwLock<CacheStorage>> {
        Arc::clone(&self.caches)
    }

    /// Shared window registry.
    pub fn clients(&self) -> Arc<RwLock<WindowClients>> {
        Arc::clone(&self.clients)
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Whether install asked to skip the waiting hold-back.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Dispatch one worker event to its handler.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome> {
        match event {
            WorkerEvent::Install => self.on_install().await.map(|_| EventOutcome::Installed),
            WorkerEvent::Activate => self.on_activate().await.map(|_| EventOutcome::Activated),
            WorkerEvent::Fetch(request) => Ok(EventOutcome::Fetch(self.on_fetch(request).await)),
            WorkerEvent::Push(payload) => Ok(match self.on_push(payload) {
                Some(work) => EventOutcome::Extended(work),
                None => EventOutcome::Ignored,
            }),
            WorkerEvent::NotificationClick(click) => {
                Ok(EventOutcome::Extended(self.on_notification_click(click)))
            }
            WorkerEvent::Message(value) => self.on_message(value).await,
        }
    }

    /// Install: populate the current generation with the asset baseline.
    ///
    /// Any baseline fetch failure is fatal to this install attempt; no
    /// partial generation is promoted.
    async fn on_install(&self) -> Result<()> {
        self.transition(WorkerState::Installing).await;

        match self.stage_baseline().await {
            Ok(staged) => {
                let entries = staged.len();
                self.caches.write().await.insert(staged);
                self.skip_waiting.store(true, Ordering::SeqCst);
                self.transition(WorkerState::Installed).await;
                info!(
                    generation = %self.config.cache_version,
                    entries,
                    "baseline installed"
                );
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "install failed; generation not promoted");
                self.transition(WorkerState::Redundant).await;
                Err(err)
            }
        }
    }

    /// Fetch every baseline asset into a staged generation.
    async fn stage_baseline(&self) -> Result<Cache> {
        let mut staged = Cache::new(&self.config.cache_version);

        for path in &self.config.precache {
            let url = self.config.resolve(path)?;
            let request = FetchRequest::get(url);
            let response = self.network.fetch(&request).await?;
            if !response.is_success() {
                return Err(QueenClawError::network(format!(
                    "baseline asset {path} returned {}",
                    response.status
                )));
            }
            staged.put(request.key(), response.to_snapshot());
        }

        Ok(staged)
    }

    /// Activate: delete stale generations, then claim open windows.
    async fn on_activate(&self) -> Result<()> {
        self.transition(WorkerState::Activating).await;

        let current = self.config.cache_version.clone();
        {
            let mut caches = self.caches.write().await;
            for tag in caches.keys() {
                if tag != current {
                    // Best effort; a failed deletion never blocks activation.
                    if caches.delete(&tag) {
                        debug!(generation = %tag, "stale generation deleted");
                    } else {
                        warn!(generation = %tag, "stale generation already gone");
                    }
                }
            }
        }

        let count = self.clients.write().await.claim();
        let _ = self.event_tx.send(SwEvent::ClientsClaimed { count });

        self.transition(WorkerState::Activated).await;
        info!(generation = %current, claimed = count, "activated");
        Ok(())
    }

    /// Fetch: serve cached, revalidating in the background, or go to the
    /// network with the synthesized offline fallback as the terminal case.
    async fn on_fetch(&self, request: FetchRequest) -> FetchOutcome {
        if request.method != Method::GET {
            trace!(method = %request.method, url = %request.url, "non-GET passthrough");
            return FetchOutcome::Passthrough;
        }
        if self.config.bypasses(&request.url) {
            trace!(url = %request.url, "bypass marker passthrough");
            return FetchOutcome::Passthrough;
        }

        let key = request.key();
        let cached = self
            .caches
            .read()
            .await
            .get(&self.config.cache_version)
            .and_then(|cache| cache.lookup(&key));

        match cached {
            Some(snapshot) => {
                trace!(url = %request.url, "cache hit");
                let response = FetchResponse::from_snapshot(&snapshot);
                let revalidation = self.spawn_revalidation(request);
                FetchOutcome::Respond {
                    response,
                    revalidation: Some(revalidation),
                }
            }
            None => match self.network.fetch(&request).await {
                Ok(response) => {
                    if response.is_cacheable() {
                        self.caches
                            .write()
                            .await
                            .open(&self.config.cache_version)
                            .put(key, response.to_snapshot());
                    }
                    FetchOutcome::Respond {
                        response,
                        revalidation: None,
                    }
                }
                Err(err) => {
                    debug!(url = %request.url, error = %err, "miss with network down; offline fallback");
                    FetchOutcome::Respond {
                        response: FetchResponse::offline_fallback(&self.config.offline_body),
                        revalidation: None,
                    }
                }
            },
        }
    }

    /// Refresh a cached entry in the background.
    ///
    /// The caller already holds a response, so this task's result is
    /// discarded except for the overwrite-on-success write; failures are
    /// deliberately swallowed and the existing entry stays authoritative.
    /// Overlapping revalidations of the same key are last-writer-wins.
    fn spawn_revalidation(&self, request: FetchRequest) -> PendingWork {
        let network = Arc::clone(&self.network);
        let caches = Arc::clone(&self.caches);
        let generation = self.config.cache_version.clone();

        PendingWork::new(tokio::spawn(async move {
            let key = request.key();
            match network.fetch(&request).await {
                Ok(fresh) if fresh.is_cacheable() => {
                    caches
                        .write()
                        .await
                        .open(&generation)
                        .put(key, fresh.to_snapshot());
                    trace!(url = %request.url, "revalidation refreshed entry");
                }
                Ok(fresh) => {
                    trace!(url = %request.url, status = %fresh.status, "revalidation not cacheable; entry kept");
                }
                Err(err) => {
                    debug!(url = %request.url, error = %err, "revalidation failed; entry kept");
                }
            }
        }))
    }

    /// Push: parse the payload and display a notification.
    ///
    /// A missing payload is a no-op; an unparseable one is contained here
    /// and never crashes the coordinator.
    fn on_push(&self, payload: Option<Bytes>) -> Option<PendingWork> {
        let bytes = payload.filter(|b| !b.is_empty())?;

        let payload = match PushPayload::parse(&bytes) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "push payload dropped");
                return None;
            }
        };

        let notification = payload.into_notification(&self.config.notifications);
        let host = Arc::clone(&self.notifications);

        Some(PendingWork::new(tokio::spawn(async move {
            if let Err(err) = host.show(notification).await {
                warn!(error = %err, "notification display failed");
            }
        })))
    }

    /// Notification click: close, then focus an exact-URL window or open a
    /// new one, as a single pending action.
    fn on_notification_click(&self, click: NotificationClick) -> PendingWork {
        let target = match self.config.resolve(click.target()) {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "bad click target; routing to origin root");
                self.config.origin.clone()
            }
        };

        let host = Arc::clone(&self.notifications);
        let clients = Arc::clone(&self.clients);

        PendingWork::new(tokio::spawn(async move {
            if let Err(err) = host.close(&click.tag).await {
                debug!(error = %err, tag = %click.tag, "notification close failed");
            }

            let snapshot = clients.read().await.snapshot();
            match snapshot.iter().find(|w| w.url == target) {
                Some(window) => {
                    // The window may have closed since the snapshot.
                    if let Err(err) = clients.write().await.focus(window.id) {
                        debug!(error = %err, url = %target, "window vanished before focus");
                    }
                }
                None => {
                    clients.write().await.open_window(target);
                }
            }
        }))
    }

    /// Message: the skip-waiting token forces immediate activation.
    async fn on_message(&self, value: Value) -> Result<EventOutcome> {
        if value.as_str() == Some(SKIP_WAITING) {
            let state = self.state().await;
            if state == WorkerState::Installed {
                self.on_activate().await?;
                return Ok(EventOutcome::Activated);
            }
            debug!(?state, "skip-waiting token outside the waiting state");
        }
        Ok(EventOutcome::Ignored)
    }

    async fn transition(&self, to: WorkerState) {
        let mut state = self.state.write().await;
        let from = *state;
        *state = to;
        debug!(?from, ?to, "lifecycle transition");
        let _ = self.event_tx.send(SwEvent::StateChanged { from, to });
    }
}
