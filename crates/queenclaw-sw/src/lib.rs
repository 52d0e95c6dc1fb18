//! # QueenClaw Offline Coordinator
//!
//! Offline caching and update coordination for the QueenClaw PWA shell.
//!
//! ## Features
//!
//! - **Cache lifecycle**: install a static asset baseline, prune stale
//!   generations on activation
//! - **Fetch interception**: stale-while-revalidate with a synthesized
//!   offline fallback
//! - **Push bridge**: push payloads to OS notifications, clicks back to
//!   application windows
//! - **Control channel**: `skipWaiting` for immediate activation
//!
//! ## Architecture
//!
//! ```text
//! OfflineCoordinator::dispatch(WorkerEvent)
//!     ├── Install ──────────→ baseline → current generation
//!     ├── Activate ─────────→ prune stale generations, claim windows
//!     ├── Fetch ────────────→ hit: cached + detached revalidation
//!     │                       miss: network → cache copy | 503 fallback
//!     ├── Push ─────────────→ NotificationHost::show
//!     ├── NotificationClick → focus exact window | open new
//!     └── Message ──────────→ "skipWaiting" → activate now
//!
//! CacheStorage
//!     └── Cache (one generation per version tag)
//!             └── request key → response snapshot
//! ```
//!
//! The embedder constructs the coordinator with a [`RemoteFetch`]
//! implementation (usually [`HttpFetcher`]) and a [`NotificationHost`],
//! registers open windows in [`WindowClients`], and feeds events through
//! the dispatch table.

pub mod cache;
pub mod clients;
pub mod config;
pub mod coordinator;
pub mod net;
pub mod push;

pub use cache::{Cache, CacheStorage, CachedResponse};
pub use clients::{ClientId, WindowClient, WindowClients};
pub use config::{NetworkConfig, NotificationConfig, SwConfig};
pub use coordinator::{
    EventOutcome, FetchOutcome, OfflineCoordinator, PendingWork, SwEvent, WorkerEvent,
    WorkerState, SKIP_WAITING,
};
pub use net::{FetchRequest, FetchResponse, HttpFetcher, RemoteFetch};
pub use push::{
    ChannelNotificationHost, Notification, NotificationClick, NotificationEvent,
    NotificationHost, PushPayload,
};
