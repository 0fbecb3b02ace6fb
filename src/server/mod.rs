//! Host-side live services
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         ProjectSession                           │
//! │                                                                  │
//! │  ┌──────────────┐   WatchEvent   ┌──────────────┐                │
//! │  │ProjectWatcher│ ─────────────> │ SyncContext  │──> EventBus    │
//! │  └──────────────┘                │ (forwarder)  │──> Transport   │
//! │                                  └──────┬───────┘                │
//! │                                         v                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐        │
//! │  │ContentServer │  │  Broadcast   │  │SharedProjectState│        │
//! │  │   (axum)     │  │  Transport   │  │   (RwLock)       │        │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Never hold the state lock across I/O or `.await`: read under the lock,
//! release, do the work, re-acquire to write.
//!
//! # Modules
//!
//! - `events` - host push events and the stdout mirror
//! - `session` - open-project / start-server / stop-server
//! - `state` - project state
//! - `sync` - watch event forwarding
//! - `watcher` - directory watching and classification

pub mod events;
pub mod session;
pub mod state;
pub mod sync;
pub mod watcher;

pub use events::{EventBus, EventEmitter, HostEvent};
pub use session::{ProjectSession, ServerStartResult, ServerStopResult, SessionOptions};
pub use state::{ProjectState, SharedProjectState};
pub use sync::{SyncContext, SyncOutcome};
pub use watcher::{classify, ChangeKind, ProjectWatcher, WatchEvent, WatcherConfig};
