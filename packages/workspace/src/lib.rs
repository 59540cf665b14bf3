//! Editor session runtime: debounced persistence, hydration on open,
//! draft promotion and the notification bus.
//!
//! `EditorSession` wraps the synchronous `campaign-editor` core with the parts
//! that need a tokio runtime. Backends, caches and navigators are traits so
//! hosts can plug in their own record store.

mod backend;
mod bus;
mod cache;
mod config;
mod errors;
mod loader;
mod navigation;
mod promotion;
mod session;
mod sync;

pub use backend::{FileBackend, MemoryBackend, PersistenceBackend};
pub use bus::{FlushParticipant, NotificationBus, StyleEvent};
pub use cache::{CacheExt, FileCache, LocalCache, MemoryCache};
pub use config::SyncConfig;
pub use errors::{SyncError, SyncResult};
pub use loader::LoadOutcome;
pub use navigation::{Navigator, RouteNavigator};
pub use promotion::SaveOutcome;
pub use session::{EditorSession, SessionBuilder};
pub use sync::{SkipReason, WriteOutcome};
