//! Admin gate and its HTTP surface.
//!
//! Access to stored messages is guarded by a single shared secret. A
//! successful login issues a server-side session whose id travels in a
//! signed cookie; privileged handlers resolve that session before they run.
//!
//! ## Security Model
//!
//! - The admin secret is compared in constant time and zeroized on drop
//! - Session ids are random UUIDs, rotated on every login
//! - Cookies are signed with a key derived from the session secret
//! - Sessions expire after a configured TTL and can be ended by logout
//!
//! ## Usage
//!
//! ```ignore
//! let store = Arc::new(SqliteSessionStore::new(pool.clone()));
//! let gate = Arc::new(AdminGate::new(&config.admin.secret, store, config.web.session_ttl()?));
//!
//! let session = gate.login(None, Some("the secret")).await?;
//! assert!(gate.authorize(Some(&session.session_id)).await?);
//! ```

pub mod gate;
pub mod sessions;
pub mod transport;

pub use gate::AdminGate;
pub use sessions::{MemorySessionStore, SessionStore, SharedSessionStore, SqliteSessionStore};
pub use transport::{admin_router, run_session_cleanup, AdminSession, SESSION_COOKIE};
