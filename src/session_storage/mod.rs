//! Session stores usable behind the authenticator's session layer.
//!
//! Any [`tower_sessions::SessionStore`] can be injected; [`in_memory::MemoryStore`]
//! is the default when none is configured.

pub mod in_memory;

pub use in_memory::MemoryStore;
