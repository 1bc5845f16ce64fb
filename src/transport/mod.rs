//! # Transports
//!
//! Alternative byte streams the call logic can run over.
//!
//! The client and server speak to any duplex byte stream; TCP is simply
//! the default. This module hosts the in-memory transport used for tests
//! and for same-process call shortcuts.
//!
//! ## Components
//! - **Local**: in-memory duplex pipe pair plus `local_*` call shortcuts

pub mod local;
