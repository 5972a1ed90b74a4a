//! Pilot Runtime - remote target session manager
//!
//! This crate attaches to a Chromium-based application's remote-debugging
//! endpoint and keeps an automation payload running in every open surface:
//!
//! - **Port resolution**: override, ancestor command lines, own arguments,
//!   environment; nothing is guessed when all of them come up empty
//! - **Target directory**: the `/json/list` listing, filtered to pages and webviews
//! - **Sessions**: one WebSocket per target with id-correlated, deadline-bound calls
//! - **Injection**: payload evaluated once per session, entry points called after
//! - **Telemetry**: counters summed across sessions, failures counted as zero
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │        SessionManager        │  start / stop / stats / focus
//! └──┬──────────┬─────────┬──────┘
//!    │          │         │
//! ┌──▼───┐ ┌────▼────┐ ┌──▼──────┐
//! │ Port │ │Directory│ │ Injector│  payload + entry points
//! └──────┘ └─────────┘ └──┬──────┘
//!                   ┌─────▼──────┐
//!                   │  Registry  │  (port, target id) → Session
//!                   └─────┬──────┘
//!                   ┌─────▼──────┐
//!                   │  Session   │  Runtime.evaluate correlation
//!                   └────────────┘
//! ```

pub mod directory;
pub mod error;
pub mod inject;
pub mod manager;
pub mod payload;
pub mod port;
pub mod registry;
pub mod session;
pub mod telemetry;

pub use directory::{LISTING_TIMEOUT, TargetDirectory};
pub use error::{Error, Result};
pub use inject::Injector;
pub use manager::{SessionManager, StartSummary};
pub use payload::{EntryPoints, PayloadSource};
pub use pilot_protocol::{Counters, Target};
pub use port::{AncestorCommandLineProbe, PortResolver, PortSource, ResolvedPort, allocate_port, has_debugging_flag, port_for_profile, user_data_dir};
pub use registry::SessionRegistry;
pub use session::{DEFAULT_CALL_TIMEOUT, Session, SessionKey, SessionOptions};
