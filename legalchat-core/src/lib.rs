//! # legalchat-core
//!
//! Core library for legalchat - a terminal client for a legal multi-agent
//! assistant backend.
//!
//! This library provides:
//! - Domain types for chat messages, agents and knowledge documents
//! - The streaming transcript assembler
//! - REST and WebSocket clients for the assistant backend
//! - A controller that owns all view state and dispatches requests
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows hub-and-spoke through the [`ChatController`]:
//! user input → outbound request → backend → [`AppEvent`] → [`ChatState`] update → render.
//!
//! Network work runs on a tokio runtime. Every completion is delivered back
//! to the owning thread as an [`AppEvent`] tagged with the [`SessionId`] it was
//! issued under, so results that outlive a session reset are dropped.
//!
//! ## Example
//!
//! ```rust,no_run
//! use legalchat_core::{ChatController, Config};
//!
//! let config = Config::load().expect("failed to load config");
//! let runtime = tokio::runtime::Runtime::new().expect("failed to start runtime");
//! let mut controller =
//!     ChatController::new(&config, runtime.handle().clone()).expect("failed to build controller");
//! controller.start_session();
//! controller.pump();
//! ```

// Re-export commonly used items at the crate root
pub use client::BackendClient;
pub use config::Config;
pub use controller::{AppEvent, ChatController};
pub use error::{Error, Result};
pub use protocol::{InboundEvent, OutboundFrame};
pub use session::{Session, SessionId};
pub use state::{Action, ChatState, Completion, InFlight};
pub use stream::{ConnectionStatus, ReconnectPolicy, StreamEvent};
pub use transcript::{Applied, Transcript};
pub use types::*;

// Public modules
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod logging;
pub mod protocol;
pub mod session;
pub mod state;
pub mod stream;
pub mod transcript;
pub mod types;
