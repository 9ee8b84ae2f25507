//! `tricol-client`
//!
//! **Responsibility:** HTTP side of the Tricol session.
//!
//! This crate provides:
//! - A transport capability and its reqwest implementation
//! - An ordered request/response pipeline with the attach-credential and
//!   handle-fault stages
//! - Session operations (login, register, logout) and navigation guards
//!
//! Token storage and permission derivation live in `tricol-auth`.

pub mod config;
pub mod guard;
pub mod interceptors;
pub mod navigation;
pub mod pipeline;
pub mod session;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use guard::{AuthGuard, PermissionGuard};
pub use interceptors::{AttachCredential, HandleFault, attach_credential, handle_fault};
pub use navigation::{Navigator, RecordingNavigator, Route, TracingNavigator};
pub use pipeline::{Outcome, Pipeline, RequestStage, ResponseStage};
pub use session::SessionState;
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport, TransportError};
