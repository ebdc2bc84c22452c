//! # lethe-request
//!
//! Gated access to decrypted media.
//!
//! A [`RequestEnvelope`] names a media id, the kind the caller expects, and
//! the requester. The [`RequestGateway`] answers with a [`ResponseEnvelope`]
//! whose status is `Completed` (content attached), `Denied` or `Expired`.
//!
//! ## Example
//!
//! ```ignore
//! use lethe_request::{MediaRequestProtocol, RequestEnvelope, RequestGateway};
//!
//! let gateway = RequestGateway::new(manager);
//! let response = gateway
//!     .request_media(&RequestEnvelope::new(id, MediaKind::Photo, "agent-1"))
//!     .await?;
//! if response.is_completed() {
//!     process(response.content.unwrap());
//! }
//! ```

pub mod gateway;
pub mod log;
pub mod models;
pub mod protocol;

pub use gateway::RequestGateway;
pub use log::RequestLog;
pub use models::{
    Denial, DenialReason, RequestEnvelope, RequestPriority, RequestStatus, ResponseEnvelope,
};
pub use protocol::MediaRequestProtocol;
