//! # entrig-core - Core Notification Types
//!
//! Foundation crate for the Entrig notification bridge. Provides the native
//! value model, the payload decoder, the canonical notification event and
//! the error taxonomy shared by every other crate.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, serde_json, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Native Values (`native`)
//! - [`NativeValue`] - Nested key/value container as handed over by the platform
//! - [`NativePayload`] - A notification payload in one of the known native shapes
//!
//! ### Decoding (`decode`)
//! - [`decode()`] - Structural decoder from [`NativeValue`] into a [`Mapping`]
//! - [`decode_json()`] - Decode a JSON-encoded payload string
//! - [`encode()`] - Inverse of [`decode()`], used to re-encode canonical data
//!
//! ### Events (`event`)
//! - [`NotificationEvent`] - Canonical `{title, body, type, data}` record
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum with wire codes for the method channel
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! ```rust
//! use entrig_core::prelude::*;
//! ```

pub mod decode;
pub mod error;
pub mod event;
pub mod logging;
pub mod native;

/// Prelude for common imports used throughout all Entrig crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

pub use decode::{decode, decode_json, encode, Mapping};
pub use error::{CollaboratorOp, Error, Result, ResultExt};
pub use event::NotificationEvent;
pub use native::{NativePayload, NativeValue};
