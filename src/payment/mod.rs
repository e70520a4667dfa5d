//! Payment reference lifecycle.
//!
//! A payment reference correlates a client-side payment with a later,
//! out-of-band verification:
//!
//! ```text
//! POST /initiate-payment
//!        │
//!        ▼
//! ┌─────────────────────┐
//! │ Generate 128-bit id │
//! └─────────┬───────────┘
//!           │
//!           ▼
//! ┌─────────────────────┐
//! │ Store as initiated  │──── failure: log, continue
//! └─────────┬───────────┘
//!           │
//!           ▼
//!     Cache + return id
//!           │
//!      (out of band)
//!           │
//!    ┌──────┴──────┐
//!    │             │
//! VERIFIED       FAILED
//! ```

mod cache;
mod initiator;
mod reference;

pub use cache::{CacheStats, ReferenceCache};
pub use initiator::PaymentInitiator;
pub use reference::{
    PaymentReference, ReferenceId, ReferenceStatus, REFERENCE_ID_BYTES, REFERENCE_ID_HEX_LEN,
};
