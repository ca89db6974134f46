//! Opaque string identifiers for the entities the engine touches.
//!
//! Generated ids are 24 lowercase hex digits: seconds since the epoch,
//! the low bits of the process id and a per-process counter, so ids created
//! in the same second by the same process still sort by creation order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

pub(crate) fn next_hex_id() -> String {
    let seconds = chrono::Utc::now().timestamp().max(0) as u64 & 0xffff_ffff;
    let process = u64::from(std::process::id()) & 0xff_ffff;
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xff_ffff_ffff;
    format!("{:08x}{:06x}{:010x}", seconds, process, counter)
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn generate() -> Self {
                Self(next_hex_id())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Identifier of a planogram document.
    PlanogramId
);
define_id!(
    /// Identifier of a product, stable for the product's lifetime inside its planogram.
    ProductId
);
define_id!(CategoryId);
define_id!(
    /// Authenticated caller, as resolved by the outer auth layer.
    UserId
);
