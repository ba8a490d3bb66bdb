//! Correlation ID generation
//!
//! Every pid and agreement id is minted through [`IdGenerator`], so a node
//! can be run with fixed, predictable ids in tests.

use std::sync::atomic::{AtomicU64, Ordering};

/// Issues globally unique, opaque identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// ULID-based generator, rendered as a URN
#[derive(Debug, Default, Clone, Copy)]
pub struct UlidGenerator;

impl IdGenerator for UlidGenerator {
    fn next_id(&self) -> String {
        format!("urn:ulid:{}", ulid::Ulid::new())
    }
}

/// Deterministic generator: `<prefix>-1`, `<prefix>-2`, ...
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}
