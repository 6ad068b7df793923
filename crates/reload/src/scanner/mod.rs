//! Fingerprint-based change detection over resolved mapping resources.
//!
//! A [`Fingerprint`] is the resource length followed by its modification
//! time in epoch milliseconds. The [`ChangeScanner`] keeps the fingerprints
//! observed by the last successful scan in a [`FingerprintStore`] and reports
//! every resource whose fingerprint differs from it.

mod core;
mod fingerprint;

#[cfg(test)]
mod tests;

pub use self::core::ChangeScanner;
pub use self::fingerprint::{Fingerprint, FingerprintStore};
