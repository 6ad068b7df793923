//! Background poller driving periodic scan-then-reload ticks.

mod core;

#[cfg(test)]
mod tests;

pub use self::core::Poller;
