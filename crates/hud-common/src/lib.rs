//! Common utilities shared across HUD crates.
//!
//! Provides the reactive [`Property`] primitive and property-unwrapping
//! macros used when decoding D-Bus property maps.

#[macro_use]
/// Common macros for services.
pub mod macros;
mod property;

pub use property::{ComputedProperty, Property, PropertyStream};

/// Root path for service object paths in D-Bus hierarchy.
pub const ROOT_PATH: &str = "/";
/// Null path used when no specific object path is required.
pub const NULL_PATH: &str = "/";
