//! Sandbox environment handling: where the interpreter lives and how the
//! environment gets created. Nothing here caches validity; the environment
//! may be created or destroyed between calls.

pub mod builder;
pub mod locator;
