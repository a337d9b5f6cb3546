//! Built-in registry backends.
//!
//! Hardware backends live outside this crate and implement the traits in
//! [`crate::registry`] against their native scanning APIs. What ships here is
//! the synthetic [`pattern`] backend: a registry with one virtual scanner
//! that needs no hardware, validates options like a real device, and serves a
//! deterministic test page. Front-ends use it as a default and the library's
//! own tests use it as an end-to-end fixture.

pub mod pattern;
