//! Purpose: Binary-safe request-body decoding for the school portal's upload and quiz APIs.
//! Exports: `api` (stable surface), `core` (multipart primitives, errors), `json`, `notice`.
//! Role: Library backing the `portal-codec` CLI and the portal's HTTP handlers.
//! Invariants: Decoders are pure functions over fully-buffered input.
//! Invariants: Malformed input is reported through diagnostics, never silently dropped.
pub mod api;
pub mod core;
pub mod json;
pub mod notice;
