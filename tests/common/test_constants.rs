//! Shared constants for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared constants under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

/// User ID sent by test clients.
pub const USER_ID: &str = "9a1f6a56-2c7d-4c59-9d60-1c3b4a7e8f01";

/// API token sent by test clients.
pub const TOKEN: &str = "test-token";

/// Identifier of the server used in HTTP scenarios.
pub const SERVER_ID: &str = "3f2b7c1e-4d5a-4e8b-9c6d-7a8b9c0d1e2f";

/// Request-tracking identifier returned by mutating calls.
pub const REQUEST_ID: &str = "req-1";
