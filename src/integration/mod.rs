//! Integration tests
//!
//! End-to-end coverage of the extraction pipeline and the HTTP surface.
//! Fixtures are synthesized with the system ffmpeg, so every test that
//! needs the tools skips gracefully when they are not installed.

#[cfg(test)]
mod e2e;
