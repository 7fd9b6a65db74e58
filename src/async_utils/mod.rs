//! Asynchronous utilities for use with Tokio.

pub mod io;
