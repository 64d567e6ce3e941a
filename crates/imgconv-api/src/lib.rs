//! imgconv HTTP API
//!
//! Library half of the `imgconv-api` binary, exposed so integration tests can
//! build the router without binding a socket.

pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod utils;
