//! Course registration over a socket.
//!
//! A client opens a connection, sends one command, reads one answer, and the
//! server closes the connection. See `README.md` for the wire format.
//!
//! - [`server`] accepts connections one at a time and drives each request cycle.
//! - [`connection`] owns the per-connection stream and reads/writes frames.
//! - [`protocol`] defines the line-delimited JSON framing and command parsing.
//! - [`dispatch`] fans a command out to the registered handlers.
//! - [`handlers`] implements `LOAD` and `REGISTER`.
//! - [`catalog`] reads the course catalog; [`registrations`] appends to the registration log.
//! - [`client`] is a small protocol client used by the CLI and the tests.

pub mod catalog;
pub mod cli;
pub mod client;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod model;
pub mod protocol;
pub mod registrations;
pub mod server;
