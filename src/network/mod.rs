//! Network Module
//!
//! TCP server exposing one shared storage, and the client proxy that turns
//! every storage call into a request.
//!
//! ## Architecture
//! - Single acceptor thread polling a non-blocking listener
//! - One worker thread per connection, joined through a `WaitGroup`
//! - Requests routed through a `(kind, cause)` handler table
//! - The storage sits behind one Mutex, so each call is atomic on the server

mod client;
mod connection;
mod handlers;
mod server;

pub use client::RemoteStorage;
pub use connection::Connection;
pub use server::{Server, SharedStorage, ShutdownHandle};
