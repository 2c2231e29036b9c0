//! Transport for the file storage API.
//!
//! [`FileClient`] talks HTTP; [`FileTransport`] is the seam the upload
//! orchestrator and file registry depend on, so they can run against
//! in-memory doubles in tests.

mod client;
mod transport;

pub use client::{ClientConfig, ClientError, FileClient};
pub use transport::{FileTransport, TransportFuture};
