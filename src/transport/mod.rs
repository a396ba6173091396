//! HTTP transport shared by the remote model adapters.

mod http;

pub use http::{AuthScheme, HttpTransport, TransportError};
