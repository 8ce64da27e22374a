pub mod endpoints;
pub mod http;
pub mod shared;
pub mod transport;

pub use endpoints::Endpoints;
pub use http::HttpTransport;
pub use transport::{ApiRequest, ApiResponse, RequestBody, Transport, TransportError, UploadForm};
