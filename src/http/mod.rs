pub mod request;
pub mod transport;

pub use request::RequestUnit;
pub use transport::{ApiRequest, HttpMethod, HttpTransport, Transport, TransportError};
