//! Request/response domain models.

pub mod method;
pub mod request;
pub mod response;

pub use method::HttpMethod;
pub use request::{HttpRequest, DEFAULT_WEIGHT};
pub use response::HttpResponse;
