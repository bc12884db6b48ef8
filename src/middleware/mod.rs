pub mod errors;
pub mod response;
pub mod security;
pub mod validate;

pub use errors::{handle_errors, panic_response, ErrorReport};
pub use response::{ApiResponse, ApiResult};
pub use security::with_security_headers;
pub use validate::{validate_request, Issue, RequestPart, RequestSchemas, ValidatedRequest};
