//! Middleware for authentication, authorization and request tracking

pub mod guards;
pub mod jwt;
pub mod request_tracking;
pub mod token;

pub use guards::CurrentUser;
pub use jwt::JwtAuth;
pub use request_tracking::{
    request_id_layer, request_id_propagation_layer, sensitive_headers_layer,
    sensitive_headers, MakeUuidV7RequestId, REQUEST_ID_HEADER,
};
pub use token::{extract_token, Claims, TokenValidator};
