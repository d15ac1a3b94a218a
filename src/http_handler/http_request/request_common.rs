use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HTTPRequestMethod {
    Get,
    Post,
}

/// Shared description of a bridge endpoint.
pub(crate) trait HTTPRequestType {
    /// Type of the expected JSON response.
    type Response: serde::de::DeserializeOwned;
    /// Path relative to the bridge base URL.
    fn endpoint(&self) -> &str;
    fn request_method(&self) -> HTTPRequestMethod;
}

/// Requests sent without a body.
pub(crate) trait NoBodyHTTPRequestType: HTTPRequestType {}

/// Requests carrying a JSON body.
pub(crate) trait JSONBodyHTTPRequestType: HTTPRequestType {
    type Body: serde::Serialize;
    fn body(&self) -> &Self::Body;
}

#[derive(Debug, Display)]
pub enum RequestError {
    ClientBuild(String),
}

impl std::error::Error for RequestError {}
