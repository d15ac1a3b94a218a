use super::http_request::request_common::RequestError;
use super::http_response::response_common::ResponseError;
use strum_macros::Display;

#[derive(Debug, Display)]
pub enum HTTPError {
    HTTPRequestError(RequestError),
    HTTPResponseError(ResponseError),
}

impl std::error::Error for HTTPError {}

impl From<RequestError> for HTTPError {
    fn from(value: RequestError) -> Self { HTTPError::HTTPRequestError(value) }
}

impl From<ResponseError> for HTTPError {
    fn from(value: ResponseError) -> Self { HTTPError::HTTPResponseError(value) }
}

impl HTTPError {
    /// The bridge answered but has no value for this resource yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, HTTPError::HTTPResponseError(ResponseError::NotFound))
    }

    pub fn message(&self) -> String {
        match self {
            HTTPError::HTTPRequestError(RequestError::ClientBuild(msg)) => {
                format!("HTTP client could not be built: {msg}")
            }
            HTTPError::HTTPResponseError(err) => match err {
                ResponseError::InternalServer => "Vehicle bridge internal error".to_string(),
                ResponseError::BadRequest(msg) => format!("Bad request: {msg}"),
                ResponseError::NotFound => "Resource not found on vehicle bridge".to_string(),
                ResponseError::NoConnection => "No connection to vehicle bridge".to_string(),
                ResponseError::Timeout => "Vehicle bridge did not answer in time".to_string(),
                ResponseError::Unknown => "Unknown vehicle bridge error".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_the_cause() {
        let err = HTTPError::from(ResponseError::BadRequest("altitude out of range".to_string()));
        assert_eq!(err.message(), "Bad request: altitude out of range");
        assert_ne!(err.message(), err.to_string());
        let timeout = HTTPError::from(ResponseError::Timeout);
        assert!(timeout.message().contains("in time"));
        assert!(!timeout.is_not_found());
    }
}
