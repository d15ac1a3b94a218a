use strum_macros::Display;

/// Checks the status code and decodes the JSON body.
///
/// A `404` is reported as [`ResponseError::NotFound`], which the bridge uses
/// for telemetry it has not received from the vehicle yet.
pub(crate) async fn read_json_response<R>(response: reqwest::Response) -> Result<R, ResponseError>
where R: serde::de::DeserializeOwned {
    let status = response.status();
    if status.is_success() {
        Ok(response.json::<R>().await?)
    } else if status == reqwest::StatusCode::NOT_FOUND {
        Err(ResponseError::NotFound)
    } else if status.is_server_error() {
        Err(ResponseError::InternalServer)
    } else if status.is_client_error() {
        let detail = response.json::<BadRequestReturn>().await.map(|b| b.detail).unwrap_or_default();
        Err(ResponseError::BadRequest(detail))
    } else {
        Err(ResponseError::Unknown)
    }
}

#[derive(Debug, serde::Deserialize)]
struct BadRequestReturn {
    #[serde(default)]
    detail: String,
}

#[derive(Debug, Display)]
pub enum ResponseError {
    InternalServer,
    BadRequest(String),
    NotFound,
    NoConnection,
    Timeout,
    Unknown,
}

impl std::error::Error for ResponseError {}

impl From<reqwest::Error> for ResponseError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            ResponseError::Timeout
        } else if value.is_connect() {
            ResponseError::NoConnection
        } else if value.is_decode() || value.is_request() {
            ResponseError::BadRequest(value.to_string())
        } else {
            ResponseError::Unknown
        }
    }
}
