use super::common::HTTPError;
use super::http_request::request_common::{
    HTTPRequestMethod, JSONBodyHTTPRequestType, NoBodyHTTPRequestType, RequestError,
};
use super::http_response::response_common::{ResponseError, read_json_response};

/// A thin wrapper around `reqwest::Client` bound to the bridge base URL.
///
/// Every request carries a fixed timeout so a silent link never blocks the
/// caller longer than [`HTTPClient::REQUEST_TIMEOUT`].
#[derive(Debug)]
pub(crate) struct HTTPClient {
    /// The underlying `reqwest::Client` used to perform HTTP requests.
    client: reqwest::Client,
    /// Base URL of the bridge, prepended to all endpoint paths.
    base_url: String,
}

impl HTTPClient {
    pub(crate) const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

    pub(crate) fn new(base_url: &str) -> Result<HTTPClient, RequestError> {
        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RequestError::ClientBuild(e.to_string()))?;
        Ok(HTTPClient { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    /// Returns the base URL that the client was initialized with.
    pub(crate) fn url(&self) -> &str { self.base_url.as_str() }

    fn builder(&self, method: HTTPRequestMethod, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{endpoint}", self.base_url);
        match method {
            HTTPRequestMethod::Get => self.client.get(url),
            HTTPRequestMethod::Post => self.client.post(url),
        }
    }

    pub(crate) async fn send_no_body<T>(&self, request: &T) -> Result<T::Response, HTTPError>
    where T: NoBodyHTTPRequestType {
        let response = self
            .builder(request.request_method(), request.endpoint())
            .send()
            .await
            .map_err(ResponseError::from)?;
        Ok(read_json_response::<T::Response>(response).await?)
    }

    pub(crate) async fn send_json<T>(&self, request: &T) -> Result<T::Response, HTTPError>
    where T: JSONBodyHTTPRequestType {
        let response = self
            .builder(request.request_method(), request.endpoint())
            .json(request.body())
            .send()
            .await
            .map_err(ResponseError::from)?;
        Ok(read_json_response::<T::Response>(response).await?)
    }
}
