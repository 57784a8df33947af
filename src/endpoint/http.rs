//! HTTP backend for the [`Endpoint`] trait
//!
//! A thin wrapper over a blocking `reqwest` client: joins relative paths
//! onto the configured host URL, sends the API key on every request and
//! normalizes transport failures into [`EndpointError`].

use serde_json::Value;

use crate::config::ApiConfig;
use crate::endpoint::{ApiResponse, Endpoint, EndpointError, UploadBatch};

pub struct HttpEndpoint {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl HttpEndpoint {
    /// Build a client from the API section of the config.
    ///
    /// # Arguments
    /// * `config` - Host URL, API key and request timeout
    ///
    /// # Returns
    /// A ready endpoint, or an error if the TLS backend fails to initialize.
    pub fn new(config: &ApiConfig) -> Result<Self, EndpointError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EndpointError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.host_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn read(response: reqwest::blocking::Response) -> Result<ApiResponse, EndpointError> {
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let body = response.text().map_err(map_transport_error)?;
        Ok(ApiResponse {
            status,
            body,
            location,
        })
    }
}

fn map_transport_error(err: reqwest::Error) -> EndpointError {
    if err.is_timeout() {
        EndpointError::Timeout(err.to_string())
    } else {
        EndpointError::Network(err.to_string())
    }
}

impl Endpoint for HttpEndpoint {
    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiResponse, EndpointError> {
        let mut request = self
            .client
            .get(self.url(path))
            .header(reqwest::header::AUTHORIZATION, &self.api_key);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().map_err(map_transport_error)?;
        Self::read(response)
    }

    fn post(&self, path: &str, body: &Value) -> Result<ApiResponse, EndpointError> {
        let response = self
            .client
            .post(self.url(path))
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(body)
            .send()
            .map_err(map_transport_error)?;
        Self::read(response)
    }

    fn patch(&self, path: &str, body: &Value) -> Result<ApiResponse, EndpointError> {
        let response = self
            .client
            .patch(self.url(path))
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(body)
            .send()
            .map_err(map_transport_error)?;
        Self::read(response)
    }

    fn upload(&self, path: &str, batch: &UploadBatch) -> Result<ApiResponse, EndpointError> {
        let mut form = reqwest::blocking::multipart::Form::new();
        for file in &batch.files {
            form = form
                .file(batch.field.clone(), file)
                .map_err(|e| EndpointError::Io(e.to_string()))?;
        }
        let response = self
            .client
            .post(self.url(path))
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .multipart(form)
            .send()
            .map_err(map_transport_error)?;
        Self::read(response)
    }
}
