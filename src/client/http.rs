//! `reqwest`-backed transport.

use super::{HttpRequest, HttpResponse, Transport, Verb};
use crate::model::ClientError;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use std::time::Duration;

/// Blocking HTTP transport. Sends JSON bodies with `Content-Type: application/json`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport. `timeout = None` waits forever.
    pub fn new(timeout: Option<Duration>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport {
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

fn method(verb: Verb) -> Method {
    match verb {
        Verb::Get => Method::GET,
        Verb::Post => Method::POST,
        Verb::Put => Method::PUT,
        Verb::Delete => Method::DELETE,
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        let mut builder = self
            .client
            .request(method(request.verb), &request.url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(|e| ClientError::Transport {
            reason: e.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| ClientError::Transport {
            reason: e.to_string(),
        })?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
