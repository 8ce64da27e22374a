use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

use super::transport::{ApiRequest, ApiResponse, RequestBody, Transport, TransportError, UploadForm};
use crate::config::HttpConfig;

/// [`Transport`] backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

fn multipart(form: UploadForm) -> Result<Form, TransportError> {
    let file = Part::bytes(form.file.bytes)
        .file_name(form.file.name)
        .mime_str(&form.file.media_type)?;
    Ok(Form::new()
        .part("file", file)
        .text("title", form.title)
        .text("description", form.description)
        .text("genre", form.genre))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        log::debug!("{} {}", request.method, request.url);
        let builder = self.client.request(request.method, &request.url);
        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(form) => builder.multipart(multipart(form)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        Ok(ApiResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_owned),
            body: body.to_vec(),
        })
    }
}
