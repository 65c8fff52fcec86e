use std::{future::Future, pin::Pin, time::Duration};

use log::{debug, error, info};

use crate::{
    REQUEST_TIMEOUT_SECS,
    connectivity::{CONNECT_TIMEOUT, GEMINI_HOST, HTTPS_PORT, check_network},
};

use super::{IDENTIFY_PROMPT, ImageHandle, Vision, VisionError, VisionModel};

pub mod gemini_api;

const BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    model: VisionModel,
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    reachability: (String, u16),
}

impl Gemini {
    pub fn new(api_key: String, model: VisionModel) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
            base_url: BASE_URL.into(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            reachability: (GEMINI_HOST.into(), HTTPS_PORT),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Points the client at another server, e.g. a proxy. The connectivity
    /// check follows the new host.
    pub fn with_base_url(
        mut self,
        base_url: impl Into<String>,
        check_host: &str,
        check_port: u16,
    ) -> Self {
        self.base_url = base_url.into();
        self.reachability = (check_host.into(), check_port);
        self
    }
}

impl Vision for Gemini {
    fn init(&self) -> Pin<Box<dyn Future<Output = Result<(), VisionError>> + Send + '_>> {
        Box::pin(async move {
            let (host, port) = &self.reachability;
            if !check_network(host, *port, CONNECT_TIMEOUT).await {
                let err = VisionError::NoConnectivity;
                error!("Failed to initialize Gemini API: {err}");
                return Err(err);
            }

            info!("Gemini API initialized successfully ({})", self.model);
            Ok(())
        })
    }

    fn describe<'a>(
        &'a self,
        image: &'a ImageHandle,
    ) -> Pin<Box<dyn Future<Output = Result<String, VisionError>> + Send + 'a>> {
        Box::pin(async move {
            let (width, height) = image.dimensions();
            debug!(
                "Sending {} ({width}x{height}, {} bytes as jpeg) to {}",
                image.path().display(),
                image.jpeg().len(),
                self.model
            );

            let req = gemini_api::Request {
                api_key: self.api_key.clone(),
                url: format!(
                    "{}/v1beta/models/{}:generateContent",
                    self.base_url.trim_end_matches('/'),
                    self.model
                ),
                data: gemini_api::RequestBody::identify(image.jpeg(), IDENTIFY_PROMPT),
            };

            let response = gemini_api::send_request(req, &self.client, self.timeout).await?;
            gemini_api::response_text(response)
        })
    }
}
