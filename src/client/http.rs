//! reqwest implementation of the analysis backend

use super::{
    resolve_url, AnalysisBackend, ADVANCED_VISUALIZATIONS_PATH, ANALYZE_PATH, CAPABILITIES_PATH,
    CONVERT_PATH, REPORT_PATH, SAMPLE_TEXT_PATH, SIMILARITY_PATH, UPLOAD_PATH,
};
use crate::error::{Result, TextlensError};
use crate::models::{
    AnalysisResult, Capabilities, ConversionDirection, ConversionResponse, ConvertRequest,
    InteractiveResult, ParsedFile, ReportRequest, ReportResponse, SimilarityResult,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Serialize)]
struct AdvancedVisualizationRequest<'a> {
    analysis_data: &'a AnalysisResult,
}

/// Analysis service reached over HTTP
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder().build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        Self::parse_json(&url, response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        tracing::debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        Self::parse_json(&url, response).await
    }

    /// Map a non-2xx status to `TextlensError::Http`
    async fn check_status(url: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(text);

        Err(TextlensError::Http {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        })
    }

    async fn parse_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
        let response = Self::check_status(url, response).await?;
        let bytes = response.bytes().await?;

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| TextlensError::Json {
            source: e,
            context: format!("Failed to parse response from {}", url),
        })?;

        if let Some(error) = value.get("error").and_then(Value::as_str) {
            return Err(TextlensError::Backend(error.to_string()));
        }

        serde_json::from_value(value).map_err(|e| TextlensError::Json {
            source: e,
            context: format!("Unexpected response shape from {}", url),
        })
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        self.post_json(ANALYZE_PATH, &json!({ "text": text })).await
    }

    async fn convert(&self, text: &str, direction: ConversionDirection) -> Result<String> {
        let request = ConvertRequest { text, direction };
        let response: ConversionResponse = self.post_json(CONVERT_PATH, &request).await?;

        if let Some(error) = response.error {
            return Err(TextlensError::Backend(error));
        }
        response.converted_text.ok_or_else(|| {
            TextlensError::InvalidResponse("conversion reply has no converted_text".to_string())
        })
    }

    async fn similarity(&self, texts: &[String]) -> Result<SimilarityResult> {
        self.post_json(SIMILARITY_PATH, &json!({ "texts": texts })).await
    }

    async fn upload_file(&self, filename: &str, bytes: Vec<u8>) -> Result<ParsedFile> {
        let url = self.endpoint(UPLOAD_PATH);
        tracing::debug!("POST {} (multipart, {} bytes)", url, bytes.len());

        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        Self::parse_json(&url, response).await
    }

    async fn capabilities(&self) -> Result<Capabilities> {
        self.get_json(CAPABILITIES_PATH).await
    }

    async fn advanced_visualizations(
        &self,
        analysis: &AnalysisResult,
    ) -> Result<InteractiveResult> {
        let request = AdvancedVisualizationRequest {
            analysis_data: analysis,
        };
        self.post_json(ADVANCED_VISUALIZATIONS_PATH, &request).await
    }

    async fn generate_report(&self, request: &ReportRequest) -> Result<ReportResponse> {
        let url = self.endpoint(REPORT_PATH);
        tracing::debug!("POST {}", url);

        // `success:false` replies carry an `error` field; the assembler
        // needs the whole reply, so the generic error sniffing is skipped.
        let response = self.client.post(&url).json(request).send().await?;
        let response = Self::check_status(&url, response).await?;
        let bytes = response.bytes().await?;

        serde_json::from_slice(&bytes).map_err(|e| TextlensError::Json {
            source: e,
            context: format!("Failed to parse response from {}", url),
        })
    }

    async fn sample_text(&self) -> Result<String> {
        let url = self.endpoint(SAMPLE_TEXT_PATH);
        let response = self.client.get(&url).send().await?;
        let response = Self::check_status(&url, response).await?;
        Ok(response.text().await?)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let url = resolve_url(&self.base_url, url)?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let response = Self::check_status(&url, response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
