//! Serve command - HTTP endpoint for receipt uploads.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Args;
use serde_json::json;
use tracing::{debug, info};

use xpends_core::{ExtractionResult, GuardError, RawDocument, ReceiptScanner, ScanError, TextRecognizer};

use super::{load_config, local_recognizer};

/// Multipart field carrying the uploaded receipt.
const FILE_FIELD: &str = "file";

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (default: server.bind from the configuration)
    #[arg(short, long)]
    bind: Option<String>,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let recognizer = local_recognizer(&config, args.model_dir.clone());
    let scanner = Arc::new(ReceiptScanner::new(&config, recognizer)?);

    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(scanner)).await?;
    Ok(())
}

/// Routes of the scanning service.
pub fn router<R: TextRecognizer + 'static>(scanner: Arc<ReceiptScanner<R>>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/scan/receipt", post(scan_receipt::<R>))
        // The guard enforces the configured limit while streaming.
        .layer(DefaultBodyLimit::disable())
        .with_state(scanner)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "message": "xpends receipt scanner is running" }))
}

/// Scan an uploaded receipt.
///
/// Form data:
/// - `file`: the receipt image or PDF
#[tracing::instrument(skip_all)]
async fn scan_receipt<R: TextRecognizer + 'static>(
    State(scanner): State<Arc<ReceiptScanner<R>>>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionResult>, ApiError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("Invalid multipart data: {}", err)))?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!("Skipping field {:?}", field.name());
            continue;
        }

        let media_type = field.content_type().unwrap_or_default().to_string();
        scanner.guard().check_media_type(&media_type)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|err| ApiError::bad_request(format!("Failed to read file data: {}", err)))?
        {
            // Stop reading as soon as the limit is crossed.
            scanner.guard().check_size(bytes.len() + chunk.len())?;
            bytes.extend_from_slice(&chunk);
        }

        debug!(media_type = %media_type, size = bytes.len(), "Received upload");

        let document = RawDocument::new(bytes, media_type);
        let scanner = Arc::clone(&scanner);
        let result = tokio::task::spawn_blocking(move || scanner.scan(&document))
            .await
            .map_err(|err| ApiError::new(StatusCode::BAD_GATEWAY, format!("OCR service error: {}", err)))??;

        return Ok(Json(result));
    }

    Err(ApiError::new(
        StatusCode::UNPROCESSABLE_ENTITY,
        format!("Missing '{}' field", FILE_FIELD),
    ))
}

/// Error response rendered as `{"detail": ...}`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.detail())
    }
}

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        ScanError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use axum_test::multipart::{MultipartForm, Part};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use xpends_core::models::config::{UploadConfig, XpendsConfig};
    use xpends_core::{MediaType, OcrError};

    const RECEIPT: &str = "Razón Social: Comercial Andes SpA\nRUT 76.123.456-7\nTotal: $12.990";

    fn fake_ocr(_: &[u8], media_type: MediaType) -> Result<String, OcrError> {
        match media_type {
            MediaType::Gif => Err(OcrError::Recognition("vision quota exceeded".to_string())),
            _ => Ok(RECEIPT.to_string()),
        }
    }

    fn create_test_server(max_bytes: usize) -> anyhow::Result<TestServer> {
        let mut config = XpendsConfig::default();
        config.upload = UploadConfig {
            max_bytes,
            ..UploadConfig::default()
        };
        let scanner = ReceiptScanner::new(&config, fake_ocr)?;
        Ok(TestServer::new(router(Arc::new(scanner)))?)
    }

    fn upload(bytes: Vec<u8>, mime: &str) -> MultipartForm {
        MultipartForm::new().add_part(
            "file",
            Part::bytes(bytes).file_name("receipt").mime_type(mime),
        )
    }

    #[tokio::test]
    async fn health_check() -> anyhow::Result<()> {
        let server = create_test_server(1024)?;
        let response = server.get("/").await;
        response.assert_status_ok();
        Ok(())
    }

    #[tokio::test]
    async fn scan_success() -> anyhow::Result<()> {
        let server = create_test_server(1024)?;
        let response = server
            .post("/scan/receipt")
            .multipart(upload(b"jpeg".to_vec(), "image/jpeg"))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["amount"], 12990.0);
        assert_eq!(body["rut"], "76.123.456-7");
        assert_eq!(body["provider_name"], "Comercial Andes SpA");
        assert_eq!(body["raw_text"], RECEIPT);
        Ok(())
    }

    #[tokio::test]
    async fn unsupported_media_type() -> anyhow::Result<()> {
        let server = create_test_server(1024)?;
        let response = server
            .post("/scan/receipt")
            .multipart(upload(b"a,b".to_vec(), "text/csv"))
            .await;

        response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body: Value = response.json();
        assert_eq!(
            body["detail"],
            "Unsupported file type 'text/csv'. Upload an image or PDF."
        );
        Ok(())
    }

    #[tokio::test]
    async fn payload_too_large() -> anyhow::Result<()> {
        let server = create_test_server(1024 * 1024)?;
        let response = server
            .post("/scan/receipt")
            .multipart(upload(vec![0u8; 1024 * 1024 + 1], "image/png"))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        let body: Value = response.json();
        assert_eq!(body["detail"], "File too large. Maximum is 1 MB.");
        Ok(())
    }

    #[tokio::test]
    async fn ocr_failure() -> anyhow::Result<()> {
        let server = create_test_server(1024)?;
        let response = server
            .post("/scan/receipt")
            .multipart(upload(b"gif".to_vec(), "image/gif"))
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        let body: Value = response.json();
        assert_eq!(
            body["detail"],
            "OCR service error: text recognition failed: vision quota exceeded"
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_field() -> anyhow::Result<()> {
        let server = create_test_server(1024)?;
        let form = MultipartForm::new().add_text("note", "no file");
        let response = server.post("/scan/receipt").multipart(form).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        Ok(())
    }
}
