use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use launchdesk_core::ingest::{extract_headers, ColumnMapping, IngestOptions};
use launchdesk_db::IngestionSummary;
use serde::Serialize;

use super::{ApiError, ApiState};

const ACCEPTED_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

#[derive(Debug, Serialize)]
pub struct HeadersResponse {
    pub headers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub stats: IngestionSummary,
}

#[derive(Debug, Default)]
struct UploadForm {
    file: Option<Vec<u8>>,
    mapping: Option<String>,
    default_market: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => form.file = Some(read_file(field).await?),
                "mapping" => form.mapping = Some(field.text().await.map_err(malformed)?),
                "default_market" => {
                    form.default_market = Some(field.text().await.map_err(malformed)?)
                }
                _ => {}
            }
        }
        Ok(form)
    }

    fn into_parts(self) -> Result<(Vec<u8>, IngestOptions), ApiError> {
        let file = self.file.ok_or_else(|| ApiError::bad_request("missing `file` field"))?;
        let mapping = ColumnMapping::from_json(self.mapping.as_deref().unwrap_or_default())
            .map_err(ApiError::from_app)?;
        Ok((file, IngestOptions { mapping, default_market: self.default_market }))
    }
}

async fn read_file(field: Field<'_>) -> Result<Vec<u8>, ApiError> {
    let filename = field.file_name().unwrap_or_default().to_ascii_lowercase();
    if !ACCEPTED_EXTENSIONS.iter().any(|extension| filename.ends_with(extension)) {
        return Err(ApiError::bad_request("Invalid file format. Please upload .xlsx or .xls"));
    }
    Ok(field.bytes().await.map_err(malformed)?.to_vec())
}

fn malformed(error: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::bad_request(format!("malformed multipart body: {error}"))
}

pub async fn headers(multipart: Multipart) -> Result<Json<HeadersResponse>, ApiError> {
    let (file, _) = UploadForm::read(multipart).await?.into_parts()?;
    let headers = extract_headers(&file).map_err(ApiError::from_app)?;
    Ok(Json(HeadersResponse { headers }))
}

pub async fn ingest(
    State(state): State<ApiState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let (file, options) = UploadForm::read(multipart).await?.into_parts()?;
    let stats = state.pipeline.ingest(&file, &options).await.map_err(ApiError::from_app)?;
    Ok(Json(UploadResponse { message: "Success", stats }))
}
