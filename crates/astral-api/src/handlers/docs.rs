//! Document upload, listing, download and delete handlers.

use std::collections::{BTreeMap, BTreeSet};

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use uuid::Uuid;

use astral_core::error::AppError;
use astral_core::result::AppResult;
use astral_core::types::FileFilter;
use astral_entity::file::NewFile;
use astral_service::file::fingerprint::{
    collection_etag, file_fingerprint, if_none_match_matches, quote,
};

use crate::dto::request::{DocMeta, DocQuery, ListQuery};
use crate::dto::response::{ApiResponse, DocsResponse, UploadResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

const LIST_CACHE_CONTROL: &str = "private, max-age=43200";
const FILE_COUNT_HEADER: &str = "x-file-count";

/// POST /api/docs
///
/// Multipart with a required `meta` part, an optional `json` part whose
/// fields become metadata, and an optional `file` part with the content.
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let mut meta: Option<DocMeta> = None;
    let mut json_fields = BTreeMap::new();
    let mut content = Bytes::new();
    let mut part_mime: Option<String> = None;
    let mut file_parts = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let part = field.name().map(str::to_string);
        match part.as_deref() {
            Some("meta") => {
                let raw = field.text().await.map_err(multipart_error)?;
                let parsed = serde_json::from_str(&raw)
                    .map_err(|_| AppError::invalid_input("invalid meta"))?;
                meta = Some(parsed);
            }
            Some("json") => {
                let raw = field.text().await.map_err(multipart_error)?;
                if !raw.trim().is_empty() {
                    json_fields = json_to_metadata(&raw)?;
                }
            }
            Some("file") => {
                file_parts += 1;
                part_mime = field.content_type().map(str::to_string);
                content = field.bytes().await.map_err(multipart_error)?;
            }
            _ => {}
        }
    }

    if file_parts > 1 {
        return Err(AppError::invalid_input("only one file may be uploaded per request").into());
    }
    let meta = meta.ok_or_else(|| AppError::invalid_input("meta field is required"))?;

    let mut metadata = json_fields;
    metadata.extend(meta.metadata);

    let new_file = NewFile {
        name: meta.name,
        is_inline_file: meta.file,
        public: meta.public,
        mime_type: declared_mime(meta.mime)?.or(part_mime),
        grant: meta.grant.into_iter().collect::<BTreeSet<_>>(),
        metadata,
        content,
    };

    let file = state.file_service.upload(&auth, new_file).await?;
    let name = file.name.clone();
    Ok(Json(ApiResponse::ok(UploadResponse { json: file, file: name })))
}

/// GET|HEAD /api/docs
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let filter = FileFilter {
        key: query.key.unwrap_or_default(),
        value: query.value.unwrap_or_default(),
        limit: parse_limit(query.limit.as_deref())?,
    };

    let files = state
        .file_service
        .list(&auth, query.login.as_deref(), &filter)
        .await?;

    let etag = collection_etag(&files, &filter);
    if is_not_modified(&headers, &etag) {
        return Ok(not_modified(&etag));
    }

    let count = files.len();
    let mut response = if method == Method::HEAD {
        StatusCode::OK.into_response()
    } else {
        Json(ApiResponse::ok(DocsResponse { docs: files })).into_response()
    };

    let response_headers = response.headers_mut();
    response_headers.insert(header::ETAG, header_value(&etag)?);
    response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(LIST_CACHE_CONTROL));
    response_headers.insert(FILE_COUNT_HEADER, HeaderValue::from(count));
    Ok(response)
}

/// GET|HEAD /api/docs/{id}
///
/// Inline files are returned as raw bytes, JSON records as a JSON body.
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    method: Method,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<DocQuery>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let stored = state
        .file_service
        .get_by_id(&auth, id, query.login.as_deref())
        .await?;

    let etag = quote(&file_fingerprint(&stored.file));
    if is_not_modified(&headers, &etag) {
        return Ok(not_modified(&etag));
    }

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::ETAG, header_value(&etag)?);

    let body = if stored.file.is_inline_file {
        builder = builder
            .header(header::CONTENT_TYPE, header_value(&stored.file.mime_type)?)
            .header(
                header::CONTENT_DISPOSITION,
                header_value(&content_disposition(&stored.file.name))?,
            )
            .header(header::CONTENT_LENGTH, stored.content.len());
        if method == Method::HEAD {
            Body::empty()
        } else {
            Body::from(stored.content)
        }
    } else {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        if method == Method::HEAD {
            Body::empty()
        } else {
            Body::from(serde_json::to_vec(&ApiResponse::ok(&stored.file)).map_err(AppError::from)?)
        }
    };

    builder
        .body(body)
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")).into())
}

/// DELETE /api/docs/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<DocQuery>,
) -> Result<Json<ApiResponse<BTreeMap<String, bool>>>, ApiError> {
    let id = parse_id(&id)?;
    let file = state
        .file_service
        .delete(&auth, id, query.login.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok(BTreeMap::from([(file.id.to_string(), true)]))))
}

/// The declared type is echoed as `Content-Type` on every fetch, so it must
/// be a valid header value.
fn declared_mime(raw: Option<String>) -> AppResult<Option<String>> {
    let Some(mime) = raw.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()) else {
        return Ok(None);
    };
    if HeaderValue::from_str(&mime).is_err() {
        return Err(AppError::invalid_input("invalid mime type"));
    }
    Ok(Some(mime))
}

fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::invalid_input("invalid document id"))
}

/// Missing means unlimited; a negative value is treated as unlimited.
fn parse_limit(raw: Option<&str>) -> AppResult<usize> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(0),
        Some(value) => value
            .parse::<i64>()
            .map(|limit| usize::try_from(limit).unwrap_or(0))
            .map_err(|_| AppError::invalid_input("invalid limit value")),
    }
}

fn json_to_metadata(raw: &str) -> AppResult<BTreeMap<String, String>> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|_| AppError::invalid_input("invalid json"))?;
    let object = value
        .as_object()
        .ok_or_else(|| AppError::invalid_input("json part must be an object"))?;

    Ok(object
        .iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect())
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::file_too_large("request body exceeds the upload limit").into()
    } else {
        AppError::invalid_input(format!("invalid multipart form: {}", e.body_text())).into()
    }
}

fn is_not_modified(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|presented| if_none_match_matches(presented, etag))
}

fn not_modified(etag: &str) -> Response {
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    if let Ok(value) = HeaderValue::from_str(etag) {
        response.headers_mut().insert(header::ETAG, value);
    }
    response
}

fn header_value(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::internal(format!("Invalid header value: {e}")))
}

fn content_disposition(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| if c == '"' || c.is_control() || !c.is_ascii() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}
