//! HTTP handlers: home summary page, download streaming, upload intake.

use std::io::SeekFrom;
use std::time::SystemTime;

use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use httpdate::{fmt_http_date, parse_http_date};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::config::collapse_home;
use crate::errors::AppError;
use crate::server::state::AppState;
use crate::storage::{self, ExclusiveFile};

//===========
// Home page
//===========

/// Plain HTML summary of what this instance offers. The token rides along
/// in the links so a scanned URL keeps working from the page.
pub async fn home(State(state): State<AppState>) -> Html<String> {
    let config = &state.config;

    let download_section = match config.download_basename() {
        Some(name) => format!(
            r#"<p>Download: <a href="/download?token={token}">{name}</a></p>"#,
            token = config.token,
            name = escape_html(name),
        ),
        None => "<p>No download configured.</p>".to_string(),
    };

    let upload_dir = escape_html(&collapse_home(&config.upload_dir));

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>handoff</title></head>
<body>
<h1>handoff</h1>
{download_section}
<p>Uploads are saved to <code>{upload_dir}</code></p>
<form method="post" action="/upload?token={token}" enctype="multipart/form-data">
<input type="file" name="file" required>
<button type="submit">Upload</button>
</form>
</body>
</html>
"#,
        token = config.token,
    ))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

//==========
// Download
//==========

/// Streams the configured file as an attachment.
///
/// The same URL can point at different bytes across restarts, so every
/// response carries `Cache-Control: no-store`. Supports single byte ranges
/// and `If-Modified-Since` revalidation.
pub async fn download(
    State(state): State<AppState>,
    request_headers: HeaderMap,
) -> Result<Response, AppError> {
    let Some(path) = state.config.download.as_deref() else {
        return Err(AppError::BadRequest("no file to download".to_string()));
    };

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|err| AppError::internal("stat failed", err))?;
    if metadata.is_dir() {
        // Startup validation rejected directories; the path was swapped
        // underneath a running process.
        return Err(AppError::Internal(
            "download target is a directory".to_string(),
        ));
    }
    let file_size = metadata.len();
    let modified = metadata.modified().ok();

    let mut headers = HeaderMap::new();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        attachment_header(path)?,
    );
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime.essence_str())
            .map_err(|err| AppError::internal("invalid content type", err))?,
    );
    if let Some(ts) = modified {
        if let Ok(value) = HeaderValue::from_str(&fmt_http_date(ts)) {
            headers.insert(header::LAST_MODIFIED, value);
        }
    }

    if not_modified_since(&request_headers, modified) {
        return Ok((StatusCode::NOT_MODIFIED, headers).into_response());
    }

    // A stale If-Range validator downgrades the request to a full response.
    let range = if if_range_matches(&request_headers, modified) {
        parse_range(request_headers.get(header::RANGE), file_size)?
    } else {
        None
    };

    let mut file = File::open(path)
        .await
        .map_err(|err| AppError::internal("can't open file", err))?;

    if let Some((start, end)) = range {
        let length = end - start + 1;
        file.seek(SeekFrom::Start(start))
            .await
            .map_err(|err| AppError::internal("seek failed", err))?;
        headers.insert(
            header::CONTENT_RANGE,
            HeaderValue::from_str(&format!("bytes {start}-{end}/{file_size}"))
                .map_err(|err| AppError::internal("invalid content range", err))?,
        );
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        let stream = ReaderStream::new(file.take(length));
        return Ok((StatusCode::PARTIAL_CONTENT, headers, Body::from_stream(stream)).into_response());
    }

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file_size));
    let stream = ReaderStream::new(file);
    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

fn attachment_header(path: &std::path::Path) -> Result<HeaderValue, AppError> {
    let basename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download");
    HeaderValue::from_str(&format!("attachment; filename=\"{basename}\""))
        .map_err(|err| AppError::internal("invalid attachment name", err))
}

fn not_modified_since(request_headers: &HeaderMap, modified: Option<SystemTime>) -> bool {
    let (Some(value), Some(modified)) = (
        request_headers
            .get(header::IF_MODIFIED_SINCE)
            .and_then(|v| v.to_str().ok()),
        modified,
    ) else {
        return false;
    };
    match parse_http_date(value) {
        Ok(since) => unix_secs(modified) <= unix_secs(since),
        Err(_) => false,
    }
}

/// A range request with a stale (or unparseable) `If-Range` validator is
/// served in full; an echoed `Last-Modified` keeps the range.
fn if_range_matches(request_headers: &HeaderMap, modified: Option<SystemTime>) -> bool {
    match request_headers
        .get(header::IF_RANGE)
        .and_then(|v| v.to_str().ok())
    {
        Some(value) => match (parse_http_date(value), modified) {
            (Ok(date), Some(ts)) => unix_secs(ts) <= unix_secs(date),
            _ => false,
        },
        None => true,
    }
}

/// HTTP dates have second precision; truncate before comparing.
fn unix_secs(ts: SystemTime) -> u64 {
    ts.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Parses a single `bytes=start-end` range. Multiple ranges are rejected;
/// out-of-bounds ranges are 416 with the file size in `Content-Range`.
fn parse_range(
    value: Option<&HeaderValue>,
    file_size: u64,
) -> Result<Option<(u64, u64)>, AppError> {
    let Some(value) = value else {
        return Ok(None);
    };
    if file_size == 0 {
        return Err(AppError::RangeNotSatisfiable { size: file_size });
    }
    let value = value
        .to_str()
        .map_err(|_| AppError::BadRequest("invalid Range header".to_string()))?;
    let Some(range) = value.strip_prefix("bytes=") else {
        return Err(AppError::BadRequest("invalid Range header".to_string()));
    };
    if range.contains(',') {
        return Err(AppError::BadRequest(
            "multiple ranges not supported".to_string(),
        ));
    }

    let mut parts = range.splitn(2, '-');
    let start_part = parts.next().unwrap_or_default();
    let end_part = parts.next().unwrap_or_default();

    let (start, end) = if start_part.is_empty() {
        // Suffix form: bytes=-N is the last N bytes.
        let suffix: u64 = end_part
            .parse()
            .map_err(|_| AppError::BadRequest("invalid Range header".to_string()))?;
        // RFC 7233: a zero suffix length selects no bytes.
        if suffix == 0 {
            return Err(AppError::RangeNotSatisfiable { size: file_size });
        }
        (file_size.saturating_sub(suffix), file_size - 1)
    } else {
        let start: u64 = start_part
            .parse()
            .map_err(|_| AppError::BadRequest("invalid Range header".to_string()))?;
        let end: u64 = if end_part.is_empty() {
            file_size - 1
        } else {
            end_part
                .parse()
                .map_err(|_| AppError::BadRequest("invalid Range header".to_string()))?
        };
        (start, end)
    };

    if start > end || start >= file_size || end >= file_size {
        return Err(AppError::RangeNotSatisfiable { size: file_size });
    }

    Ok(Some((start, end)))
}

//========
// Upload
//========

/// Persists one multipart `file` field under a collision-free name.
///
/// The destination is created exclusively and synced before responding; a
/// failure at any point removes the partial file.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut field = loop {
        let next = multipart
            .next_field()
            .await
            .map_err(|_| AppError::BadRequest("failed to read file".to_string()))?;
        match next {
            Some(field) if field.name() == Some("file") => break field,
            Some(_) => continue,
            None => return Err(AppError::BadRequest("failed to read file".to_string())),
        }
    };

    let declared = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest("missing file name".to_string()))?;

    // Only the final path segment of the declared name is trusted.
    let base_name = storage::sanitize_file_name(&declared)
        .ok_or_else(|| AppError::BadRequest(format!("invalid file name: {declared}")))?;

    let dest_path = storage::allocate(&state.config.upload_dir, &base_name)
        .map_err(|err| AppError::internal("failed to find a safe place to save", err))?;

    let mut dest = ExclusiveFile::create(dest_path)
        .await
        .map_err(|err| AppError::internal("failed to save file", err))?;

    loop {
        let chunk = field
            .chunk()
            .await
            .map_err(|err| AppError::internal("failed to read upload body", err))?;
        let Some(chunk) = chunk else { break };
        dest.write_all(&chunk)
            .await
            .map_err(|err| AppError::internal("failed to save file", err))?;
    }

    let saved_to = dest.path().to_path_buf();
    dest.commit()
        .await
        .map_err(|err| AppError::internal("failed to save file", err))?;

    tracing::info!(file = %declared, saved_to = %saved_to.display(), "uploaded file");

    Ok(format!("File uploaded: {declared}\n").into_response())
}
