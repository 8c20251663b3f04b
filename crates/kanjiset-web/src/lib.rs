//! JSON inspection API over a directory of datasets.
//!
//! One thread per connection; every request runs against the shared
//! [`ServerState`] behind a single `Mutex`.

use anyhow::Context;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use kanjiset_core::error::Error as CoreError;
use kanjiset_core::types::Record;
use kanjiset_ops::{apply_mark, discover_datasets, fetch_images, find_duplicate_hashes, Dataset, Mark};

const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

pub fn serve(root: &Path, bind: &str) -> anyhow::Result<()> {
    let root = std::fs::canonicalize(root)
        .with_context(|| format!("canonicalize root {}", root.display()))?;
    let state = ServerState::load(&root)?;
    let listener = TcpListener::bind(bind).with_context(|| format!("bind {bind}"))?;
    tracing::info!(
        %bind,
        root = %root.display(),
        datasets = state.datasets.len(),
        "inspection server listening"
    );

    let state = Arc::new(Mutex::new(state));
    for stream in listener.incoming() {
        let state = Arc::clone(&state);
        let mut stream = match stream {
            Ok(s) => s,
            Err(err) => {
                tracing::warn!(error = %err, "accept failed");
                continue;
            }
        };
        std::thread::spawn(move || {
            let _ = stream.set_read_timeout(Some(Duration::from_secs(10)));
            let _ = stream.set_write_timeout(Some(Duration::from_secs(10)));
            if let Err(err) = handle_conn(&mut stream, &state) {
                let error = format!("{err:#}");
                tracing::warn!(%error, "connection failed");
            }
        });
    }

    Ok(())
}

/// Datasets loaded at startup, in listing order.
pub struct ServerState {
    pub root: PathBuf,
    pub datasets: Vec<Dataset>,
}

impl ServerState {
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            root: root.to_path_buf(),
            datasets: discover_datasets(root)?,
        })
    }

    fn dataset(&self, name: &str) -> Result<&Dataset, ApiError> {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| ApiError::not_found(format!("no dataset named {name:?}")))
    }

    fn dataset_mut(&mut self, name: &str) -> Result<&mut Dataset, ApiError> {
        self.datasets
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| ApiError::not_found(format!("no dataset named {name:?}")))
    }
}

fn lock(state: &Mutex<ServerState>) -> MutexGuard<'_, ServerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    fn json<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_vec_pretty(value).context("encode response")?;
        Ok(Self {
            status: 200,
            content_type: "application/json",
            body,
        })
    }
}

#[derive(Debug)]
struct ApiError {
    status: u16,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: 404,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(CoreError::UnknownRecord { hash }) = err.downcast_ref::<CoreError>() {
            return Self::not_found(format!("no record with hash {hash:?}"));
        }
        Self {
            status: 500,
            message: format!("{err:#}"),
        }
    }
}

#[derive(Serialize)]
struct ErrorJson<'a> {
    error: &'a str,
}

#[derive(Serialize)]
struct DatasetListItem<'a> {
    name: &'a str,
    source: &'a str,
    labels: usize,
    records: usize,
    fonts: usize,
    invalid_records: usize,
    invalid_fonts: usize,
    completed_labels: usize,
}

#[derive(Serialize)]
struct LabelSummary<'a> {
    index: usize,
    label: &'a str,
    records: usize,
    completed: bool,
}

#[derive(Serialize)]
struct FontSummary<'a> {
    name: &'a str,
    records: usize,
    invalid: bool,
}

#[derive(Serialize)]
struct DatasetDetail<'a> {
    name: &'a str,
    source: &'a str,
    content: &'a str,
    labels: Vec<LabelSummary<'a>>,
    fonts: Vec<FontSummary<'a>>,
    records: usize,
    invalid_records: &'a [String],
    blank_combinations: usize,
    unsupported_combinations: usize,
    duplicate_hashes: usize,
}

#[derive(Serialize)]
struct RecordJson<'a> {
    #[serde(flatten)]
    record: &'a Record,
    invalid: bool,
}

#[derive(Serialize)]
struct ImageJson<'a> {
    hash: &'a str,
    #[serde(rename = "char")]
    character: &'a str,
    font: &'a str,
    image: String,
}

#[derive(Serialize)]
struct MarkJson<'a> {
    dataset: &'a str,
    changed: bool,
}

/// Dispatch one request. Never fails: errors become JSON error bodies.
pub fn route(state: &Mutex<ServerState>, req: &Request) -> Response {
    match dispatch(state, req) {
        Ok(resp) => resp,
        Err(err) => {
            if err.status >= 500 {
                tracing::warn!(path = %req.path, error = %err.message, "request failed");
            }
            let body = serde_json::to_vec(&ErrorJson {
                error: &err.message,
            })
            .unwrap_or_default();
            Response {
                status: err.status,
                content_type: "application/json",
                body,
            }
        }
    }
}

fn dispatch(state: &Mutex<ServerState>, req: &Request) -> Result<Response, ApiError> {
    let segments: Vec<String> = req
        .path
        .trim_matches('/')
        .split('/')
        .map(pct_decode)
        .collect::<Option<_>>()
        .ok_or_else(|| ApiError::bad_request("malformed percent-encoding in path"))?;
    let segs: Vec<&str> = segments.iter().map(String::as_str).collect();
    let method = req.method.as_str();
    let is_mark_method = method == "GET" || method == "POST";

    match (method, segs.as_slice()) {
        ("GET", ["api", "datasets"]) => list_datasets(&lock(state)),
        ("GET", ["api", "datasets", name]) => dataset_detail(&lock(state), name),
        ("GET", ["api", "datasets", name, label]) => label_records(&lock(state), name, label),
        ("POST", ["api", "images", name]) => {
            let hashes: Vec<String> = serde_json::from_slice(&req.body)
                .map_err(|e| ApiError::bad_request(format!("expected a JSON array of hashes: {e}")))?;
            images_json(&lock(state), name, &hashes)
        }
        ("GET", ["api", "duplicates", name]) => duplicates(&lock(state), name),
        (_, ["api", kind, action, name, value]) if is_mark_method => {
            let mark = parse_mark(kind, action, value)?;
            let mut st = lock(state);
            let dataset = st.dataset_mut(name)?;
            let changed = apply_mark(dataset, &mark)?;
            Response::json(&MarkJson {
                dataset: &dataset.name,
                changed,
            })
        }
        ("GET", ["images", name, hash]) => raw_image(&lock(state), name, hash),
        _ => Err(ApiError::not_found(format!("no route for {method} {}", req.path))),
    }
}

fn parse_mark(kind: &str, action: &str, value: &str) -> Result<Mark, ApiError> {
    let value = value.to_string();
    Ok(match (kind, action) {
        ("record", "invalid") => Mark::RecordInvalid(value),
        ("record", "valid") => Mark::RecordValid(value),
        ("font", "invalid") => Mark::FontInvalid(value),
        ("font", "valid") => Mark::FontValid(value),
        ("label", "complete") => Mark::LabelCompleted(value),
        ("label", "incomplete") => Mark::LabelIncompleted(value),
        _ => return Err(ApiError::not_found(format!("no mark {kind}/{action}"))),
    })
}

fn list_datasets(st: &ServerState) -> Result<Response, ApiError> {
    let items: Vec<DatasetListItem<'_>> = st
        .datasets
        .iter()
        .map(|d| DatasetListItem {
            name: &d.name,
            source: &d.metadata.source,
            labels: d.metadata.labels.len(),
            records: d.metadata.records.len(),
            fonts: d.metadata.fonts().len(),
            invalid_records: d.metadata.invalid_records.len(),
            invalid_fonts: d.metadata.invalid_fonts.len(),
            completed_labels: d.metadata.completed_labels.len(),
        })
        .collect();
    Response::json(&items)
}

fn dataset_detail(st: &ServerState, name: &str) -> Result<Response, ApiError> {
    let d = st.dataset(name)?;
    let m = &d.metadata;
    let mut per_label: HashMap<&str, usize> = HashMap::new();
    let mut per_font: BTreeMap<&str, usize> = BTreeMap::new();
    for r in &m.records {
        *per_label.entry(r.character.as_str()).or_default() += 1;
        *per_font.entry(r.font_name.as_str()).or_default() += 1;
    }
    let detail = DatasetDetail {
        name: &d.name,
        source: &m.source,
        content: &m.content,
        labels: m
            .labels
            .iter()
            .enumerate()
            .map(|(index, label)| LabelSummary {
                index,
                label,
                records: per_label.get(label.as_str()).copied().unwrap_or(0),
                completed: m.is_label_completed(label),
            })
            .collect(),
        fonts: per_font
            .into_iter()
            .map(|(name, records)| FontSummary {
                name,
                records,
                invalid: m.is_font_invalid(name),
            })
            .collect(),
        records: m.records.len(),
        invalid_records: &m.invalid_records,
        blank_combinations: m.blank_combinations.len(),
        unsupported_combinations: m.unsupported_combinations.len(),
        duplicate_hashes: find_duplicate_hashes(m).len(),
    };
    Response::json(&detail)
}

fn label_records(st: &ServerState, name: &str, label: &str) -> Result<Response, ApiError> {
    let d = st.dataset(name)?;
    if d.metadata.label_index(label).is_none() {
        return Err(ApiError::not_found(format!("no label {label:?} in {name}")));
    }
    let records: Vec<RecordJson<'_>> = d
        .metadata
        .records_for_label(label)
        .map(|record| RecordJson {
            record,
            invalid: d.metadata.is_excluded(record),
        })
        .collect();
    Response::json(&records)
}

fn images_json(st: &ServerState, name: &str, hashes: &[String]) -> Result<Response, ApiError> {
    let d = st.dataset(name)?;
    let fetched = fetch_images(d, hashes)?;
    let items: Vec<ImageJson<'_>> = fetched
        .iter()
        .map(|(r, bytes)| ImageJson {
            hash: &r.hash,
            character: &r.character,
            font: &r.font_name,
            image: BASE64_STANDARD.encode(bytes),
        })
        .collect();
    Response::json(&items)
}

fn duplicates(st: &ServerState, name: &str) -> Result<Response, ApiError> {
    let d = st.dataset(name)?;
    Response::json(&find_duplicate_hashes(&d.metadata))
}

fn raw_image(st: &ServerState, name: &str, hash: &str) -> Result<Response, ApiError> {
    let d = st.dataset(name)?;
    let record = d
        .metadata
        .find_record(hash)
        .ok_or_else(|| ApiError::not_found(format!("no record with hash {hash:?}")))?;
    let mut reader = d.reader()?;
    let body = reader
        .read_range(record.seek_start, record.seek_end)
        .with_context(|| format!("read record {hash}"))?;
    Ok(Response {
        status: 200,
        content_type: "image/png",
        body,
    })
}

fn handle_conn(stream: &mut TcpStream, state: &Arc<Mutex<ServerState>>) -> anyhow::Result<()> {
    let resp = match read_request(stream) {
        Ok(req) => {
            tracing::debug!(method = %req.method, path = %req.path, "request");
            route(state, &req)
        }
        Err(err) => Response {
            status: 400,
            content_type: "text/plain; charset=utf-8",
            body: format!("bad request: {err:#}\n").into_bytes(),
        },
    };
    write_response(stream, &resp).context("write response")
}

fn read_request<R: Read>(stream: &mut R) -> anyhow::Result<Request> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];
    let header_end;
    loop {
        let n = stream.read(&mut tmp).context("read socket")?;
        if n == 0 {
            anyhow::bail!("unexpected EOF");
        }
        buf.extend_from_slice(&tmp[..n]);
        if buf.len() > MAX_BODY_BYTES + 64 * 1024 {
            anyhow::bail!("request too large");
        }
        if let Some(pos) = find_header_end(&buf) {
            header_end = pos;
            break;
        }
    }

    let header_str = std::str::from_utf8(&buf[..header_end]).context("headers must be utf-8")?;
    let mut lines = header_str.split("\r\n");
    let request_line = lines.next().context("missing request line")?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().context("missing method")?.to_string();
    let raw_path = parts.next().context("missing path")?.to_string();
    let path = strip_query(&raw_path).to_string();

    let mut content_length: usize = 0;
    for line in lines {
        if line.is_empty() {
            break;
        }
        let Some((k, v)) = line.split_once(':') else {
            continue;
        };
        if k.trim().eq_ignore_ascii_case("content-length") {
            content_length = v.trim().parse().context("invalid content-length int")?;
        }
    }
    if content_length > MAX_BODY_BYTES {
        anyhow::bail!("body too large");
    }

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut tmp).context("read body")?;
        if n == 0 {
            anyhow::bail!("unexpected EOF reading body");
        }
        body.extend_from_slice(&tmp[..n]);
    }
    body.truncate(content_length);

    Ok(Request {
        method,
        path,
        body,
    })
}

fn write_response<W: Write>(stream: &mut W, resp: &Response) -> anyhow::Result<()> {
    let status_line = match resp.status {
        200 => "HTTP/1.1 200 OK",
        400 => "HTTP/1.1 400 Bad Request",
        404 => "HTTP/1.1 404 Not Found",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    write!(
        stream,
        "{status_line}\r\nContent-Type: {}\r\nContent-Length: {}\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n",
        resp.content_type,
        resp.body.len()
    )?;
    stream.write_all(&resp.body)?;
    Ok(())
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

/// Drop `?query`; no route takes query parameters.
fn strip_query(raw: &str) -> &str {
    raw.split_once('?').map_or(raw, |(path, _)| path)
}

/// Percent-decode one path segment. `+` is kept literally.
fn pct_decode(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len() {
                return None;
            }
            let hi = from_hex(bytes[i + 1])?;
            let lo = from_hex(bytes[i + 2])?;
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn from_hex(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
