//! Digivolve HTTP server.
//!
//! Keeps one evolution dataset loaded in memory and answers lineage queries
//! over a small JSON API. The dataset is read-only; `POST /admin/reload`
//! rebuilds it from the source table and swaps it in. In-flight requests keep
//! the snapshot they started with.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;
use url::form_urlencoded;

use digivolve_ingest_table::LoadReport;
use digivolve_query::{EvolutionService, LineageOptions};

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
struct ServerConfig {
    listen: SocketAddr,
    data: PathBuf,
    ready_file: Option<PathBuf>,
}

/// One loaded dataset. Replaced wholesale on reload.
struct LoadedDataset {
    service: EvolutionService,
    report: LoadReport,
    loaded_at_unix_secs: u64,
}

struct ServerState {
    config: ServerConfig,
    loaded: RwLock<Arc<LoadedDataset>>,
}

impl ServerState {
    fn snapshot(&self) -> Result<Arc<LoadedDataset>> {
        let guard = self
            .loaded
            .read()
            .map_err(|_| anyhow!("dataset lock poisoned"))?;
        Ok(guard.clone())
    }
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// `--listen` when given, otherwise `0.0.0.0:$PORT`.
fn resolve_listen(listen: Option<SocketAddr>, port_env: Option<&str>) -> Result<SocketAddr> {
    if let Some(addr) = listen {
        return Ok(addr);
    }
    let port = match port_env.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => p
            .parse::<u16>()
            .with_context(|| format!("serve: invalid PORT value `{p}`"))?,
        None => DEFAULT_PORT,
    };
    Ok(SocketAddr::from(([0, 0, 0, 0], port)))
}

pub(crate) fn cmd_serve(args: crate::ServeArgs) -> Result<()> {
    let port_env = std::env::var("PORT").ok();
    let config = ServerConfig {
        listen: resolve_listen(args.listen, port_env.as_deref())?,
        data: args.data.data,
        ready_file: args.ready_file,
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to initialize tokio runtime: {e}"))?;

    rt.block_on(async move { serve_async(config).await })
}

fn load_dataset(path: &Path) -> Result<LoadedDataset> {
    let (service, report) = crate::load_service(path)?;
    Ok(LoadedDataset {
        service,
        report,
        loaded_at_unix_secs: now_unix_secs(),
    })
}

async fn serve_async(config: ServerConfig) -> Result<()> {
    let initial = tokio::task::spawn_blocking({
        let path = config.data.clone();
        move || load_dataset(&path)
    })
    .await
    .map_err(|e| anyhow!("serve: failed to join loader task: {e}"))??;

    tracing::info!(
        path = %config.data.display(),
        records = initial.report.records,
        edges = initial.report.edges,
        "dataset loaded"
    );

    let state = Arc::new(ServerState {
        config: config.clone(),
        loaded: RwLock::new(Arc::new(initial)),
    });

    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(|e| anyhow!("serve: failed to bind {}: {e}", config.listen))?;
    let bound = listener
        .local_addr()
        .map_err(|e| anyhow!("serve: failed to read bound addr: {e}"))?;

    tracing::info!(addr = %bound, "listening on http://{bound}");
    if let Some(path) = config.ready_file.as_ref() {
        write_ready_file(path, bound);
    }

    loop {
        let (stream, _peer) = listener
            .accept()
            .await
            .map_err(|e| anyhow!("serve: accept failed: {e}"))?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(req, state.clone()));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(error = %e, "connection error");
            }
        });
    }
}

/// Written to a temporary name first so readers never see a partial file.
fn write_ready_file(path: &Path, bound: SocketAddr) {
    let payload = serde_json::json!({
        "addr": bound.to_string(),
        "pid": std::process::id(),
    });
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let tmp = path.with_extension("tmp");
    let text = serde_json::to_string_pretty(&payload).unwrap_or_default();
    if let Err(e) = std::fs::write(&tmp, text).and_then(|_| std::fs::rename(&tmp, path)) {
        tracing::warn!(path = %path.display(), error = %e, "failed to write ready file");
    }
}

// ============================================================================
// Routing
// ============================================================================

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ServerState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let query = req.uri().query().map(str::to_string);

    let segments = match path_segments(req.uri().path()) {
        Ok(s) => s,
        Err(e) => return Ok(json_error(StatusCode::BAD_REQUEST, &e.to_string())),
    };
    let segs: Vec<&str> = segments.iter().map(String::as_str).collect();

    tracing::debug!(method = %method, path = %req.uri().path(), "request");

    let resp = match (method, segs.as_slice()) {
        (Method::OPTIONS, _) => preflight_response(),
        (Method::GET, []) => json_response(StatusCode::OK, &index_payload()),
        (Method::GET, ["health"]) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "status": "healthy", "service": "online" }),
        ),
        (Method::GET, ["status"]) => match status_payload(&state) {
            Ok(v) => json_response(StatusCode::OK, &v),
            Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        },
        (Method::GET, ["api", "evolution", name]) => {
            match handle_evolution(&state, name, query.as_deref()) {
                Ok(r) => r,
                Err(e) => json_error(StatusCode::BAD_REQUEST, &e.to_string()),
            }
        }
        (Method::GET, ["api", "evolution", name, "next"]) => {
            with_dataset(&state, |d| d.service.next_evolutions(name), name)
        }
        (Method::GET, ["api", "evolution", name, "previous"]) => {
            with_dataset(&state, |d| d.service.previous_evolutions(name), name)
        }
        (Method::GET, ["api", "evolution", name, "summary"]) => {
            with_dataset(&state, |d| d.service.evolution_summary(name), name)
        }
        (Method::GET, ["api", "can-evolve", from, to]) => {
            with_dataset(&state, |d| d.service.can_evolve(from, to), from)
        }
        (Method::POST, ["admin", "reload"]) => match reload_now(&state).await {
            Ok(v) => json_response(StatusCode::OK, &v),
            Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, &format!("{e:#}")),
        },
        _ => json_error(StatusCode::NOT_FOUND, "not found"),
    };

    Ok(resp)
}

/// Split a request path into percent-decoded segments.
fn path_segments(path: &str) -> Result<Vec<String>> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s)
                .map(|c| c.into_owned())
                .map_err(|e| anyhow!("invalid path segment `{s}`: {e}"))
        })
        .collect()
}

fn parse_query_params(query: Option<&str>) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let Some(q) = query else {
        return out;
    };
    for (k, v) in form_urlencoded::parse(q.as_bytes()) {
        out.insert(k.into_owned(), v.into_owned());
    }
    out
}

fn parse_depth(query: Option<&str>) -> Result<LineageOptions> {
    let params = parse_query_params(query);
    let depth = match params.get("depth").map(|s| s.trim()) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<usize>()
                .map_err(|_| anyhow!("invalid depth `{raw}` (expected a non-negative integer)"))?,
        ),
    };
    Ok(LineageOptions::with_max_depth(depth))
}

// ============================================================================
// Handlers
// ============================================================================

fn index_payload() -> serde_json::Value {
    serde_json::json!({
        "message": "Digimon Evolution API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "search_evolution": "/api/evolution/{digimon_name}",
            "next_evolutions": "/api/evolution/{digimon_name}/next",
            "previous_evolutions": "/api/evolution/{digimon_name}/previous",
            "summary": "/api/evolution/{digimon_name}/summary",
            "can_evolve": "/api/can-evolve/{from_digimon}/{to_digimon}",
            "health": "/health",
            "status": "/status",
            "reload": "POST /admin/reload",
        },
    })
}

fn status_payload(state: &ServerState) -> Result<serde_json::Value> {
    let dataset = state.snapshot()?;
    Ok(serde_json::json!({
        "data": state.config.data.display().to_string(),
        "loaded_at_unix_secs": dataset.loaded_at_unix_secs,
        "digimon": dataset.service.graph().len(),
        "evolutions": dataset.service.graph().edge_count(),
        "report": dataset.report,
    }))
}

fn handle_evolution(
    state: &ServerState,
    name: &str,
    query: Option<&str>,
) -> Result<Response<Full<Bytes>>> {
    let options = parse_depth(query)?;
    let dataset = state.snapshot()?;
    let response = dataset.service.get_evolution_line_with(name, options);
    let status = if response.is_found() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok(json_response(status, &response))
}

/// Run `f` against the current dataset; `None` becomes a 404 naming `name`.
fn with_dataset<T, F>(state: &ServerState, f: F, name: &str) -> Response<Full<Bytes>>
where
    T: Serialize,
    F: FnOnce(&LoadedDataset) -> Option<T>,
{
    match state.snapshot() {
        Ok(dataset) => match f(&dataset) {
            Some(v) => json_response(StatusCode::OK, &v),
            None => json_error(StatusCode::NOT_FOUND, &format!("Digimon not found: {name}")),
        },
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// Rebuild from the source table. On failure the current dataset stays.
async fn reload_now(state: &Arc<ServerState>) -> Result<serde_json::Value> {
    let loaded = tokio::task::spawn_blocking({
        let path = state.config.data.clone();
        move || load_dataset(&path)
    })
    .await
    .map_err(|e| anyhow!("reload task join failed: {e}"))?;

    let loaded = match loaded {
        Ok(l) => l,
        Err(e) => {
            let error = format!("{e:#}");
            tracing::warn!(%error, "reload failed; keeping current dataset");
            return Err(e);
        }
    };

    tracing::info!(
        records = loaded.report.records,
        edges = loaded.report.edges,
        "dataset reloaded"
    );
    {
        let mut guard = state
            .loaded
            .write()
            .map_err(|_| anyhow!("dataset lock poisoned"))?;
        *guard = Arc::new(loaded);
    }

    status_payload(state)
}

// ============================================================================
// Responses
// ============================================================================

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{\"error\":\"serialize\"}".to_vec());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"{\"error\":\"internal\"}"))))
}

fn json_error(status: StatusCode, msg: &str) -> Response<Full<Bytes>> {
    let v = serde_json::json!({ "error": msg });
    json_response(status, &v)
}

fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS")
        .header(ACCESS_CONTROL_ALLOW_HEADERS, "*")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}
