//! HTTP handlers (C9): one function per endpoint, composed into
//! `warp::Filter`s in `main.rs` the way the teacher binary's own
//! `web.rs` composes its routes. Every response body is `{ "success":
//! true, "data": ... }` or `{ "success": false, "error": "..." }`
//! (`SPEC_FULL.md` §6), matching the Flask service this surface is
//! modelled on.

use std::convert::Infallible;
use std::sync::Arc;

use airgrid::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::reply::Reply;

/// The state shared across every handler: the grid manager plus the two
/// route buffers the conflict-detector family accumulates into until
/// `clear_routes` is called (§4.10 "the conflict family accumulates
/// uploaded routes in the same shared handle").
pub struct App {
    pub manager: Manager,
    pub existing_routes: Vec<ConflictRoute>,
    pub new_routes: Vec<ConflictRoute>,
    pub max_triples: usize,
}

pub type SharedApp = Arc<Mutex<App>>;

impl App {
    pub fn new(max_triples: usize) -> Self {
        App { manager: Manager::new(), existing_routes: Vec::new(), new_routes: Vec::new(), max_triples }
    }
}

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Wraps `data` in the success envelope with a `200 OK` status.
fn ok<T: Serialize>(data: T) -> warp::reply::WithStatus<warp::reply::Json> {
    let json = warp::reply::json(&Envelope { success: true, data: Some(data), error: None });
    warp::reply::with_status(json, StatusCode::OK)
}

/// Wraps a plain message in the failure envelope, at the given status.
fn err_reply(message: impl Into<String>, status: StatusCode) -> warp::reply::WithStatus<warp::reply::Json> {
    let json = warp::reply::json(&Envelope::<()> { success: false, data: None, error: Some(message.into()) });
    warp::reply::with_status(json, status)
}

/// Maps a domain `Error` to its HTTP status per `SPEC_FULL.md` §7: `404`
/// for an unknown code, `500` for I/O/JSON failures, `400` otherwise.
fn domain_error_reply(e: Error) -> warp::reply::WithStatus<warp::reply::Json> {
    let status = match &e {
        Error::UnknownCode(_) => StatusCode::NOT_FOUND,
        Error::Io(_) | Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    let json = warp::reply::json(&Envelope::<()> { success: false, data: None, error: Some(e.to_string()) });
    warp::reply::with_status(json, status)
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    lon_min: f64,
    lon_max: f64,
    lat_min: f64,
    lat_max: f64,
    level: u8,
    #[serde(default)]
    alt_min: Option<f64>,
    #[serde(default)]
    alt_max: Option<f64>,
}

pub async fn grids_generate(app: SharedApp, req: GenerateRequest) -> Result<impl Reply, Infallible> {
    let mut app = app.lock().await;
    let bbox = BBox::new(req.lon_min, req.lon_max, req.lat_min, req.lat_max);
    match app.manager.generate(bbox, req.level, req.alt_min.unwrap_or(0.0), req.alt_max.unwrap_or(1000.0)) {
        Ok(cells) => Ok(ok(cells)),
        Err(e) => Ok(domain_error_reply(e)),
    }
}

pub async fn grids_get(code: String, app: SharedApp) -> Result<impl Reply, Infallible> {
    let app = app.lock().await;
    match app.manager.get_by_code(&code) {
        Ok(cell) => Ok(ok(cell.clone())),
        Err(e) => Ok(domain_error_reply(e)),
    }
}

#[derive(Deserialize)]
pub struct EncodeRequest {
    lon: f64,
    lat: f64,
    alt: f64,
    level: u8,
}

pub async fn grids_encode(app: SharedApp, req: EncodeRequest) -> Result<impl Reply, Infallible> {
    let app = app.lock().await;
    match app.manager.encode_coords(req.lon, req.lat, req.alt, req.level) {
        Ok(code) => Ok(ok(code)),
        Err(e) => Ok(domain_error_reply(e)),
    }
}

pub async fn attributes_get(code: String, app: SharedApp) -> Result<impl Reply, Infallible> {
    let app = app.lock().await;
    Ok(ok(app.manager.get_attributes(&code)))
}

#[derive(Deserialize)]
pub struct AttributePutRequest {
    category: String,
    key: String,
    value: String,
}

pub async fn attributes_put(code: String, app: SharedApp, req: AttributePutRequest) -> Result<impl Reply, Infallible> {
    let mut app = app.lock().await;
    match Category::parse(&req.category) {
        Ok(category) => {
            app.manager.put_attribute(&code, category, &req.key, &req.value);
            Ok(ok(()))
        }
        Err(e) => Ok(domain_error_reply(e)),
    }
}

#[derive(Deserialize)]
pub struct SearchRequest {
    category: String,
    key: String,
    value: String,
}

pub async fn grids_search(app: SharedApp, req: SearchRequest) -> Result<impl Reply, Infallible> {
    let app = app.lock().await;
    match Category::parse(&req.category) {
        Ok(category) => {
            let cells: Vec<Cell> = app.manager.search(category, &req.key, &req.value).into_iter().cloned().collect();
            Ok(ok(cells))
        }
        Err(e) => Ok(domain_error_reply(e)),
    }
}

#[derive(Deserialize)]
pub struct RouteRequest {
    waypoints: Vec<[f64; 3]>,
    level: u8,
    #[serde(default)]
    bbox: Option<[f64; 4]>,
}

pub async fn grids_route(app: SharedApp, req: RouteRequest) -> Result<impl Reply, Infallible> {
    let app = app.lock().await;
    let waypoints: Vec<Waypoint> =
        req.waypoints.iter().map(|p| Waypoint { lon: p[0], lat: p[1], alt: p[2] }).collect();
    let bbox = req.bbox.map(|b| BBox::new(b[0], b[2], b[1], b[3]));
    match app.manager.route(&waypoints, req.level, bbox) {
        Ok((codes, last_cell)) => Ok(ok((codes, last_cell))),
        Err(e) => Ok(domain_error_reply(e)),
    }
}

pub async fn statistics(app: SharedApp) -> Result<impl Reply, Infallible> {
    let app = app.lock().await;
    let stats = app.manager.stats();
    Ok(ok((stats.total, stats.per_level)))
}

#[derive(Deserialize)]
struct UploadedGeometry {
    coordinates: [f64; 3],
}

#[derive(Deserialize)]
struct UploadedPoint {
    expected_time_seconds: u32,
    geometry: UploadedGeometry,
}

#[derive(Deserialize)]
struct UploadedChannel {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    points: Vec<UploadedPoint>,
}

#[derive(Deserialize)]
pub struct UploadRoutesRequest {
    channels: Vec<UploadedChannel>,
}

fn parse_channels(req: UploadRoutesRequest) -> Vec<ConflictRoute> {
    req.channels
        .into_iter()
        .enumerate()
        .map(|(idx, channel)| ConflictRoute {
            id: channel.id.unwrap_or_else(|| format!("route_{idx}")),
            name: channel.name.unwrap_or_else(|| format!("Route {idx}")),
            points: channel
                .points
                .into_iter()
                .map(|p| TrajectoryPoint {
                    t: p.expected_time_seconds,
                    lon: p.geometry.coordinates[0],
                    lat: p.geometry.coordinates[1],
                    alt: p.geometry.coordinates[2],
                })
                .collect(),
        })
        .collect()
}

pub async fn upload_existing_routes(app: SharedApp, req: UploadRoutesRequest) -> Result<impl Reply, Infallible> {
    let mut app = app.lock().await;
    let routes = parse_channels(req);
    let count = routes.len();
    app.existing_routes = routes;
    Ok(ok(count))
}

pub async fn upload_new_routes(app: SharedApp, req: UploadRoutesRequest) -> Result<impl Reply, Infallible> {
    let mut app = app.lock().await;
    let routes = parse_channels(req);
    let count = routes.len();
    app.new_routes = routes;
    Ok(ok(count))
}

#[derive(Deserialize)]
pub struct DetectConflictsRequest {
    #[serde(default = "default_epsilon")]
    epsilon: f64,
    #[serde(default = "default_max_time_steps")]
    max_time_steps: u32,
}

fn default_epsilon() -> f64 {
    0.001
}

fn default_max_time_steps() -> u32 {
    20_000
}

#[derive(Serialize)]
struct ConflictResponse {
    status: &'static str,
    num_existing_routes: usize,
    num_new_routes: usize,
    conflict_count: usize,
    conflict_times: Vec<u32>,
    conflicts: Vec<ConflictTriple>,
}

#[derive(Serialize)]
struct ConflictTriple {
    time_step: u32,
    existing_route_id: String,
    new_route_id: String,
}

pub async fn detect_conflicts(app: SharedApp, req: DetectConflictsRequest) -> Result<impl Reply, Infallible> {
    let app = app.lock().await;
    let report = detect(&app.existing_routes, &app.new_routes, req.epsilon, req.max_time_steps, app.max_triples);
    if report.truncated {
        warn!(count = report.conflict_count, cap = app.max_triples, "conflict response truncated at capacity");
    }
    let conflicts = report
        .conflicts
        .iter()
        .map(|c| ConflictTriple {
            time_step: c.t,
            existing_route_id: app.existing_routes[c.existing_index].id.clone(),
            new_route_id: app.new_routes[c.new_index].id.clone(),
        })
        .collect();
    Ok(ok(ConflictResponse {
        status: "success",
        num_existing_routes: report.num_existing_routes,
        num_new_routes: report.num_new_routes,
        conflict_count: report.conflict_count,
        conflict_times: report.conflict_times,
        conflicts,
    }))
}

pub async fn clear_routes(app: SharedApp) -> Result<impl Reply, Infallible> {
    let mut app = app.lock().await;
    app.existing_routes.clear();
    app.new_routes.clear();
    Ok(ok(()))
}

/// Translates domain errors and filter rejections into the uniform
/// `{ "success": false, "error": "..." }` body, mirroring the teacher
/// binary's own `handle_rejection`.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "route not found".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("malformed request body: {e}"))
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "unhandled rejection".to_string())
    };
    Ok(err_reply(message, code))
}
