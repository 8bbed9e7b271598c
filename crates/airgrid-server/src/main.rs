#![doc = include_str!("../readme.md")]

mod cli;
mod web;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use warp::Filter;

use airgrid::json;
use cli::Options;
use web::{App, SharedApp};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = Options::parse();

    let filter = if options.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app: SharedApp = Arc::new(Mutex::new(App::new(options.max_triples)));

    if let Some(path) = &options.import {
        let mut guard = app.lock().await;
        json::import_json(&mut guard.manager, path)?;
        info!(path = %path.display(), "imported grid manager state on startup");
    }

    let routes = build_routes(app);
    let addr = (options.bind, options.port);
    info!(bind = %options.bind, port = options.port, "binding airgrid HTTP surface");
    warp::serve(routes).run(addr).await;
    Ok(())
}

/// Compose every endpoint `warp::Filter` per `SPEC_FULL.md` §4.10/§6, the
/// way the teacher binary's own `main.rs` composes its route set with
/// repeated `.or(...)` chains sharing a single cloned application handle.
fn build_routes(
    app: SharedApp,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    let with_app = warp::any().map(move || app.clone());

    let grids_generate = warp::path!("grids" / "generate")
        .and(warp::post())
        .and(with_app.clone())
        .and(warp::body::json())
        .and_then(web::grids_generate);

    let grids_get = warp::path!("grids" / String)
        .and(warp::get())
        .and(with_app.clone())
        .and_then(web::grids_get);

    let grids_encode = warp::path!("grids" / "encode")
        .and(warp::post())
        .and(with_app.clone())
        .and(warp::body::json())
        .and_then(web::grids_encode);

    let attributes_get = warp::path!("grids" / String / "attributes")
        .and(warp::get())
        .and(with_app.clone())
        .and_then(web::attributes_get);

    let attributes_put = warp::path!("grids" / String / "attributes")
        .and(warp::put())
        .and(with_app.clone())
        .and(warp::body::json())
        .and_then(web::attributes_put);

    let grids_search = warp::path!("grids" / "search")
        .and(warp::post())
        .and(with_app.clone())
        .and(warp::body::json())
        .and_then(web::grids_search);

    let grids_route = warp::path!("grids" / "route")
        .and(warp::post())
        .and(with_app.clone())
        .and(warp::body::json())
        .and_then(web::grids_route);

    let statistics = warp::path!("statistics")
        .and(warp::get())
        .and(with_app.clone())
        .and_then(web::statistics);

    let upload_existing_routes = warp::path!("upload_existing_routes")
        .and(warp::post())
        .and(with_app.clone())
        .and(warp::body::json())
        .and_then(web::upload_existing_routes);

    let upload_new_routes = warp::path!("upload_new_routes")
        .and(warp::post())
        .and(with_app.clone())
        .and(warp::body::json())
        .and_then(web::upload_new_routes);

    let detect_conflicts = warp::path!("detect_conflicts")
        .and(warp::post())
        .and(with_app.clone())
        .and(warp::body::json())
        .and_then(web::detect_conflicts);

    let clear_routes = warp::path!("clear_routes")
        .and(warp::post())
        .and(with_app.clone())
        .and_then(web::clear_routes);

    grids_generate
        .or(grids_get)
        .or(grids_encode)
        .or(attributes_get)
        .or(attributes_put)
        .or(grids_search)
        .or(grids_route)
        .or(statistics)
        .or(upload_existing_routes)
        .or(upload_new_routes)
        .or(detect_conflicts)
        .or(clear_routes)
        .recover(web::handle_rejection)
}
