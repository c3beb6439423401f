//! Small service exercising the request context pipeline over HTTP.
//!
//! ```text
//! GET  /health          -> 200 "ok"
//! GET  /items/{id}      -> 200 JSON, 404 for id "missing"
//! POST /items           -> 201 echo of the decoded JSON item
//! GET  /quota           -> 429 from an over-quota error
//! GET  /whoami          -> caller from the x-user header, 401 without it
//! ```

use anyhow::Context;
use clap::Parser;
use http::{Method, StatusCode};
use reqctx::chain::HandlerChain;
use reqctx::config::PipelineConfig;
use reqctx::dispatch::{NotFound, OverQuota, ResultExt};
use reqctx::logging::{self, LogConfig, LogFormat};
use reqctx::pipeline::PipelineBuilder;
use reqctx::platform;
use reqctx::request;
use reqctx::server::{ContextService, HttpServer, RouteMatch};
use reqctx::store::Store;
use reqctx::{user, writer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "reqctx-demo")]
#[command(about = "Serve a few handler chains through the reqctx pipeline", long_about = None)]
struct Args {
    /// Address to bind
    #[arg(short, long, env = "REQCTX_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,

    /// Override REQCTX_LOG_FORMAT (json/pretty)
    #[arg(long)]
    log_format: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Item {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct ItemView<'a> {
    id: &'a str,
    namespace: Option<&'a str>,
    served_by: Option<String>,
}

fn health() -> HandlerChain {
    HandlerChain::single("health", |store| {
        writer::text(store, StatusCode::OK, "ok")?;
        Ok(())
    })
}

fn get_item() -> HandlerChain {
    HandlerChain::builder()
        .handler("load-item", |store| {
            if store.form_value("id") == "missing" {
                return Err(NotFound.into());
            }
            Ok(())
        })
        .handler("render-item", |store| {
            let id = store.form_value("id").to_string();
            let served_by = platform::hostname(store).ok();
            let view = ItemView {
                id: &id,
                namespace: store.namespace(),
                served_by,
            };
            let body = serde_json::to_vec(&view)?;
            writer::json_payload(store, StatusCode::OK, body)?;
            Ok(())
        })
        .build()
}

fn create_item() -> HandlerChain {
    HandlerChain::single("create-item", |store| {
        let item: Item = request::decode(store)?;
        logging::logger_for(store).info(store, format_args!("created item {}", item.id));
        writer::json(store, StatusCode::CREATED, &item)?;
        Ok(())
    })
}

fn quota() -> HandlerChain {
    HandlerChain::single("quota", |_| Err(OverQuota.into()))
}

fn whoami() -> HandlerChain {
    HandlerChain::single("whoami", |store| {
        let caller: String = user::user(store).with_status(StatusCode::UNAUTHORIZED)?;
        writer::text(store, StatusCode::OK, caller)?;
        Ok(())
    })
}

struct Routes {
    health: HandlerChain,
    get_item: HandlerChain,
    create_item: HandlerChain,
    quota: HandlerChain,
    whoami: HandlerChain,
}

fn caller_from_header(store: &Store) -> anyhow::Result<String> {
    store
        .request()
        .and_then(|r| r.header("x-user"))
        .map(str::to_string)
        .context("no x-user header")
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut log_config = LogConfig::from_env();
    if let Some(format) = &args.log_format {
        log_config.format = LogFormat::parse(format);
    }
    let _guard = logging::init(&log_config)?;

    let config = PipelineConfig::from_env();
    may::config().set_stack_size(config.stack_size);
    info!(
        platform = %config.platform,
        build_policy = ?config.build_policy,
        stack_size = config.stack_size,
        "Pipeline configured"
    );

    let pipeline = PipelineBuilder::from_config(&config)
        .user_resolver::<String>(Arc::new(caller_from_header))
        .build();

    let chains = Routes {
        health: health(),
        get_item: get_item(),
        create_item: create_item(),
        quota: quota(),
        whoami: whoami(),
    };
    let router = move |method: &Method, path: &str| -> Option<RouteMatch> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match (method.as_str(), segments.as_slice()) {
            ("GET", ["health"]) => Some(RouteMatch::new(chains.health.clone())),
            ("GET", ["items", id]) => Some(RouteMatch::new(chains.get_item.clone()).with_var("id", *id)),
            ("POST", ["items"]) => Some(RouteMatch::new(chains.create_item.clone())),
            ("GET", ["quota"]) => Some(RouteMatch::new(chains.quota.clone())),
            ("GET", ["whoami"]) => Some(RouteMatch::new(chains.whoami.clone())),
            _ => None,
        }
    };

    let service = ContextService::new(pipeline, Arc::new(router));
    let handle = HttpServer(service).start(args.addr.as_str())?;
    info!(addr = %handle.addr(), "reqctx-demo listening");

    wait_for_shutdown(handle)
}

#[cfg(unix)]
fn wait_for_shutdown(handle: reqctx::server::ServerHandle) -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    handle.stop();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: reqctx::server::ServerHandle) -> anyhow::Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server coroutine panicked: {e:?}"))
}
