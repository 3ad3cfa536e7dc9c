mod config;
mod logging;
mod native_messaging;
mod protocol;
mod state;
mod vectors;

use std::io::{stdin, stdout};

use anyhow::{bail, Context};
use serde_json::Value;

use crate::protocol::{AverageParams, ResponseErr, ResponseOk};
use crate::state::HostState;
use crate::vectors::{output_header, DocumentAverager, EmbeddingTable, SettingsParams};

fn main() {
    if let Err(e) = real_main() {
        // Keep stderr noisy for user bug reports; logs also go to file.
        eprintln!("[{}] fatal error: {e:?}", config::PLUGIN_NAME);
        log::error!("Fatal error: {:?}", e);
        std::process::exit(1);
    }
}

fn real_main() -> anyhow::Result<()> {
    let _logger = logging::init_logging()?;

    log::info!("=== {} Host Started ===", config::PLUGIN_NAME);
    log::info!("Waiting for messages from the front end...");

    let mut state = HostState::new();
    let mut in_stream = stdin();
    let mut out_stream = stdout();

    let mut message_count: u64 = 0;
    loop {
        let req = match native_messaging::read_message(&mut in_stream) {
            Ok(Some(r)) => r,
            Ok(None) => {
                log::info!("No more messages after {} messages, exiting", message_count);
                break;
            }
            Err(e) => {
                log::error!("Error reading message: {:?}", e);
                break;
            }
        };

        message_count += 1;
        log::info!(
            "Processing message #{}: {} (id: {})",
            message_count,
            req.method,
            req.id
        );

        let resp = handle_request(&mut state, &req.method, &req.id, &req.params);
        match resp {
            Ok(v) => {
                if let Err(e) = native_messaging::write_message(&mut out_stream, &v) {
                    log::error!("Error sending response: {:?}", e);
                    break;
                }
                if state.should_exit {
                    log::info!("Exiting process as requested by the front end");
                    break;
                }
            }
            Err(e) => {
                log::error!("Handler error: {:#}", e);
                let err = ResponseErr::new(&req.id, format!("{e:#}"));
                let _ = native_messaging::write_message(&mut out_stream, &err);
            }
        }
    }

    // Teardown: the table may be several GB, hand it back before exiting.
    if let Err(e) = state.release() {
        log::warn!("Could not release embedding table at exit: {}", e);
    }

    log::info!("=== {} Host Stopped ===", config::PLUGIN_NAME);
    Ok(())
}

fn handle_request(state: &mut HostState, method: &str, msg_id: &str, params: &Value) -> anyhow::Result<Value> {
    match method {
        "hello" => handle_hello(msg_id, params),
        "inspectSettings" => handle_inspect_settings(msg_id, params),
        "init" => handle_init(state, msg_id, params),
        "average" => handle_average(state, msg_id, params),
        "stats" => handle_stats(state, msg_id),
        "release" => handle_release(state, msg_id),
        "shutdown" => handle_shutdown(state, msg_id),
        _ => Ok(serde_json::to_value(ResponseErr::new(msg_id, format!("Unknown method: {method}")))?),
    }
}

fn handle_hello(msg_id: &str, params: &Value) -> anyhow::Result<Value> {
    let client_version = params.get("clientVersion").and_then(|v| v.as_str()).unwrap_or("unknown");
    log::info!(
        "Hello from client version {}, responding with host version {}",
        client_version,
        config::HOST_VERSION
    );

    ResponseOk::new(
        msg_id,
        serde_json::json!({
            "type": "hello-response",
            "pluginName": config::PLUGIN_NAME,
            "hostVersion": config::HOST_VERSION,
            "clientVersion": client_version
        }),
    )
    .into_value()
}

fn parse_settings(params: &Value) -> anyhow::Result<SettingsParams> {
    serde_json::from_value(params.clone()).context("invalid settings parameters")
}

fn handle_inspect_settings(msg_id: &str, params: &Value) -> anyhow::Result<Value> {
    let checked = parse_settings(params)?.validate();
    let result = match checked {
        Ok(settings) if settings.path.is_file() => serde_json::json!({ "ready": true }),
        Ok(settings) => serde_json::json!({
            "ready": false,
            "reason": format!("embedding file not found: {}", settings.path.display())
        }),
        Err(e) => serde_json::json!({ "ready": false, "reason": e.to_string() }),
    };
    ResponseOk::new(msg_id, result).into_value()
}

fn handle_init(state: &mut HostState, msg_id: &str, params: &Value) -> anyhow::Result<Value> {
    let settings = parse_settings(params)?.validate()?;

    // Never hold two tables at once: drop the old one before reading the new file.
    if state.table.is_some() {
        log::info!("Replacing previously loaded embedding table");
        state.release()?;
    }

    let table = EmbeddingTable::load(&settings)
        .with_context(|| format!("failed to load word vectors from {}", settings.path.display()))?;
    let stats = table.stats();
    let header = output_header(table.dimension());

    state.table = Some(table.into());
    state.settings = Some(settings);

    ResponseOk::new(
        msg_id,
        serde_json::json!({
            "stats": stats,
            "outputHeader": header
        }),
    )
    .into_value()
}

fn handle_average(state: &mut HostState, msg_id: &str, params: &Value) -> anyhow::Result<Value> {
    let table = state.table().context("no embedding table loaded; send init first")?;
    let req: AverageParams = serde_json::from_value(params.clone()).context("invalid average parameters")?;

    if let Some(segments) = &req.segment_numbers {
        if segments.len() != req.documents.len() {
            bail!(
                "segmentNumbers has {} entries but {} documents were sent",
                segments.len(),
                req.documents.len()
            );
        }
    }

    let averager = match req.dimension {
        Some(dimension) => DocumentAverager::new(dimension),
        None => DocumentAverager::for_table(&table),
    };
    let mut records = Vec::with_capacity(req.documents.len());
    let mut tokens = 0;
    let mut matched = 0;
    for document in &req.documents {
        let result = averager.average(document.as_slice(), &table)?;
        tokens += result.token_count;
        matched += result.matched_count;
        records.push(result.to_record());
    }
    log::info!(
        "Averaged {} documents ({} tokens, {} matched)",
        records.len(),
        tokens,
        matched
    );

    let segment_numbers = req
        .segment_numbers
        .unwrap_or_else(|| (0..req.documents.len()).map(Value::from).collect());

    ResponseOk::new(
        msg_id,
        serde_json::json!({
            "segmentNumbers": segment_numbers,
            "records": records
        }),
    )
    .into_value()
}

fn handle_stats(state: &HostState, msg_id: &str) -> anyhow::Result<Value> {
    let result = match (&state.table, &state.settings) {
        (Some(table), Some(settings)) => serde_json::json!({
            "loaded": true,
            "path": settings.path.to_string_lossy(),
            "encoding": settings.encoding.label(),
            "stats": table.stats()
        }),
        _ => serde_json::json!({ "loaded": false }),
    };
    ResponseOk::new(msg_id, result).into_value()
}

fn handle_release(state: &mut HostState, msg_id: &str) -> anyhow::Result<Value> {
    let released = state.release()?;
    let result = match released {
        Some(stats) => serde_json::json!({
            "released": true,
            "rows": stats.rows,
            "words": stats.words,
            "freedBytes": stats.freed_bytes
        }),
        None => serde_json::json!({ "released": false }),
    };
    ResponseOk::new(msg_id, result).into_value()
}

fn handle_shutdown(state: &mut HostState, msg_id: &str) -> anyhow::Result<Value> {
    state.should_exit = true;
    ResponseOk::new(msg_id, serde_json::json!({ "ok": true })).into_value()
}
