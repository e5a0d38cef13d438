use crate::AppState;
use crate::stats::{coinbase_reward, health, mined_since, utc_midnight};
use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use dda_core::address::is_valid_for_network;
use dda_core::amount::{coins_to_subunits, from_subunits};
use dda_rpc::{BlockResponse, RawTransaction, RpcError, SearchOptions, Verbosity};
use dda_wallet::balance_from_txs;

const DEFAULT_BLOCKS: u64 = 15;
const MAX_BLOCKS: u64 = 50;

// ── Error helper ─────────────────────────────────────────────────────────────

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    /// The node did not answer the first call of a page.
    fn node_down(e: RpcError) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            format!(
                "RPC error: {e} Ensure the DDACOIN node is running with RPC enabled \
                 (--rpcuser/--rpcpass) and that RPC_HOST/RPC_PORT (or RPC_URL) point to the node."
            ),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<RpcError> for ApiError {
    fn from(e: RpcError) -> Self {
        match e {
            // Lookups of unknown hashes and txids come back as node errors.
            RpcError::Node { .. } => ApiError::new(StatusCode::NOT_FOUND, e.to_string()),
            other => ApiError::new(StatusCode::BAD_GATEWAY, other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ── Router ───────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(web_ui))
        .route("/api/stats", get(stats))
        .route("/api/blocks", get(recent_blocks))
        .route("/api/block/:id", get(block_detail))
        .route("/api/tx/:txid", get(tx_detail))
        .route("/api/address/:addr", get(address_detail))
        .route("/api/search", get(search))
        .layer(cors)
        .with_state(state)
}

const INDEX_HTML: &str = include_str!("static/index.html");

async fn web_ui() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// ── /api/stats ────────────────────────────────────────────────────────────────

async fn stats(State(s): State<AppState>) -> ApiResult<Value> {
    let tip = s.rpc.get_block_count().await.map_err(ApiError::node_down)?;

    let (chain, peers, mining) = tokio::join!(
        s.rpc.get_blockchain_info(),
        s.rpc.get_peer_info(),
        s.rpc.get_mining_info(),
    );
    let chain = chain.inspect_err(|e| warn!(error = %e, "getblockchaininfo failed")).ok();
    let (health_label, health_pct) = match &chain {
        Some(info) => health(info),
        None => ("Unknown", "-".to_string()),
    };
    let mined = mined_since(&s.rpc, tip, utc_midnight(Utc::now())).await;

    Ok(Json(json!({
        "coin_name":     s.params.coin_name,
        "network":       s.params.name(),
        "height":        tip,
        "best_hash":     chain.as_ref().map(|c| c.bestblockhash.clone()),
        "health":        health_label,
        "health_pct":    health_pct,
        "peer_count":    peers.map(|p| p.len()).unwrap_or(0),
        "mined_today":   from_subunits(mined),
        "pending_tx":    mining.map(|m| m.pooledtx).unwrap_or(0),
    })))
}

// ── /api/blocks?limit=N&offset=M ──────────────────────────────────────────────

#[derive(Deserialize)]
struct BlocksQuery {
    limit: Option<u64>,
    offset: Option<u64>,
}

async fn recent_blocks(
    State(s): State<AppState>,
    Query(q): Query<BlocksQuery>,
) -> ApiResult<Value> {
    let limit = q.limit.unwrap_or(DEFAULT_BLOCKS).clamp(1, MAX_BLOCKS);
    let tip = s.rpc.get_block_count().await.map_err(ApiError::node_down)?;
    let offset = q.offset.unwrap_or(0);

    let mut blocks = Vec::new();
    if offset <= tip {
        let start = tip - offset;
        for height in (0..=start).rev().take(limit as usize) {
            let hash = s.rpc.get_block_hash(height).await?;
            let block = s.rpc.get_block(&hash, Verbosity::Summary).await?;
            if let Some(header) = block.header() {
                blocks.push(json!({
                    "hash":      header.hash,
                    "height":    header.height,
                    "time":      header.time,
                    "tx_count":  block.tx_count().unwrap_or(0),
                }));
            }
        }
    }

    Ok(Json(json!({
        "tip":    tip,
        "blocks": blocks,
    })))
}

// ── /api/block/:id ────────────────────────────────────────────────────────────

fn is_hash(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit())
}

async fn block_detail(
    State(s): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    // id is either a height (numeric) or a hash (64-char hex)
    let hash = if is_hash(&id) {
        id
    } else if let Ok(height) = id.parse::<u64>() {
        s.rpc.get_block_hash(height).await?
    } else {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("invalid block id: {id}"),
        ));
    };

    let block = match s.rpc.get_block(&hash, Verbosity::Full).await? {
        BlockResponse::Full(b) => b,
        _ => return Err(ApiError::new(StatusCode::BAD_GATEWAY, "unexpected block shape")),
    };

    let mut body = serde_json::to_value(&block.header)?;
    body["tx_count"] = json!(block.rawtx.len());
    body["reward"] = json!(from_subunits(coinbase_reward(&block)));
    body["txs"] = Value::Array(block.rawtx.iter().map(tx_summary).collect());
    Ok(Json(body))
}

fn tx_summary(tx: &RawTransaction) -> Value {
    json!({
        "txid":      tx.txid,
        "coinbase":  tx.is_coinbase(),
        "inputs":    tx.vin.len(),
        "outputs":   tx.vout.len(),
        "total_out": format_coins(tx.total_out()),
    })
}

fn format_coins(coins: f64) -> String {
    coins_to_subunits(coins).map(from_subunits).unwrap_or_default()
}

// ── /api/tx/:txid ─────────────────────────────────────────────────────────────

async fn tx_detail(
    State(s): State<AppState>,
    Path(txid): Path<String>,
) -> ApiResult<Value> {
    if !is_hash(&txid) {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, format!("invalid txid: {txid}")));
    }
    let tx = s.rpc.get_raw_transaction(&txid).await?;
    let mut body = serde_json::to_value(&tx)?;
    body["coinbase"] = json!(tx.is_coinbase());
    body["total_out"] = json!(format_coins(tx.total_out()));
    Ok(Json(body))
}

// ── /api/address/:addr ────────────────────────────────────────────────────────

async fn address_detail(
    State(s): State<AppState>,
    Path(addr): Path<String>,
) -> ApiResult<Value> {
    if !is_valid_for_network(&addr, s.params) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Invalid address for active network. {}", s.params.address_hint()),
        ));
    }

    let txs = match s
        .rpc
        .search_raw_transactions(&addr, SearchOptions::first(s.config.address_history_limit))
        .await
    {
        Ok(txs) => txs,
        Err(e) if e.is_unknown_address() => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    let summary = balance_from_txs(Some(txs.as_slice()), &addr);

    let tx_list: Vec<Value> = txs
        .iter()
        .map(|tx| json!({
            "txid":          tx.txid,
            "confirmations": tx.confirmations,
            "time":          tx.time,
        }))
        .collect();

    Ok(Json(json!({
        "address":          addr,
        "balance":          from_subunits(summary.balance),
        "balance_subunits": summary.balance,
        "utxo_count":       summary.utxos.len(),
        "utxos":            summary.utxos,
        "tx_count":         tx_list.len(),
        "txs":              tx_list,
    })))
}

// ── /api/search?q=... ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
}

async fn search(
    State(s): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> ApiResult<Value> {
    let q = q.q.trim().to_owned();
    if q.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "empty query"));
    }

    // Address
    if is_valid_for_network(&q, s.params) {
        return Ok(Json(json!({ "type": "address", "value": q })));
    }

    // Height
    if let Ok(height) = q.parse::<u64>() {
        let tip = s.rpc.get_block_count().await?;
        if height <= tip {
            return Ok(Json(json!({ "type": "block", "value": q })));
        }
    }

    // 64-char hex: block first, then tx
    if is_hash(&q) {
        if s.rpc.get_block(&q, Verbosity::Summary).await.is_ok() {
            return Ok(Json(json!({ "type": "block", "value": q })));
        }
        if s.rpc.get_raw_transaction(&q).await.is_ok() {
            return Ok(Json(json!({ "type": "tx", "value": q })));
        }
    }

    Err(ApiError::new(StatusCode::NOT_FOUND, format!("not found: {q}")))
}
