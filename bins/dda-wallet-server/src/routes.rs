//! Axum router and HTTP handlers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cookie::{Cookie, SameSite};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use dda_core::Address;
use dda_core::amount::{from_subunits, to_subunits};
use dda_core::constants::SESSION_TTL_SECS;
use dda_rpc::SearchOptions;
use dda_wallet::mnemonic::{generate_mnemonic, normalize_mnemonic, validate_mnemonic};
use dda_wallet::{Credential, Session, WalletError, balance_from_txs};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::qr;
use crate::send::{SendPolicy, send_payment};

// Embed the web UI at compile time.
const INDEX_HTML: &str = include_str!("static/index.html");

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "wallet_session";

/// Shown instead of the node's message when the address index has never
/// seen the wallet's address.
const UNKNOWN_ADDRESS_HINT: &str = "No transaction history for this address. If you expect a balance \
(e.g. mining payout), ensure this wallet address matches MINING_ADDR in your node's .env and that \
the node has indexed the chain (--addrindex).";

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(web_ui))
        .route("/api/status", get(api_status))
        .route("/api/wallet/create", post(wallet_create))
        .route("/api/wallet/restore", post(wallet_restore))
        .route("/api/wallet/import", post(wallet_import))
        .route("/api/wallet/logout", post(wallet_logout))
        .route("/api/wallet/info", get(wallet_info))
        .route("/api/wallet/balance", get(wallet_balance))
        .route("/api/wallet/receive", get(wallet_receive))
        .route("/api/wallet/send", post(wallet_send))
        .fallback(web_ui)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Session cookie
// ---------------------------------------------------------------------------

fn session_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

fn session_cookie(token: String) -> String {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(SESSION_TTL_SECS))
        .build()
        .to_string()
}

fn removal_cookie() -> String {
    let mut cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    cookie.make_removal();
    cookie.to_string()
}

/// A live session, required by the handler.
pub struct AuthSession {
    pub token: String,
    pub session: Arc<Session>,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = session_token(parts).ok_or(ApiError::Unauthorized)?;
        let session = state
            .sessions
            .lookup(&token)
            .await
            .ok_or(ApiError::Unauthorized)?;
        Ok(AuthSession { token, session })
    }
}

/// The cookie token and its live session, either of which may be absent.
pub struct MaybeSession {
    pub token: Option<String>,
    pub session: Option<Arc<Session>>,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Infallible> {
        let token = session_token(parts);
        let session = match &token {
            Some(t) => state.sessions.lookup(t).await,
            None => None,
        };
        Ok(MaybeSession { token, session })
    }
}

/// Start a session for `credential`, remember the address, and answer with
/// `body` plus the session cookie.
async fn unlock(
    state: &AppState,
    credential: Credential,
    address: Address,
    body: Value,
) -> Response {
    let kind = credential.kind();
    state
        .prefs
        .remember(address.as_str(), &state.config.rpc_host, state.config.rpc_port)
        .await;
    info!(%address, kind, "wallet unlocked");
    let token = state.sessions.create(credential, address).await;
    (
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(token))],
        Json(body),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Serve the embedded web UI.
async fn web_ui() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /api/status` — node reachability and height.
async fn api_status(State(state): State<AppState>) -> Json<Value> {
    match state.rpc.check_connection().await {
        Ok(height) => Json(json!({ "ok": true, "blockHeight": height })),
        Err(e) => {
            warn!(error = %e, "node status check failed");
            let hint = format!(
                " Ensure the node is running, configured for {}, listens on --rpclisten=0.0.0.0:{}, \
                 and RPC_USER/RPC_PASS match the node's --rpcuser/--rpcpass.",
                state.params.name(),
                state.params.default_rpc_port
            );
            Json(json!({ "ok": false, "error": format!("{e}{hint}") }))
        }
    }
}

/// `POST /api/wallet/create` — new phrase, new session.
async fn wallet_create(State(state): State<AppState>) -> ApiResult<Response> {
    let phrase = generate_mnemonic()?;
    let credential = Credential::mnemonic(&phrase);
    let key = credential.derive(state.params)?;
    let body = json!({ "mnemonic": phrase, "address": key.address.as_str() });
    Ok(unlock(&state, credential, key.address, body).await)
}

#[derive(Deserialize)]
struct RestoreRequest {
    mnemonic: Option<String>,
}

/// `POST /api/wallet/restore` — session from an existing phrase.
async fn wallet_restore(
    State(state): State<AppState>,
    body: Result<Json<RestoreRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let phrase = body
        .ok()
        .and_then(|Json(r)| r.mnemonic)
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing or invalid mnemonic"))?;
    let normalized = normalize_mnemonic(&phrase);
    if !validate_mnemonic(&normalized) {
        return Err(ApiError::bad_request("Invalid mnemonic phrase"));
    }
    let credential = Credential::mnemonic(&normalized);
    let key = credential.derive(state.params)?;
    let body = json!({ "address": key.address.as_str() });
    Ok(unlock(&state, credential, key.address, body).await)
}

#[derive(Deserialize)]
struct ImportRequest {
    wif: Option<String>,
}

/// `POST /api/wallet/import` — session from a WIF private key.
async fn wallet_import(
    State(state): State<AppState>,
    body: Result<Json<ImportRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let wif = body
        .ok()
        .and_then(|Json(r)| r.wif)
        .filter(|w| !w.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing or invalid WIF (private key)"))?;
    let credential = Credential::wif(&wif);
    let key = credential.derive(state.params)?;
    let body = json!({ "address": key.address.as_str() });
    Ok(unlock(&state, credential, key.address, body).await)
}

/// `POST /api/wallet/logout` — forget the session and clear the cookie.
async fn wallet_logout(State(state): State<AppState>, session: MaybeSession) -> Response {
    if let Some(token) = &session.token {
        if state.sessions.destroy(token).await {
            info!("wallet locked");
        }
        state.send_locks.forget(token);
    }
    (
        StatusCode::OK,
        [(header::SET_COOKIE, removal_cookie())],
        Json(json!({ "ok": true })),
    )
        .into_response()
}

/// `GET /api/wallet/info` — whether a wallet is unlocked, and which.
async fn wallet_info(State(state): State<AppState>, session: MaybeSession) -> Json<Value> {
    let network = state.params.name();
    match session.session {
        Some(s) => Json(json!({
            "hasSession": true,
            "address": s.address.as_str(),
            "network": network,
        })),
        None => {
            let mut body = json!({ "hasSession": false, "network": network });
            if let Some(last) = state.prefs.last_address() {
                body["lastAddress"] = Value::String(last);
            }
            Json(body)
        }
    }
}

/// `GET /api/wallet/balance` — confirmed and mempool balance from history.
///
/// Node failures are reported in an `error` field with a zero balance so the
/// UI can keep rendering.
async fn wallet_balance(State(state): State<AppState>, auth: AuthSession) -> Json<Value> {
    let address = auth.session.address.as_str();
    let lookup = state
        .rpc
        .search_raw_transactions(address, SearchOptions::first(state.config.history_limit))
        .await;
    match lookup {
        Ok(txs) => {
            let summary = balance_from_txs(Some(txs.as_slice()), address);
            Json(json!({
                "balance": summary.balance,
                "balanceFormatted": from_subunits(summary.balance),
                "utxoCount": summary.utxos.len(),
            }))
        }
        Err(e) => {
            let error = if e.is_unknown_address() {
                UNKNOWN_ADDRESS_HINT.to_string()
            } else {
                warn!(%address, error = %e, "balance lookup failed");
                e.to_string()
            };
            Json(json!({
                "balance": 0,
                "balanceFormatted": "0",
                "utxoCount": 0,
                "error": error,
            }))
        }
    }
}

/// `GET /api/wallet/receive` — address, payment URI and QR code.
async fn wallet_receive(State(state): State<AppState>, auth: AuthSession) -> ApiResult<Json<Value>> {
    let address = auth.session.address.as_str();
    let uri = format!("{}:{address}", state.params.uri_scheme);
    let qr = qr::svg_data_url(&uri).map_err(|e| {
        warn!(error = %e, "QR generation failed");
        ApiError::Internal("QR generation failed".into())
    })?;
    Ok(Json(json!({ "address": address, "uri": uri, "qr": qr })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest {
    to_address: Option<String>,
    amount: Option<String>,
}

/// `POST /api/wallet/send` — build, sign and broadcast a payment.
async fn wallet_send(
    State(state): State<AppState>,
    auth: AuthSession,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let (to, amount) = match body {
        Ok(Json(SendRequest {
            to_address: Some(to),
            amount: Some(amount),
        })) if !to.trim().is_empty() && !amount.trim().is_empty() => (to, amount),
        _ => return Err(ApiError::bad_request("Missing toAddress or amount")),
    };

    let to = Address::parse(to.trim(), state.params).map_err(|reason| {
        WalletError::InvalidAddress {
            reason,
            hint: state.params.address_hint(),
        }
    })?;
    let amount = to_subunits(&amount).map_err(WalletError::from)?;
    if amount == 0 {
        return Err(WalletError::ZeroAmount.into());
    }

    let _guard = state.send_locks.acquire(&auth.token).await;
    let policy = SendPolicy {
        fee_per_kb: state.config.fee_per_kb,
        history_limit: state.config.history_limit,
    };
    let txid = send_payment(&state.rpc, &auth.session, state.params, policy, &to, amount).await?;
    Ok(Json(json!({ "txid": txid, "ok": true })))
}
