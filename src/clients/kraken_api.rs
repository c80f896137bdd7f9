// Kraken REST client: public OHLC plus the private order endpoints the reaper needs

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::DateTime;
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use sha2::{Digest, Sha256, Sha512};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

use crate::config::ApiConfig;
use crate::core::exchange::Exchange;
use crate::core::types::{Bar, BarSeries, OpenOrder, OrderSide};
use crate::error::{ReaperError, ReaperResult};

type HmacSha512 = Hmac<Sha512>;

pub const KRAKEN_REST_URL: &str = "https://api.kraken.com";

/// API key pair; the secret is the base64 string Kraken hands out
#[derive(Clone)]
pub struct KrakenCredentials {
    api_key: String,
    api_secret: String,
}

impl KrakenCredentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

impl std::fmt::Debug for KrakenCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KrakenCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug)]
pub struct KrakenRestClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<KrakenCredentials>,
    rate_limiter: Mutex<RateLimiter>,
    last_nonce: AtomicU64,
}

impl KrakenRestClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ReaperResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stale-order-reaper/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: None,
            rate_limiter: Mutex::new(RateLimiter::new(60, Duration::from_secs(60))), // 60 calls per minute
            last_nonce: AtomicU64::new(0),
        })
    }

    /// Build from config, attaching credentials only when they are not placeholders
    pub fn from_config(api: &ApiConfig) -> ReaperResult<Self> {
        let client = Self::new(&api.rest_url, Duration::from_secs(api.request_timeout_seconds))?;

        let placeholder = api.api_key.is_empty()
            || api.api_secret.is_empty()
            || api.api_key.contains("YOUR_API_KEY")
            || api.api_secret.contains("YOUR_API_SECRET");

        if placeholder {
            Ok(client)
        } else {
            Ok(client.with_credentials(KrakenCredentials::new(&api.api_key, &api.api_secret)))
        }
    }

    pub fn with_credentials(mut self, credentials: KrakenCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_rate_limit(mut self, max_calls: u32, window: Duration) -> Self {
        self.rate_limiter = Mutex::new(RateLimiter::new(max_calls, window));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    async fn public_get(&self, method: &str, params: &[(&str, String)]) -> ReaperResult<Value> {
        self.rate_limiter.lock().await.wait_if_needed().await;

        let url = format!("{}/0/public/{}", self.base_url, method);
        debug!(method, "Kraken public request");

        let response = self.client.get(&url).query(params).send().await?;
        Self::read_body(response).await
    }

    async fn private_post(&self, method: &str, params: &[(&str, String)]) -> ReaperResult<Value> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ReaperError::ApiAuthentication("Kraken credentials not configured".to_string())
        })?;

        self.rate_limiter.lock().await.wait_if_needed().await;

        let path = format!("/0/private/{}", method);
        let nonce = self.next_nonce();

        let mut fields: Vec<(&str, String)> = vec![("nonce", nonce.to_string())];
        fields.extend(params.iter().cloned());
        let postdata = encode_form(&fields);

        let signature = sign_request(&path, nonce, &postdata, &credentials.api_secret)?;
        debug!(method, nonce, "Kraken private request");

        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("API-Key", &credentials.api_key)
            .header("API-Sign", signature)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(postdata)
            .send()
            .await?;

        Self::read_body(response).await
    }

    async fn read_body(response: reqwest::Response) -> ReaperResult<Value> {
        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ReaperError::ApiRateLimit(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(ReaperError::ApiResponse(format!("HTTP {}", status)));
        }

        let json: Value = response.json().await?;
        check_kraken_errors(&json)?;
        Ok(json)
    }

    /// Millisecond timestamp, bumped so it strictly increases even within
    /// one millisecond
    fn next_nonce(&self) -> u64 {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let mut last = self.last_nonce.load(Ordering::SeqCst);
        loop {
            let next = now.max(last + 1);
            match self
                .last_nonce
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

#[async_trait]
impl Exchange for KrakenRestClient {
    async fn fetch_ohlc(&self, pair: &str, interval_minutes: u32) -> ReaperResult<BarSeries> {
        let params = [
            ("pair", pair.to_string()),
            ("interval", interval_minutes.to_string()),
        ];
        let json = self.public_get("OHLC", &params).await?;
        parse_ohlc_response(&json, pair, interval_minutes)
    }

    async fn open_orders(&self) -> ReaperResult<Vec<OpenOrder>> {
        let json = self.private_post("OpenOrders", &[]).await?;
        parse_open_orders_response(&json)
    }

    async fn cancel_order(&self, order_id: &str) -> ReaperResult<()> {
        let json = self
            .private_post("CancelOrder", &[("txid", order_id.to_string())])
            .await?;

        let count = json["result"]["count"].as_u64().unwrap_or(0);
        if count == 0 {
            return Err(ReaperError::OrderFailed(format!(
                "Kraken cancelled no order for txid {}",
                order_id
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "kraken"
    }
}

/// `API-Sign` header: base64(HMAC-SHA512(path || SHA256(nonce || postdata)))
/// keyed with the base64-decoded secret
pub fn sign_request(path: &str, nonce: u64, postdata: &str, secret_b64: &str) -> ReaperResult<String> {
    let secret = STANDARD
        .decode(secret_b64.trim())
        .map_err(|e| ReaperError::ApiAuthentication(format!("API secret is not valid base64: {}", e)))?;

    let mut sha = Sha256::new();
    sha.update(nonce.to_string().as_bytes());
    sha.update(postdata.as_bytes());
    let digest = sha.finalize();

    let mut mac = HmacSha512::new_from_slice(&secret)
        .map_err(|e| ReaperError::ApiAuthentication(format!("invalid API secret: {}", e)))?;
    mac.update(path.as_bytes());
    mac.update(&digest);

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// `application/x-www-form-urlencoded` body, in field order
fn encode_form(fields: &[(&str, String)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => out.push(b as char),
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Map Kraken's `error` array onto `ReaperError`
pub fn check_kraken_errors(json: &Value) -> ReaperResult<()> {
    let errors: Vec<&str> = json["error"]
        .as_array()
        .map(|arr| arr.iter().filter_map(|e| e.as_str()).collect())
        .unwrap_or_default();

    let Some(first) = errors.first() else {
        return Ok(());
    };
    let msg = errors.join(", ");

    if first.starts_with("EAPI:Rate limit") || first.starts_with("EOrder:Rate limit") {
        Err(ReaperError::ApiRateLimit(msg))
    } else if first.starts_with("EAPI:Invalid key")
        || first.starts_with("EAPI:Invalid signature")
        || first.starts_with("EAPI:Invalid nonce")
        || first.starts_with("EGeneral:Permission denied")
    {
        Err(ReaperError::ApiAuthentication(msg))
    } else if first.starts_with("EOrder:") {
        Err(ReaperError::OrderFailed(msg))
    } else if first.starts_with("EService:Unavailable") || first.starts_with("EService:Busy") {
        Err(ReaperError::ApiConnection(msg))
    } else {
        Err(ReaperError::ApiResponse(msg))
    }
}

/// Parse an OHLC response body.
///
/// `result` holds one array under Kraken's canonical pair name (which may
/// differ from the requested name) plus a `last` cursor, which is skipped.
pub fn parse_ohlc_response(json: &Value, pair: &str, interval_minutes: u32) -> ReaperResult<BarSeries> {
    let result = json["result"]
        .as_object()
        .ok_or_else(|| ReaperError::ApiResponse("Missing result field".to_string()))?;

    let rows = result
        .iter()
        .find(|(key, _)| key.as_str() != "last")
        .and_then(|(_, v)| v.as_array())
        .ok_or_else(|| ReaperError::ApiResponse(format!("No OHLC data for {}", pair)))?;

    let mut bars = Vec::with_capacity(rows.len());
    for row in rows {
        let cells = row
            .as_array()
            .ok_or_else(|| ReaperError::ApiResponse("Invalid candle format".to_string()))?;

        if cells.len() < 8 {
            continue; // Skip malformed candles
        }

        let timestamp = cells[0]
            .as_i64()
            .or_else(|| cells[0].as_f64().map(|t| t as i64))
            .ok_or_else(|| ReaperError::ApiResponse("Invalid timestamp".to_string()))?;

        bars.push(Bar {
            timestamp: DateTime::from_timestamp(timestamp, 0)
                .ok_or_else(|| ReaperError::ApiResponse("Invalid timestamp conversion".to_string()))?,
            open: price_cell(&cells[1], "open")?,
            high: price_cell(&cells[2], "high")?,
            low: price_cell(&cells[3], "low")?,
            close: price_cell(&cells[4], "close")?,
            vwap: price_cell(&cells[5], "vwap")?,
            volume: price_cell(&cells[6], "volume")?,
            count: cells[7].as_u64().unwrap_or(0),
        });
    }

    Ok(BarSeries::new(pair, interval_minutes, bars))
}

fn price_cell(cell: &Value, field: &str) -> ReaperResult<f64> {
    let value = match cell {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| ReaperError::ApiResponse(format!("Invalid {} price", field)))
}

/// Parse an OpenOrders response body into orders keyed by transaction id
pub fn parse_open_orders_response(json: &Value) -> ReaperResult<Vec<OpenOrder>> {
    let open = match json["result"]["open"].as_object() {
        Some(open) => open,
        None if json["result"].is_object() => return Ok(Vec::new()),
        None => return Err(ReaperError::ApiResponse("Missing result field".to_string())),
    };

    open.iter()
        .map(|(txid, order)| -> ReaperResult<OpenOrder> {
            let descr = &order["descr"];
            let side: OrderSide = descr["type"]
                .as_str()
                .ok_or_else(|| ReaperError::InvalidOrder(format!("order {} has no side", txid)))?
                .parse::<OrderSide>()
                .map_err(|e| ReaperError::InvalidOrder(format!("order {}: {}", txid, e)))?;

            Ok(OpenOrder {
                id: txid.clone(),
                side,
                pair: descr["pair"].as_str().unwrap_or_default().to_string(),
                order_type: descr["ordertype"].as_str().unwrap_or_default().to_string(),
                price: descr["price"].as_str().and_then(|p| p.parse().ok()),
                volume: order["vol"].as_str().and_then(|v| v.parse().ok()),
                description: descr["order"].as_str().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

#[derive(Debug)]
struct RateLimiter {
    max_calls: u32,
    window_duration: Duration,
    calls: Vec<Instant>,
}

impl RateLimiter {
    fn new(max_calls: u32, window_duration: Duration) -> Self {
        Self {
            max_calls,
            window_duration,
            calls: Vec::new(),
        }
    }

    async fn wait_if_needed(&mut self) {
        let now = Instant::now();

        // Remove old calls outside the window
        self.calls.retain(|&call_time| now.duration_since(call_time) <= self.window_duration);

        if self.calls.len() >= self.max_calls as usize {
            if let Some(&oldest_call) = self.calls.first() {
                let wait_time = self.window_duration.saturating_sub(now.duration_since(oldest_call));
                if !wait_time.is_zero() {
                    debug!(wait_ms = wait_time.as_millis() as u64, "Rate limiter pausing");
                    sleep(wait_time).await;
                }
            }
        }

        self.calls.push(Instant::now());
    }
}
