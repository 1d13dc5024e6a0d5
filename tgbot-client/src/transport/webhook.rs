//! Webhook transport: an HTTP endpoint Telegram posts updates to (§4.5
//! "webhook").
//!
//! Validation order: method, peer IP against the allowlist, the
//! secret-token header, content type, then JSON — a rejection at any step
//! returns immediately without touching the router. Once an update is
//! accepted, the handler runs and whatever filled the reply slot becomes the
//! response body; otherwise an empty 200. The response is always 200 once
//! the update is accepted, even when the handler failed — that failure still
//! reaches the router's installed error handler, it just never turns into a
//! non-2xx response Telegram would read as "redeliver this".

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;

use crate::errors::TransportError;
use crate::router::Router;
use crate::update::{Invoke, ReplySlot, Update, invoke};

/// A IPv4 CIDR block, used for the default webhook-origin allowlist.
#[derive(Clone, Copy, Debug)]
pub struct CidrV4 {
    base: u32,
    prefix: u32,
}

impl CidrV4 {
    pub const fn new(a: u8, b: u8, c: u8, d: u8, prefix: u32) -> Self {
        Self { base: u32::from_be_bytes([a, b, c, d]), prefix }
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask: u32 = if self.prefix == 0 { 0 } else { u32::MAX << (32 - self.prefix) };
        (u32::from_be_bytes(ip.octets()) & mask) == (self.base & mask)
    }
}

/// Telegram's documented webhook source ranges — the default allowlist when
/// [`WebhookConfig::allowed_networks`] is left `None`.
pub const TELEGRAM_WEBHOOK_NETWORKS: &[CidrV4] = &[CidrV4::new(149, 154, 160, 0, 20), CidrV4::new(91, 108, 4, 0, 22)];

/// How the webhook endpoint validates and classifies incoming requests
/// (§4.5 step 2).
#[derive(Clone, Default)]
pub struct WebhookConfig {
    /// Checked against the `X-Telegram-Bot-Api-Secret-Token` header, if set.
    pub secret_token: Option<String>,
    /// `None` uses [`TELEGRAM_WEBHOOK_NETWORKS`]; `Some(vec![])` disables the check entirely.
    pub allowed_networks: Option<Vec<CidrV4>>,
    /// Trust the first hop of `X-Forwarded-For` over the socket's peer
    /// address. Only turn this on behind a reverse proxy you control.
    pub trust_x_forwarded_for: bool,
}

impl WebhookConfig {
    fn allows(&self, ip: IpAddr) -> bool {
        let IpAddr::V4(ip) = ip else { return false };
        let networks = self.allowed_networks.as_deref().unwrap_or(TELEGRAM_WEBHOOK_NETWORKS);
        networks.is_empty() || networks.iter().any(|net| net.contains(ip))
    }
}

struct WebhookState {
    router: Arc<Router>,
    client: Arc<dyn Invoke>,
    config: WebhookConfig,
}

/// Builds the axum router serving one webhook endpoint at `path`. Mount it
/// inside a larger `axum::Router` if the process serves more than updates.
pub fn app(path: &str, router: Arc<Router>, client: Arc<dyn Invoke>, config: WebhookConfig) -> axum::Router {
    let state = Arc::new(WebhookState { router, client, config });
    axum::Router::new().route(path, post(handle)).with_state(state)
}

/// Serves `app` on `addr` until the process is terminated.
pub async fn serve(addr: SocketAddr, app: axum::Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await
}

/// Compares `desired` against the bot's current `getWebhookInfo` and issues
/// one `setWebhook` call only if the URL, max connections, allowed-update
/// set, fixed IP, or pending-updates-vs-drop-pending actually differ (§4.5
/// "webhook setup" — idempotent across restarts).
pub async fn ensure_configured(client: &dyn Invoke, desired: tgbot_types::SetWebhook) -> Result<(), TransportError> {
    let current = invoke(client, tgbot_types::GetWebhookInfo::new()).await?;
    let drop_pending = desired.drop_pending_updates.unwrap_or(false);
    let up_to_date = current.url == desired.url
        && current.max_connections == desired.max_connections
        && current.allowed_updates == desired.allowed_updates
        && current.ip_address == desired.ip_address
        && (current.pending_update_count == 0 || !drop_pending);
    if up_to_date {
        return Ok(());
    }
    invoke(client, desired).await?;
    Ok(())
}

async fn handle(
    State(state): State<Arc<WebhookState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let origin = if state.config.trust_x_forwarded_for {
        forwarded_for(&headers).unwrap_or_else(|| peer.ip())
    } else {
        peer.ip()
    };

    if !state.config.allows(origin) {
        return StatusCode::FORBIDDEN.into_response();
    }

    if let Some(expected) = &state.config.secret_token {
        let got = headers.get("X-Telegram-Bot-Api-Secret-Token").and_then(|v| v.to_str().ok());
        if got != Some(expected.as_str()) {
            return StatusCode::FORBIDDEN.into_response();
        }
    }

    let is_json =
        headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).is_some_and(|v| v.starts_with("application/json"));
    if !is_json {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }

    let raw: tgbot_types::Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };

    let reply_slot = Arc::new(ReplySlot::new());
    let update = Update::new(raw, state.client.clone(), Some(reply_slot.clone()));
    state.router.dispatch(update).await;

    match reply_slot.take() {
        Some(body) => axum::Json(body).into_response(),
        None => StatusCode::OK.into_response(),
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cidr_contains_checks_the_masked_prefix() {
        let net = CidrV4::new(149, 154, 160, 0, 20);
        assert!(net.contains(Ipv4Addr::new(149, 154, 160, 1)));
        assert!(net.contains(Ipv4Addr::new(149, 154, 175, 255)));
        assert!(!net.contains(Ipv4Addr::new(149, 154, 176, 0)));
        assert!(!net.contains(Ipv4Addr::new(8, 8, 8, 8)));
    }

    #[test]
    fn default_allowlist_rejects_arbitrary_internet_hosts() {
        let config = WebhookConfig::default();
        assert!(config.allows(IpAddr::V4(Ipv4Addr::new(149, 154, 167, 1))));
        assert!(!config.allows(IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))));
    }

    #[test]
    fn an_empty_allowlist_disables_the_ip_check() {
        let config = WebhookConfig { allowed_networks: Some(vec![]), ..Default::default() };
        assert!(config.allows(IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))));
    }

    #[test]
    fn ipv6_peers_are_rejected_by_the_v4_only_allowlist() {
        let config = WebhookConfig::default();
        assert!(!config.allows(IpAddr::V6(std::net::Ipv6Addr::LOCALHOST)));
    }

    struct FakeClient {
        webhook_info: serde_json::Value,
        set_webhook_calls: std::sync::Mutex<u32>,
    }

    #[async_trait::async_trait]
    impl Invoke for FakeClient {
        async fn invoke_raw(
            &self,
            method: &'static str,
            _args: serde_json::Value,
        ) -> Result<serde_json::Value, TransportError> {
            match method {
                "getWebhookInfo" => Ok(self.webhook_info.clone()),
                "setWebhook" => {
                    *self.set_webhook_calls.lock().unwrap() += 1;
                    Ok(serde_json::Value::Bool(true))
                }
                other => panic!("unexpected call to {other}"),
            }
        }
    }

    #[tokio::test]
    async fn matching_webhook_info_skips_set_webhook() {
        let client = FakeClient {
            webhook_info: serde_json::json!({
                "url": "https://example.com/hook",
                "has_custom_certificate": false,
                "pending_update_count": 0,
                "max_connections": 40,
            }),
            set_webhook_calls: std::sync::Mutex::new(0),
        };
        let desired = tgbot_types::SetWebhook::new("https://example.com/hook").max_connections(40_i64);
        ensure_configured(&client, desired).await.unwrap();
        assert_eq!(*client.set_webhook_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn differing_max_connections_triggers_set_webhook() {
        let client = FakeClient {
            webhook_info: serde_json::json!({
                "url": "https://example.com/hook",
                "has_custom_certificate": false,
                "pending_update_count": 0,
                "max_connections": 1,
            }),
            set_webhook_calls: std::sync::Mutex::new(0),
        };
        let desired = tgbot_types::SetWebhook::new("https://example.com/hook").max_connections(40_i64);
        ensure_configured(&client, desired).await.unwrap();
        assert_eq!(*client.set_webhook_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn nonzero_pending_with_drop_pending_triggers_set_webhook() {
        let client = FakeClient {
            webhook_info: serde_json::json!({
                "url": "https://example.com/hook",
                "has_custom_certificate": false,
                "pending_update_count": 5,
                "max_connections": 40,
            }),
            set_webhook_calls: std::sync::Mutex::new(0),
        };
        let desired =
            tgbot_types::SetWebhook::new("https://example.com/hook").max_connections(40_i64).drop_pending_updates(true);
        ensure_configured(&client, desired).await.unwrap();
        assert_eq!(*client.set_webhook_calls.lock().unwrap(), 1);
    }
}
