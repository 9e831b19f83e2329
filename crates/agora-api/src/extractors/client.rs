//! `ClientContext` extractor: who is on the other end of the request.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

use agora_entity::session::ClientInfo;

use crate::state::AppState;

/// Client IP and user agent, parsed into device fields.
#[derive(Debug, Clone)]
pub struct ClientContext(pub ClientInfo);

impl ClientContext {
    /// Key used to scope IP-based rate limits.
    pub fn scope(&self) -> &str {
        self.0.ip_address.as_deref().unwrap_or("unknown")
    }
}

impl std::ops::Deref for ClientContext {
    type Target = ClientInfo;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for ClientContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(client_info(parts, state.config.server.trust_forwarded_for)))
    }
}

/// Builds [`ClientInfo`] from request parts.
pub(crate) fn client_info(parts: &Parts, trust_forwarded_for: bool) -> ClientInfo {
    let forwarded = if trust_forwarded_for {
        forwarded_for(&parts.headers)
    } else {
        None
    };
    let ip = forwarded.or_else(|| {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    });

    let user_agent = parts
        .headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok());

    ClientInfo::from_request(ip, user_agent)
}

// Left-most entry is the original client.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(req: Request<()>) -> Parts {
        req.into_parts().0
    }

    #[test]
    fn test_forwarded_for_ignored_unless_trusted() {
        let mut req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 9], 4000))));
        let parts = parts(req);

        assert_eq!(
            client_info(&parts, false).ip_address.as_deref(),
            Some("10.0.0.9")
        );
        assert_eq!(
            client_info(&parts, true).ip_address.as_deref(),
            Some("203.0.113.7")
        );
    }

    #[test]
    fn test_no_peer_address_leaves_ip_empty() {
        let parts = parts(Request::builder().body(()).unwrap());
        let info = client_info(&parts, false);
        assert!(info.ip_address.is_none());
        assert_eq!(ClientContext(info).scope(), "unknown");
    }
}
