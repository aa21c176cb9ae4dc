use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Address of the client making a request.
///
/// Recorded as the owner of whatever the client contributes. A reverse
/// proxy's `X-Real-IP` wins over the socket peer address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr {
    addr: String,
    peer: Option<IpAddr>,
}

impl ClientAddr {
    pub fn as_str(&self) -> &str {
        &self.addr
    }

    /// Whether the TCP peer is this machine. Ignores `X-Real-IP`, which
    /// any client can set.
    pub fn is_local_peer(&self) -> bool {
        self.peer.is_some_and(|ip| ip.is_loopback())
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientAddr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let real_ip = parts
            .headers
            .get(REAL_IP_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let addr = match (real_ip, peer) {
            (Some(ip), _) => ip.to_string(),
            (None, Some(ip)) => ip.to_string(),
            (None, None) => String::new(),
        };

        Ok(Self { addr, peer })
    }
}
