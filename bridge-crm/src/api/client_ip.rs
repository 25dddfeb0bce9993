//! Client address extractor used as the rate-limit key
//!
//! Order: first `X-Forwarded-For` entry, `X-Real-IP`, the socket peer
//! address, then `"unknown"`.

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use std::convert::Infallible;
use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let forwarded = header("x-forwarded-for").and_then(|v| {
            v.split(',')
                .next()
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .map(str::to_string)
        });
        if let Some(ip) = forwarded {
            return Ok(ClientIp(ip));
        }

        if let Some(ip) = header("x-real-ip").map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            return Ok(ClientIp(ip));
        }

        if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            return Ok(ClientIp(addr.ip().to_string()));
        }

        Ok(ClientIp("unknown".to_string()))
    }
}
