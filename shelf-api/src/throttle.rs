//! Named throttle policies.
//!
//! A policy is one keyed `governor` limiter, one cell budget per client IP.
//! Exceeding it yields `ShelfError::RateLimitExceeded` carrying the policy
//! name and a retry delay. Idle clients are swept out periodically.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::HeaderMap;
use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
    Quota, RateLimiter,
};
use shelf_core::{ShelfError, ShelfResult};

use crate::config::ThrottleConfig;

/// Name of the policy guarding review submission.
pub const REVIEWS_POLICY: &str = "reviews";

/// Checks between two sweeps of idle clients.
const SWEEP_EVERY: u64 = 1024;

type KeyedRateLimiter<C> =
    RateLimiter<IpAddr, DashMapStateStore<IpAddr>, C, NoOpMiddleware<<C as Clock>::Instant>>;

pub struct ThrottlePolicy<C: Clock + Clone = DefaultClock> {
    name: &'static str,
    config: ThrottleConfig,
    limiter: KeyedRateLimiter<C>,
    clock: C,
    checks: AtomicU64,
}

impl ThrottlePolicy {
    pub fn new(name: &'static str, config: ThrottleConfig) -> Self {
        Self::with_clock(name, config, DefaultClock::default())
    }

    /// The `reviews` policy.
    pub fn reviews(config: ThrottleConfig) -> Self {
        Self::new(REVIEWS_POLICY, config)
    }
}

impl<C: Clock + Clone> ThrottlePolicy<C> {
    pub fn with_clock(name: &'static str, config: ThrottleConfig, clock: C) -> Self {
        let quota = Quota::per_hour(NonZeroU32::new(config.per_hour).unwrap_or(NonZeroU32::MIN))
            .allow_burst(NonZeroU32::new(config.burst).unwrap_or(NonZeroU32::MIN));
        Self {
            name,
            config,
            limiter: RateLimiter::dashmap_with_clock(quota, clock.clone()),
            clock,
            checks: AtomicU64::new(0),
        }
    }

    /// Clients currently holding limiter state.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    /// Drop clients whose budget has fully replenished.
    pub fn sweep(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Consume one unit of the client's quota.
    pub fn check(&self, client: IpAddr) -> ShelfResult<()> {
        if !self.config.enabled {
            return Ok(());
        }

        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep();
        }

        match self.limiter.check_key(&client) {
            Ok(()) => Ok(()),
            Err(not_until) => {
                let retry_after_secs = not_until
                    .wait_time_from(self.clock.now())
                    .as_secs()
                    .max(1);
                tracing::warn!(
                    policy = self.name,
                    %client,
                    retry_after_secs,
                    "Throttle policy exceeded"
                );
                Err(ShelfError::RateLimitExceeded {
                    policy: self.name.to_string(),
                    retry_after_secs,
                })
            }
        }
    }

    /// Client address for this policy, honouring the configured trusted proxies.
    pub fn client_ip(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
        client_ip(headers, peer, &self.config.trusted_proxies)
    }
}

/// Client address for throttling.
///
/// The peer address is authoritative. Only when the peer is one of
/// `trusted_proxies` are the first `X-Forwarded-For` entry and then
/// `X-Real-IP` consulted. Without a peer the key is `0.0.0.0`.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_proxies: &[IpAddr],
) -> IpAddr {
    let peer_ip = peer
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    if !trusted_proxies.contains(&peer_ip) {
        return peer_ip;
    }

    if let Some(forwarded_for) = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(first_ip) = forwarded_for.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse() {
                return ip;
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|h| h.to_str().ok()) {
        if let Ok(ip) = real_ip.trim().parse() {
            return ip;
        }
    }

    peer_ip
}
