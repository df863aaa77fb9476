/**
 * Application State Management
 *
 * `AppState` is the central state container, created once in `create_app`
 * and cloned into every handler. It holds:
 * - the validated configuration
 * - the `StreamBroadcaster` (and through it the one listener registry)
 * - the `StreamProducer` used by the push endpoint
 * - the external collaborators: auth gate and note resolver
 *
 * # Example
 *
 * ```rust
 * use std::sync::Arc;
 * use notestream::backend::resolver::InMemoryResolver;
 * use notestream::backend::server::state::AppState;
 * use notestream::shared::AppConfig;
 *
 * let resolver = Arc::new(InMemoryResolver::new());
 * let state = AppState::new(AppConfig::default()).with_resolver(resolver);
 * assert_eq!(state.broadcaster.stats().total_listeners, 0);
 * ```
 */

use std::sync::Arc;

use crate::backend::auth::{AuthGate, JwtAuthGate};
use crate::backend::middleware::{RateLimiter, TokenBucketLimiter};
use crate::backend::producer::StreamProducer;
use crate::backend::realtime::{StreamBroadcaster, TransportConfig};
use crate::backend::resolver::{InMemoryResolver, ResourceResolver};
use crate::backend::sanitize::{MarkupEscaper, Sanitizer};
use crate::shared::AppConfig;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub broadcaster: StreamBroadcaster,
    pub producer: StreamProducer,
    pub auth: Arc<dyn AuthGate>,
    pub resolver: Arc<dyn ResourceResolver>,
    /// Per-connection settings derived from `config`
    pub transport: TransportConfig,
    limiter: Arc<dyn RateLimiter>,
    sanitizer: Arc<dyn Sanitizer>,
}

impl AppState {
    /// Build the state with the default collaborators for `config`
    pub fn new(config: AppConfig) -> Self {
        let broadcaster = StreamBroadcaster::new();
        let limiter: Arc<dyn RateLimiter> = Arc::new(TokenBucketLimiter::from_config(&config.rate_limit));
        let sanitizer: Arc<dyn Sanitizer> = Arc::new(MarkupEscaper);
        let producer = StreamProducer::new(broadcaster.clone(), Arc::clone(&limiter), Arc::clone(&sanitizer));

        Self {
            auth: Arc::new(JwtAuthGate::new(&config.jwt_secret)),
            resolver: Arc::new(InMemoryResolver::from_seeds(&config.resources)),
            transport: TransportConfig::from(&config),
            config: Arc::new(config),
            broadcaster,
            producer,
            limiter,
            sanitizer,
        }
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthGate>) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ResourceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = limiter;
        self.rebuild_producer();
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self.rebuild_producer();
        self
    }

    /// Limiter shared with the producer
    pub fn rate_limiter(&self) -> &Arc<dyn RateLimiter> {
        &self.limiter
    }

    fn rebuild_producer(&mut self) {
        self.producer = StreamProducer::new(
            self.broadcaster.clone(),
            Arc::clone(&self.limiter),
            Arc::clone(&self.sanitizer),
        );
    }
}
