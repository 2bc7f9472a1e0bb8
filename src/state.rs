use std::sync::Arc;

use crate::config::Config;
use crate::payment::{PaymentGateway, SimulatedGateway};
use crate::rate_limit::RateLimiter;
use crate::store::Store;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub gateway: Arc<dyn PaymentGateway>,
    pub limiter: Arc<RateLimiter>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the simulated gateway and a rate limiter sized from `config`.
    pub fn new(store: Store, config: Config) -> Self {
        Self {
            store,
            gateway: Arc::new(SimulatedGateway::new(config.payment_latency)),
            limiter: Arc::new(RateLimiter::new(
                config.rate_limit_max,
                config.rate_limit_window,
                config.rate_limit_max_keys,
            )),
            config: Arc::new(config),
        }
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = gateway;
        self
    }
}
