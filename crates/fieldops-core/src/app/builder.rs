//! DeskBuilder - デスクの構築とワイヤリング
//!
//! Every port has a production default, so `DeskBuilder::new().build()`
//! gives a working desk. Configuration is validated at build time.

use std::sync::Arc;

use super::DispatchDesk;
use crate::config::{ConfigError, DispatchConfig};
use crate::impls::LogAlertSink;
use crate::ports::{AlertSink, Clock, IdGenerator, SystemClock, UlidGenerator};

/// # 使用例
/// ```ignore
/// let desk = DeskBuilder::new()
///     .config(DispatchConfig::from_json_file("dispatch.json")?)
///     .clock(FixedClock::new(at))
///     .build()?;
/// ```
#[derive(Default)]
pub struct DeskBuilder {
    config: DispatchConfig,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    alerts: Option<Arc<dyn AlertSink>>,
}

impl DeskBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Defaults to `SystemClock`.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Defaults to a `UlidGenerator` over the desk's clock.
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Arc::new(ids));
        self
    }

    /// Defaults to `LogAlertSink`.
    pub fn alert_sink(mut self, alerts: impl AlertSink + 'static) -> Self {
        self.alerts = Some(Arc::new(alerts));
        self
    }

    pub fn build(self) -> Result<DispatchDesk, ConfigError> {
        self.config.validate()?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));
        let alerts = self.alerts.unwrap_or_else(|| Arc::new(LogAlertSink));
        Ok(DispatchDesk::from_parts(self.config, clock, ids, alerts))
    }
}
