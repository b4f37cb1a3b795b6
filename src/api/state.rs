//! Application state for the HR back-office API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::attendance::{AttendanceAggregator, PunchIngestor};
use crate::config::ConfigLoader;
use crate::leave::LeaveEngine;
use crate::notify::{ChannelRegistry, NotificationDispatcher};
use crate::store::Store;

/// Shared application state.
///
/// Holds the services built once at startup over a single record store
/// and channel registry. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    aggregator: AttendanceAggregator,
    ingestor: PunchIngestor,
    engine: LeaveEngine,
    registry: Arc<dyn ChannelRegistry>,
    default_trailing_days: u32,
}

impl AppState {
    /// Builds every service from the loaded configuration.
    pub fn new(store: Store, config: &ConfigLoader, registry: Arc<dyn ChannelRegistry>) -> Self {
        let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));
        Self {
            aggregator: AttendanceAggregator::new(store.clone(), config.attendance_settings()),
            ingestor: PunchIngestor::new(store.clone(), config.utc_offset()),
            engine: LeaveEngine::new(
                store,
                dispatcher,
                config.approval_policy(),
                config.utc_offset(),
            ),
            registry,
            default_trailing_days: config.default_trailing_days(),
        }
    }

    /// The attendance aggregator.
    pub fn aggregator(&self) -> &AttendanceAggregator {
        &self.aggregator
    }

    /// The punch ingestor.
    pub fn ingestor(&self) -> &PunchIngestor {
        &self.ingestor
    }

    /// The leave approval engine.
    pub fn engine(&self) -> &LeaveEngine {
        &self.engine
    }

    /// The registry notification streams attach to.
    pub fn registry(&self) -> &Arc<dyn ChannelRegistry> {
        &self.registry
    }

    /// Trailing window length used when a query names none.
    pub fn default_trailing_days(&self) -> u32 {
        self.default_trailing_days
    }
}
