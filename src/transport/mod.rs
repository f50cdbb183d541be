//! Transport - where deltas come from
//!
//! - `source` - `DeltaSource` trait and `TransportError`
//! - `http` - polls the remote display endpoint
//! - `file` - local JSON file fallback for debugging
//! - `simulator` - synthetic scaled-out traffic
//! - `backoff` - retry delay between failed polls

pub mod backoff;
pub mod file;
pub mod http;
pub mod simulator;
pub mod source;

pub use backoff::{PollBackoff, RetriesExhausted};
pub use file::FileDeltaSource;
pub use http::HttpDeltaSource;
pub use simulator::{SimulatedDeltaSource, SimulatorConfig};
pub use source::{DeltaSource, TransportError};

use crate::config::{Config, SourceType};

/// Build the delta source selected by the configuration
pub fn build_source(config: &Config) -> Result<Box<dyn DeltaSource>, TransportError> {
    let source: Box<dyn DeltaSource> = match config.source {
        SourceType::Http => Box::new(HttpDeltaSource::new(&config.base_url, config.http_timeout)?),
        SourceType::File => Box::new(FileDeltaSource::new(config.delta_file.clone())),
        SourceType::Simulate => Box::new(SimulatedDeltaSource::new(SimulatorConfig {
            app_name: config.sim_app_name.clone(),
            max_gears: config.sim_max_gears,
            ..SimulatorConfig::default()
        })),
    };

    Ok(source)
}
