use std::sync::OnceLock;

use tracing::error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

/// Filter directives for a verbosity level.
fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "off,isogeo=error,isogeo_api=error",
        Verbosity::Verbose(0) => "off,isogeo=warn,isogeo_api=warn",
        Verbosity::Verbose(1) => "off,isogeo=info,isogeo_api=info",
        Verbosity::Verbose(2) => "off,isogeo=debug,isogeo_api=debug",
        Verbosity::Verbose(3) => "off,isogeo=trace,isogeo_api=trace",
        Verbosity::Verbose(_) => "trace",
    }
}

/// Install the subscriber on first call, then only update its filter.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let verbosity = verbosity.unwrap_or_default();

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let (filter, reload_handle) = tracing_subscriber::reload::Layer::new(EnvFilter::new("off"));
        let log_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter);
        tracing_subscriber::registry().with(log_layer).init();
        reload_handle
    });

    update_filters(filter_handle, log_filter(verbosity));
}

fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}
