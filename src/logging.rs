use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::config::AppConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber.
///
/// An empty `log_dir` logs to stdout only. Otherwise the returned guard must
/// live as long as the process or buffered file lines are lost.
pub fn init_logging(config: &AppConfig) -> Option<WorkerGuard> {
    let directives = format!("{},hyper=warn,reqwest=warn", config.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let guard = match file_writer(config) {
        Some((writer, guard)) => {
            layers.push(file_layer(writer, config.use_json));
            Some(guard)
        }
        None => None,
    };
    // Structured file output replaces the console
    if !config.use_json || guard.is_none() {
        layers.push(fmt::layer().with_target(false).with_ansi(true).boxed());
    }

    tracing_subscriber::registry().with(layers).with(filter).init();
    guard
}

fn file_writer(config: &AppConfig) -> Option<(NonBlocking, WorkerGuard)> {
    if config.log_dir.is_empty() {
        return None;
    }
    let rotation = match config.rotation.as_str() {
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => Rotation::NEVER,
    };
    let appender = RollingFileAppender::new(rotation, &config.log_dir, &config.log_file);
    Some(tracing_appender::non_blocking(appender))
}

fn file_layer(writer: NonBlocking, json: bool) -> BoxedLayer {
    if json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false)
            .with_writer(writer)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(writer)
            .with_ansi(false)
            .boxed()
    }
}
