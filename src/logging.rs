use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type FileLayer<S> = fmt::Layer<S, fmt::format::DefaultFields, fmt::format::Format, Mutex<File>>;

/// Plain-text layer appending to `path`, created if missing.
fn file_layer<S>(path: &Path) -> io::Result<FileLayer<S>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
}

/// Install the global subscriber.
///
/// Lines go to stdout, and are appended to `log_file` without ANSI colors
/// when one is given. A log file that cannot be opened is reported and
/// skipped. Calling this again after a subscriber is installed does nothing.
pub fn init(log_file: Option<&Path>) {
    let mut open_error = None;
    let file = log_file.and_then(|path| match file_layer(path) {
        Ok(layer) => Some(layer),
        Err(e) => {
            open_error = Some((path.to_path_buf(), e));
            None
        }
    });

    let installed = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer())
        .with(file)
        .try_init();
    if installed.is_err() {
        return;
    }

    if let Some((path, e)) = open_error {
        warn!(
            "Could not open log file {}: {}. Logging to stdout only.",
            path.display(),
            e
        );
    }
}
