//! Tracing setup for the demo binary.
//!
//! The field draws in the alternate screen, so logs normally go to a file.
//! `RUST_LOG` overrides the default `info` filter.

use crate::error::{LookupError, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// `-` selects stderr; anything else is a file path.
    pub fn parse(value: &str) -> Self {
        if value == "-" {
            Self::Stderr
        } else {
            Self::File(PathBuf::from(value))
        }
    }

    pub fn default_file() -> Self {
        Self::File(std::env::temp_dir().join("lookup-field.log"))
    }
}

pub fn init(target: &LogTarget) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    installed.map_err(|err| LookupError::source(format!("logging init failed: {err}")))?;

    tracing::info!(target = ?target, "logging initialized");
    Ok(())
}
