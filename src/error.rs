// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::extent::KeyExtent;
use crate::location::ServerAddress;

/// Represents errors that can occur while locating or binning tablets.
#[derive(Debug)]
pub enum Error {
    /// A metadata lookup returned two distinct servers for the same extent
    /// in the same read. Fatal to the current call; the cache is left
    /// unchanged.
    InconsistentMetadata {
        extent: KeyExtent,
        first: ServerAddress,
        second: ServerAddress,
    },

    /// The metadata RPC (through the external `LocationObtainer`) failed.
    /// Retried internally with fixed backoff; only surfaced once the
    /// caller's deadline is exceeded.
    Transport(Box<dyn std::error::Error + Send + Sync + 'static>),

    /// An argument was rejected before any state was mutated.
    InvalidArgument(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InconsistentMetadata {
                extent,
                first,
                second,
            } => write!(
                f,
                "inconsistent metadata for extent {extent}: got both {first} and {second}"
            ),
            Self::Transport(source) => write!(f, "tablet location RPC failed: {source}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(source) => Some(source.as_ref()),
            Self::InconsistentMetadata { .. } | Self::InvalidArgument(_) => None,
        }
    }
}

/// Tablet locator result.
pub type Result<T> = std::result::Result<T, Error>;
