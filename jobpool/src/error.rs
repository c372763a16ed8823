// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use thiserror::Error;

/// Errors of the batch lifecycle. Everything else a pool offers is infallible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The batch was never created, or it has been removed in the meantime.
    #[error("no batch named {0} exists")]
    NotFound(String),

    #[error("a batch named {0} already exists")]
    AlreadyExists(String),
}
