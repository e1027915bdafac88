//! Export-in-progress guard.
//!
//! The PDF pipeline shares a staging area and a single engine, so only one
//! export may run at a time. A second request is rejected, not queued.

use emojiedit_core::ExportFormat;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Export-guard runtime errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportLockError {
    /// Another export holds the guard.
    Busy { running: ExportFormat },
    /// Internal mutex state is poisoned.
    Poisoned,
}

impl fmt::Display for ExportLockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy { running } => write!(f, "a {running} export is already in progress"),
            Self::Poisoned => write!(f, "export lock state is poisoned"),
        }
    }
}

impl std::error::Error for ExportLockError {}

/// Tracks the export currently in flight, if any.
#[derive(Default)]
pub struct ExportLock {
    running: Mutex<Option<ExportFormat>>,
}

impl ExportLock {
    fn state(&self) -> Result<MutexGuard<'_, Option<ExportFormat>>, ExportLockError> {
        self.running.lock().map_err(|_| ExportLockError::Poisoned)
    }

    /// Claim the guard for `format`; released when the returned guard drops.
    pub fn try_acquire(&self, format: ExportFormat) -> Result<ExportGuard<'_>, ExportLockError> {
        let mut running = self.state()?;
        if let Some(current) = *running {
            return Err(ExportLockError::Busy { running: current });
        }
        *running = Some(format);
        Ok(ExportGuard { lock: self })
    }

    /// Format of the export in flight, if any.
    pub fn running(&self) -> Option<ExportFormat> {
        self.state().ok().and_then(|running| *running)
    }
}

/// RAII handle for an in-flight export.
pub struct ExportGuard<'a> {
    lock: &'a ExportLock,
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        match self.lock.running.lock() {
            Ok(mut running) => *running = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}
