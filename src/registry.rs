//! The process-wide logger.
//!
//! Call sites that cannot be handed a `Logger` reach the installed one through
//! [`instance`]. Installation and teardown are explicit; nothing is created
//! behind the caller's back.

use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::{Error, Logger, Result};

static INSTANCE: Lazy<RwLock<Option<Arc<Logger>>>> = Lazy::new(|| RwLock::new(None));

/// Install `logger` as the process-wide instance.
///
/// Fails if another logger is already installed; `logger` is then closed.
pub fn install(logger: Logger) -> Result<Arc<Logger>> {
    let mut slot = INSTANCE.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return Err(Error::Init(
            "a process-wide logger is already installed".to_string(),
        ));
    }
    let logger = Arc::new(logger);
    *slot = Some(Arc::clone(&logger));
    Ok(logger)
}

/// The installed logger, if any.
pub fn instance() -> Option<Arc<Logger>> {
    INSTANCE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Close and uninstall the process-wide logger.
///
/// Returns `false` when none was installed. Handles obtained from
/// [`instance`] stay valid but their session is closed.
pub fn shutdown() -> bool {
    let taken = INSTANCE
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    match taken {
        Some(logger) => {
            logger.close();
            true
        }
        None => false,
    }
}
