//! Fatal-startup error taxonomy (§7).
//!
//! Operational failures (bad property, untracked window, truncated icon,
//! missing RandR) are not represented here: per §7 they are logged and
//! swallowed at the call site with `trace!`/`warn!` around best-effort X
//! calls instead of propagated.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WmError {
    #[error("could not open connection to the X display")]
    DisplayOpenFailed,

    #[error("another window manager already holds substructure redirection on the root window")]
    AnotherWmRunning,

    #[error("failed to create an essential cursor ({0})")]
    CursorCreateFailed(&'static str),
}
