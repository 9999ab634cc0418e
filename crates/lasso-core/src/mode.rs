//! Static/Live mode resolution
//!
//! The mode decision is a small explicit state machine and the single
//! authoritative fallback point: no other component re-decides mode, and a
//! Live -> Static fallback is one-way within a session.

use crate::model::{CaptureMode, EffectiveMode, SessionEnvironment};

/// State of the mode decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModeState {
    /// The caller requested a mode; nothing has been decided yet
    Requested(CaptureMode),
    /// The environment is being consulted
    Resolving(CaptureMode),
    /// Terminal: the mode for this session, immutable from here on
    Resolved(EffectiveMode),
}

/// Resolves the requested capture mode against the session environment.
///
/// Live mode requires layer-shell capability; without it the controller
/// forces Static and records the fallback so the surrounding UI can notify
/// the user. Once resolved, the decision is final for the session.
///
/// # Examples
///
/// ```
/// use lasso_core::mode::ModeController;
/// use lasso_core::model::{CaptureMode, Compositor, Monitor, SessionEnvironment};
///
/// let env = SessionEnvironment {
///     compositor:  Compositor::Gnome,
///     backends:    vec![],
///     layer_shell: false,
///     monitors:    vec![Monitor::fallback()],
/// };
///
/// let mut controller = ModeController::new(CaptureMode::Live);
/// let effective = controller.resolve(&env);
/// assert_eq!(effective.mode, CaptureMode::Static);
/// assert!(effective.fell_back);
/// ```
#[derive(Debug)]
pub struct ModeController {
    state: ModeState,
}

impl ModeController {
    /// Creates a controller in the `Requested` state
    pub fn new(requested: CaptureMode) -> Self {
        Self {
            state: ModeState::Requested(requested),
        }
    }

    /// Resolves the mode against the environment.
    ///
    /// Idempotent: once resolved, further calls return the recorded decision
    /// without consulting the environment again.
    pub fn resolve(&mut self, env: &SessionEnvironment) -> EffectiveMode {
        let requested = match self.state {
            ModeState::Resolved(effective) => return effective,
            ModeState::Requested(mode) | ModeState::Resolving(mode) => mode,
        };
        self.state = ModeState::Resolving(requested);

        let effective = match requested {
            CaptureMode::Live if !env.layer_shell => {
                tracing::info!(
                    compositor = %env.compositor,
                    "live mode unavailable without layer-shell, falling back to static"
                );
                EffectiveMode {
                    mode:      CaptureMode::Static,
                    fell_back: true,
                }
            }
            mode => EffectiveMode {
                mode,
                fell_back: false,
            },
        };

        self.state = ModeState::Resolved(effective);
        effective
    }

    /// The resolved mode, or `None` while the decision is pending
    pub fn resolved(&self) -> Option<EffectiveMode> {
        match self.state {
            ModeState::Resolved(effective) => Some(effective),
            _ => None,
        }
    }
}
