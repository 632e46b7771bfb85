use tracing::{debug, info};

/// Authorization state for the raw command channel.
///
/// Process-lifetime singleton in practice: created once with deployment
/// defaults and mutated only through the named setters below, which require the
/// sender to be the trusted principal. Toggle attempts from anyone else are
/// silently ignored (no error, no state change).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    elevated: bool,
    commands_enabled: bool,
    trusted_principal: String,
}

/// A trusted-principal toggle parsed off the chat surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDirective {
    SetElevated(bool),
    SetCommandsEnabled(bool),
}

impl AuthState {
    pub fn new(trusted_principal: impl Into<String>, elevated: bool, commands_enabled: bool) -> Self {
        Self {
            elevated,
            commands_enabled,
            trusted_principal: trusted_principal.into(),
        }
    }

    pub fn elevated(&self) -> bool {
        self.elevated
    }

    pub fn commands_enabled(&self) -> bool {
        self.commands_enabled
    }

    pub fn trusted_principal(&self) -> &str {
        &self.trusted_principal
    }

    /// The command gate: raw commands run iff commands are globally enabled or
    /// the agent is elevated.
    pub fn authorize_command(&self) -> bool {
        self.commands_enabled || self.elevated
    }

    /// Applies a directive if `sender` is the trusted principal. Returns
    /// whether the directive was applied.
    pub fn apply_directive(&mut self, sender: &str, directive: AuthDirective) -> bool {
        if !sender.eq_ignore_ascii_case(&self.trusted_principal) {
            debug!("auth.directive.ignored sender={sender}");
            return false;
        }
        match directive {
            AuthDirective::SetElevated(v) => self.elevated = v,
            AuthDirective::SetCommandsEnabled(v) => self.commands_enabled = v,
        }
        info!(
            "auth.directive.applied elevated={} commands_enabled={}",
            self.elevated, self.commands_enabled
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_passes_when_either_flag_is_set() {
        assert!(!AuthState::new("admin", false, false).authorize_command());
        assert!(AuthState::new("admin", false, true).authorize_command());
        assert!(AuthState::new("admin", true, false).authorize_command());
        assert!(AuthState::new("admin", true, true).authorize_command());
    }

    #[test]
    fn trusted_principal_can_toggle() {
        let mut auth = AuthState::new("admin", true, false);
        assert!(auth.apply_directive("admin", AuthDirective::SetElevated(false)));
        assert!(!auth.elevated());
        assert!(auth.apply_directive("Admin", AuthDirective::SetCommandsEnabled(true)));
        assert!(auth.commands_enabled());
    }

    #[test]
    fn untrusted_toggles_are_silently_ignored() {
        let mut auth = AuthState::new("admin", true, false);
        let before = auth.clone();
        assert!(!auth.apply_directive("griefer", AuthDirective::SetElevated(false)));
        assert!(!auth.apply_directive("griefer", AuthDirective::SetCommandsEnabled(true)));
        assert_eq!(auth, before);
    }
}
