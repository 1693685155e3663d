//! Login handshake state machine.
//!
//! Every fragment is tested against the username prompt, then the password
//! prompt (only when a password is configured), then the shell banner. The
//! first match decides the action. Prompts are tested in that order on every
//! fragment regardless of the current state, so a server that repeats a
//! prompt (e.g. after a failed login) gets the same answer again.

use crate::channel::PromptPatterns;

/// Progress of the login handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// Nothing answered yet.
    AwaitingUsername,

    /// Username sent, password prompt expected.
    AwaitingPassword,

    /// Credentials sent, shell banner expected.
    AwaitingBanner,

    /// Shell banner seen.
    Authenticated,
}

/// What the session must do after a fragment was examined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginAction {
    /// Write the username line and keep scanning.
    SendUsername,

    /// Write the password line and keep scanning.
    SendPassword,

    /// Nothing matched; keep scanning.
    Continue,

    /// The banner matched; login is complete.
    Done,
}

/// Explicit login state machine driven one fragment at a time.
#[derive(Debug)]
pub struct LoginHandshake<'a> {
    patterns: &'a PromptPatterns,
    has_password: bool,
    state: LoginState,
}

impl<'a> LoginHandshake<'a> {
    /// Start a handshake. `has_password` enables the password step.
    pub fn new(patterns: &'a PromptPatterns, has_password: bool) -> Self {
        Self {
            patterns,
            has_password,
            state: LoginState::AwaitingUsername,
        }
    }

    /// Examine one line fragment and advance.
    pub fn advance(&mut self, fragment: &[u8]) -> LoginAction {
        if self.patterns.username.is_match(fragment) {
            self.state = if self.has_password {
                LoginState::AwaitingPassword
            } else {
                LoginState::AwaitingBanner
            };
            return LoginAction::SendUsername;
        }

        if self.has_password && self.patterns.password.is_match(fragment) {
            self.state = LoginState::AwaitingBanner;
            return LoginAction::SendPassword;
        }

        if self.patterns.banner.is_match(fragment) {
            self.state = LoginState::Authenticated;
            return LoginAction::Done;
        }

        LoginAction::Continue
    }

    /// Current state.
    pub fn state(&self) -> LoginState {
        self.state
    }

    /// Whether the banner has been seen.
    pub fn is_authenticated(&self) -> bool {
        self.state == LoginState::Authenticated
    }
}
