//! Authentication: credential checks, the forced password-change step and
//! session marker maintenance. Credentials are verified against the freshest
//! user collection, so a password changed on another client takes effect on
//! the next attempt here.

use super::{Engine, ViewKind};
use crate::error::{EngineError, EngineResult};
use crate::filter::TaskFilter;
use crate::store::now_ms;
use crate::types::User;
use tracing::{info, warn};

impl Engine {
    /// Attempt to sign in. A user flagged `must_change_password` is never
    /// signed in directly; the engine enters password-change mode instead and
    /// the caller must finish with [`Engine::complete_password_change`].
    pub async fn login(&self, login: &str, password: &str) -> EngineResult<()> {
        self.refresh().await;
        let users = self.store().users();
        let login = login.trim().to_lowercase();

        let Some(user) = users.iter().find(|u| u.login.to_lowercase() == login) else {
            warn!(login = %login, "Login attempt for unknown user");
            let err = EngineError::invalid_credentials();
            self.state().auth_error = Some(err.to_string());
            return Err(err);
        };
        if user.password != password {
            let err = EngineError::invalid_credentials();
            self.state().auth_error = Some(err.to_string());
            return Err(err);
        }

        if user.must_change_password {
            info!(login = %login, "First login; forcing password change");
            let mut state = self.state();
            state.change_password_mode = true;
            state.pending_login = Some(user.login.clone());
            state.auth_error = None;
            return Ok(());
        }

        self.sign_in(user.clone());
        Ok(())
    }

    /// Finish the forced password change started by [`Engine::login`] and
    /// sign the user in with the new credentials.
    pub async fn complete_password_change(
        &self,
        new_password: &str,
        confirm: &str,
    ) -> EngineResult<()> {
        let pending = {
            let state = self.state();
            if !state.change_password_mode {
                return Err(EngineError::internal("no password change in progress"));
            }
            state.pending_login.clone()
        };
        let Some(login) = pending else {
            return Err(EngineError::internal("no password change in progress"));
        };
        if new_password != confirm {
            let err = EngineError::password_mismatch();
            self.state().auth_error = Some(err.to_string());
            return Err(err);
        }

        self.refresh().await;
        let mut users = self.store().users();
        let Some(user) = users.iter_mut().find(|u| u.login == login) else {
            let err = EngineError::user_not_found(&login);
            self.state().auth_error = Some(err.to_string());
            return Err(err);
        };
        user.password = new_password.to_string();
        user.must_change_password = false;
        let signed_in = user.clone();
        self.update_users(users);

        {
            let mut state = self.state();
            state.change_password_mode = false;
            state.pending_login = None;
        }
        self.sign_in(signed_in);
        Ok(())
    }

    /// Sign out, clear the session marker and reset the navigation state.
    pub fn logout(&self) {
        if let Some(user) = self.current_user() {
            info!(user = %user.login, "Signed out");
        }
        self.session().clear_user();
        {
            let mut state = self.state();
            state.current_user = None;
            state.open_task = None;
            state.active_doc_id = None;
            state.current_view = ViewKind::Home;
            state.filter = TaskFilter::default();
            state.change_password_mode = false;
            state.pending_login = None;
            state.auth_error = None;
        }
        self.poke();
    }

    fn sign_in(&self, user: User) {
        info!(user = %user.login, at = now_ms(), "Signed in");
        self.session().set_user_id(&user.id);
        {
            let mut state = self.state();
            state.current_user = Some(user);
            state.auth_error = None;
        }
        self.auto_select_table();
        self.poke();
    }
}
