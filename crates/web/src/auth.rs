//! Session based authentication.
//!
//! The id of the logged-in user lives in the session under
//! [`CURR_USER_KEY`]. [`AuthGate`] resolves it to a [`User`] at the start
//! of every request and [`require_login`] turns anonymous requests away.
use salvo::flash::FlashDepotExt;
use salvo::prelude::*;
use salvo::session::SessionDepotExt;
use warbler_models::User;

use crate::{AppState, Error};

/// Session key holding the logged-in user's id.
pub const CURR_USER_KEY: &str = "curr_user";

/// Key used when the current user is inserted into the depot.
pub const CURRENT_USER_KEY: &str = "::warbler::auth::current_user";

/// Flash message shown when an action needs a different session.
pub const UNAUTHORIZED: &str = "Access unauthorized.";

/// CurrentUserDepotExt
pub trait CurrentUserDepotExt {
    /// Get the logged-in user, if any.
    fn current_user(&self) -> Option<&User>;
}

impl CurrentUserDepotExt for Depot {
    fn current_user(&self) -> Option<&User> {
        self.get(CURRENT_USER_KEY).ok()
    }
}

/// Loads the user named by the session into the depot.
///
/// A session pointing at a deleted user is logged out.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuthGate;

impl AuthGate {
    async fn load(&self, depot: &Depot, user_id: i64) -> Result<Option<User>, Error> {
        let state = depot.obtain::<AppState>().map_err(|_| Error::MissingState)?;
        Ok(User::find(&state.db, user_id).await?)
    }
}

#[async_trait]
impl Handler for AuthGate {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        let user_id = depot.session().and_then(|session| session.get::<i64>(CURR_USER_KEY));
        if let Some(user_id) = user_id {
            match self.load(depot, user_id).await {
                Ok(Some(user)) => {
                    depot.insert(CURRENT_USER_KEY, user);
                }
                Ok(None) => {
                    tracing::debug!(user_id, "session names a missing user");
                    logout(depot);
                }
                Err(e) => {
                    e.write(req, depot, res).await;
                    ctrl.skip_rest();
                    return;
                }
            }
        }
        ctrl.call_next(req, depot, res).await;
    }
}

/// Rejects requests without a logged-in user.
#[handler]
pub async fn require_login(depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
    if depot.current_user().is_none() {
        deny(depot, res);
        ctrl.skip_rest();
    }
}

/// Flashes [`UNAUTHORIZED`] and redirects home, leaving all state untouched.
pub fn deny(depot: &mut Depot, res: &mut Response) {
    depot.outgoing_flash_mut().error(UNAUTHORIZED);
    res.render(Redirect::found("/"));
}

/// Stores `user` as the logged-in user of this session.
pub fn login(depot: &mut Depot, user: &User) -> Result<(), Error> {
    let session = depot
        .session_mut()
        .ok_or_else(|| Error::Session("session handler is not installed".into()))?;
    session
        .insert(CURR_USER_KEY, user.id)
        .map_err(|e| Error::Session(e.to_string()))?;
    tracing::info!(user_id = user.id, "logged in");
    Ok(())
}

/// Forgets the logged-in user.
pub fn logout(depot: &mut Depot) {
    if let Some(session) = depot.session_mut() {
        session.remove(CURR_USER_KEY);
    }
}
