/*!
# Warbler

A small server-rendered social network built on salvo: users sign up, post
short messages and follow each other.

Every request passes through the same stack of hoops:

1. salvo's [`Logger`].
2. [`affix_state`] injects the shared [`AppState`].
3. A cookie backed [`SessionHandler`] carries the logged-in user's id.
4. A session backed flash store carries one-shot notices across redirects.
5. [`auth::AuthGate`] resolves the session to a [`User`](warbler_models::User).

Mutating routes sit behind [`auth::require_login`], which redirects home
with `Access unauthorized.` instead of failing.
*/

use std::sync::Arc;

use salvo::flash::SessionStore as FlashSessionStore;
use salvo::logging::Logger;
use salvo::prelude::*;
use salvo::session::{CookieStore, SessionHandler};
use tera::Tera;
use warbler_models::Db;

pub mod auth;
pub mod config;
mod error;
pub mod routes;
pub mod views;

pub use config::Config;
pub use error::Error;

/// Shared handles available to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Connection pool.
    pub db: Db,
    /// Compiled page templates.
    pub templates: Arc<Tera>,
    /// bcrypt cost used for new passwords.
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Compiles the templates and wraps `db`.
    pub fn new(db: Db, bcrypt_cost: u32) -> Result<Self, Error> {
        Ok(Self {
            db,
            templates: Arc::new(views::templates()?),
            bcrypt_cost,
        })
    }
}

/// Clones the [`AppState`] out of the depot.
pub fn state(depot: &Depot) -> Result<AppState, Error> {
    depot.obtain::<AppState>().cloned().map_err(|_| Error::MissingState)
}

/// Builds the full router for `state`, signing sessions with `secret`.
pub fn router(state: AppState, secret: &[u8]) -> Result<Router, Error> {
    let session_handler = SessionHandler::builder(CookieStore::new(), secret)
        .cookie_name("warbler.session")
        .build()?;
    Ok(Router::new()
        .hoop(affix_state::inject(state))
        .hoop(session_handler)
        .hoop(FlashSessionStore::new().into_handler())
        .hoop(auth::AuthGate)
        .push(routes::router()))
}

/// Wraps [`router`] in a [`Service`] with request logging.
pub fn service(state: AppState, secret: &[u8]) -> Result<Service, Error> {
    Ok(Service::new(router(state, secret)?).hoop(Logger::new()))
}

/// Connects to the configured database, applies the schema and builds the service.
pub async fn build(config: &Config) -> Result<(Service, AppState), Error> {
    let db = warbler_models::db::connect(&config.database_url).await?;
    warbler_models::db::migrate(&db).await?;
    let state = AppState::new(db, config.bcrypt_cost)?;
    let service = service(state.clone(), &config.secret_key)?;
    Ok((service, state))
}
