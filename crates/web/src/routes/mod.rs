//! HTTP handlers grouped by resource.
use salvo::prelude::*;
use warbler_models::{Message, User};

use crate::auth::CurrentUserDepotExt;
use crate::{Error, state, views};

pub mod account;
pub mod messages;
pub mod users;

/// Number of messages shown on the home timeline.
pub const TIMELINE_LIMIT: i64 = 100;

/// All application routes.
pub fn router() -> Router {
    Router::new()
        .get(home)
        .push(
            Router::with_path("signup")
                .get(account::signup_form)
                .post(account::signup),
        )
        .push(
            Router::with_path("login")
                .get(account::login_form)
                .post(account::login),
        )
        .push(Router::with_path("logout").get(account::logout))
        .push(users::router())
        .push(messages::router())
}

/// Timeline for a logged-in user, landing page otherwise.
#[handler]
pub async fn home(depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let state = state(depot)?;
    let me = depot.current_user().cloned();
    let mut ctx = views::page(depot);
    let Some(me) = me else {
        res.render(views::render(&state, "home-anon.html", &ctx)?);
        return Ok(());
    };
    ctx.insert("messages", &Message::timeline(&state.db, me.id, TIMELINE_LIMIT).await?);
    ctx.insert("stats", &me.stats(&state.db).await?);
    res.render(views::render(&state, "home.html", &ctx)?);
    Ok(())
}

/// The user admitted by [`crate::auth::require_login`].
pub(crate) fn logged_in(depot: &Depot) -> Result<User, Error> {
    depot.current_user().cloned().ok_or(Error::Unauthenticated)
}
