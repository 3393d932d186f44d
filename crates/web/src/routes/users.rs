//! Profiles, the user directory and the follow graph.
use salvo::flash::FlashDepotExt;
use salvo::prelude::*;
use serde::Serialize;
use warbler_models::{Error as ModelError, Follows, ProfileUpdate, User};

use super::logged_in;
use crate::auth::{self, CurrentUserDepotExt};
use crate::{AppState, Error, state, views};

/// Routes under `/users`.
pub fn router() -> Router {
    Router::with_path("users")
        .get(index)
        .push(
            Router::with_hoop(auth::require_login)
                .push(
                    Router::with_path("profile")
                        .get(edit_profile_form)
                        .post(edit_profile),
                )
                .push(Router::with_path("delete").post(delete))
                .push(Router::with_path("follow/{id}").post(follow))
                .push(Router::with_path("stop-following/{id}").post(stop_following))
                .push(Router::with_path("{id}/following").get(following))
                .push(Router::with_path("{id}/followers").get(followers)),
        )
        .push(Router::with_path("{id}").get(show))
}

async fn find_user(req: &Request, state: &AppState) -> Result<User, Error> {
    let id = req.param::<i64>("id").ok_or(Error::NotFound)?;
    User::find(&state.db, id).await?.ok_or(Error::NotFound)
}

/// Renders a profile page: `user`, their stats and, for a logged-in
/// viewer, whether they already follow `user`.
async fn profile_page(
    state: &AppState,
    depot: &mut Depot,
    user: &User,
) -> Result<tera::Context, Error> {
    let is_following = match depot.current_user() {
        Some(me) => me.is_following(&state.db, user).await?,
        None => false,
    };
    let mut ctx = views::page(depot);
    ctx.insert("user", user);
    ctx.insert("stats", &user.stats(&state.db).await?);
    ctx.insert("is_following", &is_following);
    Ok(ctx)
}

/// Lists users, optionally filtered by `?q=`.
#[handler]
pub async fn index(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let state = state(depot)?;
    let query = req.query::<String>("q").unwrap_or_default();
    let users = User::search(&state.db, &query).await?;
    let mut ctx = views::page(depot);
    ctx.insert("users", &users);
    ctx.insert("q", &query);
    res.render(views::render(&state, "users/index.html", &ctx)?);
    Ok(())
}

/// Profile page with the user's messages.
#[handler]
pub async fn show(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let state = state(depot)?;
    let user = find_user(req, &state).await?;
    let mut ctx = profile_page(&state, depot, &user).await?;
    ctx.insert("messages", &user.messages(&state.db).await?);
    res.render(views::render(&state, "users/show.html", &ctx)?);
    Ok(())
}

/// Users `{id}` follows.
#[handler]
pub async fn following(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let state = state(depot)?;
    let user = find_user(req, &state).await?;
    let mut ctx = profile_page(&state, depot, &user).await?;
    ctx.insert("users", &user.following(&state.db).await?);
    res.render(views::render(&state, "users/following.html", &ctx)?);
    Ok(())
}

/// Users following `{id}`.
#[handler]
pub async fn followers(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let state = state(depot)?;
    let user = find_user(req, &state).await?;
    let mut ctx = profile_page(&state, depot, &user).await?;
    ctx.insert("users", &user.followers(&state.db).await?);
    res.render(views::render(&state, "users/followers.html", &ctx)?);
    Ok(())
}

/// Adds a follow edge from the current user to `{id}`.
#[handler]
pub async fn follow(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let state = state(depot)?;
    let me = logged_in(depot)?;
    let target = find_user(req, &state).await?;
    if target.id == me.id {
        depot.outgoing_flash_mut().warning("You cannot follow yourself.");
    } else {
        Follows::create(&state.db, me.id, target.id).await?;
    }
    res.render(Redirect::found(format!("/users/{}/following", me.id)));
    Ok(())
}

/// Removes the follow edge from the current user to `{id}`.
#[handler]
pub async fn stop_following(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let state = state(depot)?;
    let me = logged_in(depot)?;
    let target = find_user(req, &state).await?;
    Follows::delete(&state.db, me.id, target.id).await?;
    res.render(Redirect::found(format!("/users/{}/following", me.id)));
    Ok(())
}

#[derive(Debug, Default, Serialize)]
struct ProfileForm {
    username: String,
    email: String,
    image_url: String,
    header_image_url: String,
    bio: String,
    location: String,
}

impl From<&User> for ProfileForm {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            image_url: user.image_url.clone().unwrap_or_default(),
            header_image_url: user.header_image_url.clone().unwrap_or_default(),
            bio: user.bio.clone().unwrap_or_default(),
            location: user.location.clone().unwrap_or_default(),
        }
    }
}

fn render_edit(depot: &mut Depot, res: &mut Response, form: &ProfileForm, errors: &[String]) -> Result<(), Error> {
    let state = state(depot)?;
    let mut ctx = views::page(depot);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    res.render(views::render(&state, "users/edit.html", &ctx)?);
    Ok(())
}

/// Profile edit form, prefilled with the current values.
#[handler]
pub async fn edit_profile_form(depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let me = logged_in(depot)?;
    render_edit(depot, res, &ProfileForm::from(&me), &[])
}

/// Updates the profile after the password has been confirmed.
#[handler]
pub async fn edit_profile(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let state = state(depot)?;
    let me = logged_in(depot)?;
    let form = ProfileForm {
        username: req.form::<String>("username").await.unwrap_or_default(),
        email: req.form::<String>("email").await.unwrap_or_default(),
        image_url: req.form::<String>("image_url").await.unwrap_or_default(),
        header_image_url: req.form::<String>("header_image_url").await.unwrap_or_default(),
        bio: req.form::<String>("bio").await.unwrap_or_default(),
        location: req.form::<String>("location").await.unwrap_or_default(),
    };
    let password = req.form::<String>("password").await.unwrap_or_default();

    if User::authenticate(&state.db, &me.username, &password).await?.is_none() {
        return render_edit(depot, res, &form, &["Wrong password, please try again.".to_owned()]);
    }
    if form.username.trim().is_empty() || form.email.trim().is_empty() {
        return render_edit(depot, res, &form, &["Username and e-mail are required.".to_owned()]);
    }

    let update = ProfileUpdate {
        username: form.username.trim().to_owned(),
        email: form.email.trim().to_owned(),
        image_url: Some(form.image_url.clone()),
        header_image_url: Some(form.header_image_url.clone()),
        bio: Some(form.bio.clone()),
        location: Some(form.location.clone()),
    };
    match me.update_profile(&state.db, update).await {
        Ok(user) => {
            depot.outgoing_flash_mut().success("Profile updated.");
            res.render(Redirect::found(format!("/users/{}", user.id)));
            Ok(())
        }
        Err(ModelError::Integrity(_)) => {
            render_edit(depot, res, &form, &["Username or e-mail already taken.".to_owned()])
        }
        Err(e) => Err(e.into()),
    }
}

/// Deletes the current user with everything they own and logs out.
#[handler]
pub async fn delete(depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let state = state(depot)?;
    let me = logged_in(depot)?;
    let user_id = me.id;
    me.delete(&state.db).await?;
    auth::logout(depot);
    tracing::info!(user_id, "account deleted");
    depot.outgoing_flash_mut().success("Your account has been deleted.");
    res.render(Redirect::found("/signup"));
    Ok(())
}
