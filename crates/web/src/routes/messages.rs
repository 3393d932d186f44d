//! Posting, viewing and deleting messages.
use salvo::prelude::*;
use warbler_models::{Message, NewMessage, User};

use super::logged_in;
use crate::{Error, auth, state, views};

/// Routes under `/messages`.
pub fn router() -> Router {
    Router::with_path("messages")
        .push(
            Router::with_path("new")
                .hoop(auth::require_login)
                .get(new_form)
                .post(create),
        )
        .push(
            Router::with_path("{id}")
                .get(show)
                .push(Router::with_path("delete").hoop(auth::require_login).post(delete)),
        )
}

fn render_new(depot: &mut Depot, res: &mut Response, text: &str, errors: &[String]) -> Result<(), Error> {
    let state = state(depot)?;
    let mut ctx = views::page(depot);
    ctx.insert("text", text);
    ctx.insert("errors", errors);
    res.render(views::render(&state, "messages/new.html", &ctx)?);
    Ok(())
}

/// Checks message text typed into the form.
fn validate(text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err("Message text is required.".to_owned());
    }
    if text.chars().count() > Message::MAX_LEN {
        return Err(format!("Messages are limited to {} characters.", Message::MAX_LEN));
    }
    Ok(())
}

/// Form for a new message.
#[handler]
pub async fn new_form(depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    render_new(depot, res, "", &[])
}

/// Posts a message as the current user.
///
/// Invalid text re-renders the form without writing anything.
#[handler]
pub async fn create(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let state = state(depot)?;
    let me = logged_in(depot)?;
    let text = req.form::<String>("text").await.unwrap_or_default();
    if let Err(error) = validate(&text) {
        return render_new(depot, res, &text, &[error]);
    }
    Message::create(&state.db, NewMessage::new(text.trim(), me.id)).await?;
    res.render(Redirect::found(format!("/users/{}", me.id)));
    Ok(())
}

/// A single message with its author.
#[handler]
pub async fn show(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let state = state(depot)?;
    let id = req.param::<i64>("id").ok_or(Error::NotFound)?;
    let message = Message::find(&state.db, id).await?.ok_or(Error::NotFound)?;
    let author = User::find(&state.db, message.user_id).await?.ok_or(Error::NotFound)?;
    let mut ctx = views::page(depot);
    ctx.insert("message", &message);
    ctx.insert("author", &author);
    res.render(views::render(&state, "messages/show.html", &ctx)?);
    Ok(())
}

/// Deletes a message owned by the current user.
///
/// Anyone else is turned away and the message is kept.
#[handler]
pub async fn delete(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let state = state(depot)?;
    let me = logged_in(depot)?;
    let id = req.param::<i64>("id").ok_or(Error::NotFound)?;
    let message = Message::find(&state.db, id).await?.ok_or(Error::NotFound)?;
    if message.user_id != me.id {
        tracing::warn!(message_id = id, user_id = me.id, "delete of a message owned by someone else");
        auth::deny(depot, res);
        return Ok(());
    }
    Message::delete(&state.db, message.id).await?;
    res.render(Redirect::found(format!("/users/{}", me.id)));
    Ok(())
}
