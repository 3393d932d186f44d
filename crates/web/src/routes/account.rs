//! Sign up, log in and log out.
use salvo::flash::FlashDepotExt;
use salvo::prelude::*;
use serde::Serialize;
use warbler_models::{Error as ModelError, Signup, User};

use crate::{Error, auth, state, views};

#[derive(Debug, Default, Serialize)]
struct SignupForm {
    username: String,
    email: String,
    image_url: String,
}

fn render_signup(
    depot: &mut Depot,
    res: &mut Response,
    form: &SignupForm,
    errors: &[String],
) -> Result<(), Error> {
    let state = state(depot)?;
    let mut ctx = views::page(depot);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    res.render(views::render(&state, "users/signup.html", &ctx)?);
    Ok(())
}

fn render_login(depot: &mut Depot, res: &mut Response, username: &str, errors: &[String]) -> Result<(), Error> {
    let state = state(depot)?;
    let mut ctx = views::page(depot);
    ctx.insert("username", username);
    ctx.insert("errors", errors);
    res.render(views::render(&state, "users/login.html", &ctx)?);
    Ok(())
}

/// Sign-up form.
#[handler]
pub async fn signup_form(depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    render_signup(depot, res, &SignupForm::default(), &[])
}

/// Creates the account and logs it in.
#[handler]
pub async fn signup(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let state = state(depot)?;
    let form = SignupForm {
        username: req.form::<String>("username").await.unwrap_or_default(),
        email: req.form::<String>("email").await.unwrap_or_default(),
        image_url: req.form::<String>("image_url").await.unwrap_or_default(),
    };
    let password = req.form::<String>("password").await;

    let mut errors = Vec::new();
    if form.username.trim().is_empty() {
        errors.push("Username is required.".to_owned());
    }
    if form.email.trim().is_empty() {
        errors.push("E-mail is required.".to_owned());
    }
    if !errors.is_empty() {
        return render_signup(depot, res, &form, &errors);
    }

    let new_user = Signup {
        username: Some(form.username.trim().to_owned()),
        email: Some(form.email.trim().to_owned()),
        password,
        image_url: Some(form.image_url.clone()),
    };
    match User::signup(&state.db, new_user, state.bcrypt_cost).await {
        Ok(user) => {
            auth::login(depot, &user)?;
            depot
                .outgoing_flash_mut()
                .success(format!("Welcome to Warbler, {}!", user.username));
            res.render(Redirect::found("/"));
            Ok(())
        }
        Err(ModelError::Integrity(reason)) => {
            tracing::debug!(%reason, "signup rejected");
            render_signup(depot, res, &form, &["Username already taken".to_owned()])
        }
        Err(ModelError::Validation(_)) => render_signup(depot, res, &form, &["Password is required.".to_owned()]),
        Err(e) => Err(e.into()),
    }
}

/// Login form.
#[handler]
pub async fn login_form(depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    render_login(depot, res, "", &[])
}

/// Checks the credentials and stores the user in the session.
#[handler]
pub async fn login(req: &mut Request, depot: &mut Depot, res: &mut Response) -> Result<(), Error> {
    let state = state(depot)?;
    let username = req.form::<String>("username").await.unwrap_or_default();
    let password = req.form::<String>("password").await.unwrap_or_default();

    match User::authenticate(&state.db, &username, &password).await? {
        Some(user) => {
            auth::login(depot, &user)?;
            depot.outgoing_flash_mut().success(format!("Hello, {}!", user.username));
            res.render(Redirect::found("/"));
            Ok(())
        }
        None => {
            tracing::warn!(%username, "invalid credentials");
            render_login(depot, res, &username, &["Invalid credentials.".to_owned()])
        }
    }
}

/// Clears the session and sends the user to the login form.
#[handler]
pub async fn logout(depot: &mut Depot, res: &mut Response) {
    auth::logout(depot);
    depot.outgoing_flash_mut().success("You have been logged out.");
    res.render(Redirect::found("/login"));
}
