//! Page rendering.
use salvo::flash::FlashDepotExt;
use salvo::prelude::*;
use serde::Serialize;
use tera::{Context, Tera};

use crate::auth::CurrentUserDepotExt;
use crate::{AppState, Error};

macro_rules! template {
    ($name:literal) => {
        ($name, include_str!(concat!("../templates/", $name)))
    };
}

/// Compiles the bundled templates.
pub fn templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        template!("base.html"),
        template!("macros.html"),
        template!("home.html"),
        template!("home-anon.html"),
        template!("users/login.html"),
        template!("users/signup.html"),
        template!("users/index.html"),
        template!("users/profile.html"),
        template!("users/show.html"),
        template!("users/following.html"),
        template!("users/followers.html"),
        template!("users/edit.html"),
        template!("messages/new.html"),
        template!("messages/show.html"),
    ])?;
    Ok(tera)
}

#[derive(Serialize)]
struct FlashView {
    level: String,
    text: String,
}

/// A context prefilled with the current user and this request's flash messages.
pub fn page(depot: &mut Depot) -> Context {
    let mut ctx = Context::new();
    if let Some(user) = depot.current_user() {
        ctx.insert("current_user", user);
    }
    let flashes: Vec<FlashView> = depot
        .incoming_flash()
        .map(|flash| {
            flash
                .iter()
                .map(|message| FlashView {
                    level: format!("{:?}", message.level).to_lowercase(),
                    text: message.value.clone(),
                })
                .collect()
        })
        .unwrap_or_default();
    ctx.insert("flashes", &flashes);
    ctx
}

/// Renders `name` as an HTML response body.
pub fn render(state: &AppState, name: &str, ctx: &Context) -> Result<Text<String>, Error> {
    let body = state.templates.render(name, ctx)?;
    Ok(Text::Html(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_compile() {
        let tera = templates().unwrap();
        let names: Vec<_> = tera.get_template_names().collect();
        assert!(names.contains(&"users/show.html"));
    }

    #[test]
    fn test_message_text_is_escaped() {
        let tera = templates().unwrap();
        let mut ctx = Context::new();
        ctx.insert("flashes", &Vec::<String>::new());
        ctx.insert("text", "<script>alert(1)</script>");
        ctx.insert("errors", &Vec::<String>::new());
        let html = tera.render("messages/new.html", &ctx).unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert(1)</script>"));
    }
}
