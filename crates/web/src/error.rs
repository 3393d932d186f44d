use salvo::prelude::*;

use crate::config::ConfigError;

const NOT_FOUND_HTML: &str = r#"<!DOCTYPE html>
<html>
    <head><title>Warbler</title></head>
    <body>
        <h1>404</h1>
        <p>Sorry, we can't find that page.</p>
        <a href="/">Go home</a>
    </body>
</html>
"#;

const SERVER_ERROR_HTML: &str = r#"<!DOCTYPE html>
<html>
    <head><title>Warbler</title></head>
    <body>
        <h1>500</h1>
        <p>Something went wrong on our side.</p>
        <a href="/">Go home</a>
    </body>
</html>
"#;

/// Errors a request handler or the server setup can fail with.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested user or message does not exist.
    #[error("not found")]
    NotFound,
    /// A data access failure.
    #[error(transparent)]
    Model(#[from] warbler_models::Error),
    /// A page template failed to render.
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
    /// Reading or writing the session failed.
    #[error("session error: {0}")]
    Session(String),
    /// A route that needs a logged-in user was reached without one.
    #[error("no user is logged in")]
    Unauthenticated,
    /// The application state was not injected into the depot.
    #[error("application state is missing")]
    MissingState,
    /// Invalid settings.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The router could not be assembled.
    #[error("server setup error: {0}")]
    Setup(#[from] salvo::Error),
}

#[async_trait]
impl Writer for Error {
    async fn write(self, _req: &mut Request, depot: &mut Depot, res: &mut Response) {
        match self {
            Self::Unauthenticated => crate::auth::deny(depot, res),
            Self::NotFound => {
                res.status_code(StatusCode::NOT_FOUND);
                res.render(Text::Html(NOT_FOUND_HTML));
            }
            e => {
                tracing::error!(error = %e, "request failed");
                res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
                res.render(Text::Html(SERVER_ERROR_HTML));
            }
        }
    }
}
