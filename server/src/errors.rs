use axum::response::{IntoResponse, Redirect, Response};

/// An error that is logged on the server and turned into `R` for the browser.
///
/// The report itself never reaches the client.
#[derive(Debug)]
pub struct ServerError<R: IntoResponse>(pub(crate) color_eyre::Report, pub(crate) R);

pub type ServerResult<S, F = Response> = Result<S, ServerError<F>>;

impl<R: IntoResponse> IntoResponse for ServerError<R> {
    fn into_response(self) -> axum::response::Response {
        tracing::error!(error = ?self.0, "Request Error");

        self.1.into_response()
    }
}

pub(crate) trait WithRedirect<T> {
    fn with_redirect(self, redirect: Redirect) -> Result<T, ServerError<Redirect>>;
}

impl<T, E> WithRedirect<T> for Result<T, E>
where
    E: Into<color_eyre::Report>,
{
    fn with_redirect(self, redirect: Redirect) -> Result<T, ServerError<Redirect>> {
        match self {
            Ok(val) => Ok(val),
            Err(err) => Err(ServerError(err.into(), redirect)),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};
    use color_eyre::eyre::eyre;

    use super::*;

    #[test]
    fn test_redirect_error_hides_report() {
        let result: Result<(), color_eyre::Report> =
            Err(eyre!("provider said: invalid_client secret=hunter2"));

        let response = result
            .with_redirect(Redirect::to("/"))
            .unwrap_err()
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }
}
