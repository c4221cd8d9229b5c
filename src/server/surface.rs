//! Dual-surface response selection
//!
//! Every protected or listable operation answers on two surfaces reading
//! the same underlying data: a JSON API under the `/_s/` path prefix and a
//! human-facing page elsewhere. The fetch/filter/authorize pipeline is
//! identical; only the final render differs, chosen by path prefix. Errors
//! follow the same rule: envelope on the JSON surface, page on the other.

use axum::Json;
use axum::http::Uri;
use axum::response::{Html, IntoResponse, Response};

use crate::core::error::ApiError;
use crate::core::query::Cursor;

/// Path prefix selecting the JSON surface
pub const SERVICE_PREFIX: &str = "/_s/";

/// Which rendering a request gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Json,
    Html,
}

impl Surface {
    /// Select the surface from the request path
    pub fn from_path(path: &str) -> Self {
        if path.starts_with(SERVICE_PREFIX) {
            Surface::Json
        } else {
            Surface::Html
        }
    }

    pub fn is_json(self) -> bool {
        matches!(self, Surface::Json)
    }
}

/// An [`ApiError`] bound to the surface it must render on
#[derive(Debug)]
pub struct SurfaceError {
    pub surface: Surface,
    pub error: ApiError,
}

impl SurfaceError {
    pub fn new(surface: Surface, error: ApiError) -> Self {
        Self { surface, error }
    }
}

impl IntoResponse for SurfaceError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        match self.surface {
            Surface::Json => (status, Json(self.error.envelope())).into_response(),
            Surface::Html => {
                let title = format!(
                    "Error {} ({})",
                    status.as_u16(),
                    self.error.error_name()
                );
                let body = format!("<p>{}</p>", html_escape(&self.error.to_string()));
                (status, Html(render_page(&title, &body))).into_response()
            }
        }
    }
}

/// Minimal HTML shell for the human surface.
///
/// Real template rendering is an external collaborator; the human surface
/// here only needs to carry the same data the JSON surface does.
pub fn render_page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n</body>\n</html>\n",
        html_escape(title),
        body
    )
}

/// Escape text destined for HTML element content or attribute values
pub fn html_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build the next-page URL by swapping the cursor parameter into the
/// current request's query string. The serializer only ever sees the
/// finished URL; the raw token stays a store concern.
pub fn more_url(uri: &Uri, cursor: &Cursor) -> String {
    let mut pairs: Vec<String> = uri
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.starts_with("cursor="))
        .map(str::to_string)
        .collect();
    pairs.push(format!("cursor={}", cursor.as_str()));
    format!("{}?{}", uri.path(), pairs.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_surface_from_path() {
        assert_eq!(Surface::from_path("/_s/user/"), Surface::Json);
        assert_eq!(Surface::from_path("/user/"), Surface::Html);
        assert_eq!(Surface::from_path("/"), Surface::Html);
        assert!(Surface::from_path("/_s/profile/").is_json());
    }

    #[test]
    fn test_surface_error_json_keeps_status() {
        let response = SurfaceError::new(
            Surface::Json,
            ApiError::Forbidden("administrator access required".into()),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_surface_error_html_keeps_status() {
        let response = SurfaceError::new(
            Surface::Html,
            ApiError::Unauthorized("sign-in required".into()),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape("<b>\"&'</b>"),
            "&lt;b&gt;&quot;&amp;&#39;&lt;/b&gt;"
        );
        assert_eq!(html_escape("plain"), "plain");
    }

    #[test]
    fn test_more_url_appends_cursor() {
        let uri: Uri = "/_s/user/?order=-created&limit=2".parse().unwrap();
        let url = more_url(&uri, &Cursor::new("tok123"));
        assert_eq!(url, "/_s/user/?order=-created&limit=2&cursor=tok123");
    }

    #[test]
    fn test_more_url_replaces_previous_cursor() {
        let uri: Uri = "/_s/user/?cursor=old&limit=2".parse().unwrap();
        let url = more_url(&uri, &Cursor::new("new"));
        assert_eq!(url, "/_s/user/?limit=2&cursor=new");
    }

    #[test]
    fn test_more_url_without_query() {
        let uri: Uri = "/_s/user/".parse().unwrap();
        let url = more_url(&uri, &Cursor::new("tok"));
        assert_eq!(url, "/_s/user/?cursor=tok");
    }
}
