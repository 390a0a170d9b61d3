//! Helpers for redirect URLs during authentication flows.

use axum::{
    extract::Request,
    http::{HeaderMap, Uri},
};

use crate::endpoints;

fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(redirect_url);

    path != endpoints::LOG_IN_VIEW && path != endpoints::LOG_OUT
}

/// Reduce `raw_url` to a path and query on this site, or `None` if it points
/// elsewhere or back to the log-in page.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// The path and query of the page that sent an HTMX request, taken from the
/// `HX-Current-URL` header.
///
/// HTMX sends the full URL, so the scheme and host are dropped.
pub fn hx_current_path(headers: &HeaderMap) -> Option<String> {
    let current_url = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())?;
    let path_and_query = current_url
        .parse::<Uri>()
        .ok()?
        .path_and_query()?
        .as_str()
        .to_owned();

    if is_safe_redirect_url(&path_and_query) {
        Some(path_and_query)
    } else {
        tracing::warn!("Invalid HX-Current-URL header value: {current_url}");
        None
    }
}

/// Build the URL of the log-in page that returns the client to where `request` was headed.
///
/// Requests to `/api` routes come from HTMX, so the page that made the
/// request is used instead of the API route.
pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let redirect_target = if request.uri().path().starts_with("/api") {
        redirect_target_from_hx_request(request.headers())?
    } else {
        normalize_redirect_url(request.uri().path_and_query()?.as_str())?
    };

    build_log_in_redirect_url_from_target(&redirect_target)
}

pub(super) fn build_log_in_redirect_url_from_target(redirect_target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => Some(format!("{}?{}", endpoints::LOG_IN_VIEW, param)),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}");
            None
        }
    }
}

fn redirect_target_from_hx_request(headers: &HeaderMap) -> Option<String> {
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        tracing::warn!("Missing HX-Request header for /api request.");
        return None;
    }

    hx_current_path(headers)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::Request,
        http::{HeaderMap, HeaderValue},
    };

    use crate::endpoints;

    use super::{build_log_in_redirect_url, hx_current_path, normalize_redirect_url};

    #[test]
    fn keeps_local_paths_with_query() {
        assert_eq!(
            normalize_redirect_url("/records?period=week&week=2024-W10"),
            Some("/records?period=week&week=2024-W10".to_owned())
        );
    }

    #[test]
    fn rejects_other_sites_and_log_in_page() {
        assert_eq!(normalize_redirect_url("https://example.com/records"), None);
        assert_eq!(normalize_redirect_url("//example.com"), None);
        assert_eq!(normalize_redirect_url(endpoints::LOG_IN_VIEW), None);
        assert_eq!(normalize_redirect_url("records"), None);
    }

    #[test]
    fn hx_current_path_drops_host() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "hx-current-url",
            HeaderValue::from_static("http://localhost:3000/dashboard?period=month&month=2024-03"),
        );

        assert_eq!(
            hx_current_path(&headers),
            Some("/dashboard?period=month&month=2024-03".to_owned())
        );
    }

    #[test]
    fn hx_current_path_is_none_without_header() {
        assert_eq!(hx_current_path(&HeaderMap::new()), None);
    }

    #[test]
    fn page_request_redirects_back_to_page() {
        let request = Request::builder()
            .uri("/records?q=ana")
            .body(Body::empty())
            .unwrap();

        let got = build_log_in_redirect_url(&request);

        let want_query = serde_urlencoded::to_string([("redirect_url", "/records?q=ana")]).unwrap();
        assert_eq!(got, Some(format!("{}?{want_query}", endpoints::LOG_IN_VIEW)));
    }

    #[test]
    fn api_request_without_htmx_headers_has_no_target() {
        let request = Request::builder()
            .uri(endpoints::RECORDS_API)
            .body(Body::empty())
            .unwrap();

        assert_eq!(build_log_in_redirect_url(&request), None);
    }
}
