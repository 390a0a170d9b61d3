use axum::{body::Body, response::Response};
use scraper::{Html, Selector};

async fn read_body(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|error| panic!("could not read response body: {error}"));

    String::from_utf8_lossy(&body).into_owned()
}

pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    Html::parse_document(&read_body(response).await)
}

/// For HTMX responses, which are partial pages.
pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    Html::parse_fragment(&read_body(response).await)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(html.errors.is_empty(), "invalid HTML: {:?}", html.errors);
}

/// The trimmed text of the first element matching the CSS selector `css`.
#[track_caller]
pub(crate) fn text_of(html: &Html, css: &str) -> String {
    let selector = Selector::parse(css).unwrap_or_else(|error| panic!("bad selector {css:?}: {error}"));

    html.select(&selector)
        .next()
        .unwrap_or_else(|| panic!("nothing matches {css}"))
        .text()
        .collect::<String>()
        .trim()
        .to_owned()
}
