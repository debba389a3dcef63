//! Browser front-end served at `/`.

use crate::server::AppState;
use axum::response::Html;
use axum::routing::get;
use axum::Router;

const INDEX_PAGE: &str = include_str!("assets/index.html");

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_talks_to_the_rest_api() {
        assert!(INDEX_PAGE.contains("fetch(\"/info\")"));
        assert!(INDEX_PAGE.contains("fetch(\"/tts\""));
        assert!(INDEX_PAGE.contains("min=\"0.5\" max=\"2.0\""));
    }
}
