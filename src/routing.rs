//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        post_register,
    },
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    records::{
        create_record_endpoint, delete_record_endpoint, get_edit_record_page,
        get_new_record_page, get_receipt_page, get_records_csv, get_records_page,
        update_record_endpoint,
    },
    source::refresh_records,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::REGISTER_API, post(post_register))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::RECORDS_VIEW, get(get_records_page))
        .route(endpoints::NEW_RECORD_VIEW, get(get_new_record_page))
        .route(endpoints::EDIT_RECORD_VIEW, get(get_edit_record_page))
        .route(endpoints::RECEIPT_VIEW, get(get_receipt_page))
        .route(endpoints::RECORDS_CSV, get(get_records_csv))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::RECORDS_API, post(create_record_endpoint))
            .route(
                endpoints::RECORD,
                put(update_record_endpoint).delete(delete_record_endpoint),
            )
            .route(endpoints::REFRESH, post(refresh_records))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}


#[cfg(test)]
mod router_tests {
    use std::time::Duration;

    use axum_test::TestServer;

    use crate::{AppState, endpoints, test_utils::FakeApi};

    use super::build_router;

    async fn get_server() -> (TestServer, FakeApi) {
        let api = FakeApi::start().await;
        let state = AppState::new(
            api.client().base_url(),
            "foobar",
            "Etc/UTC",
            Duration::from_secs(60),
            false,
        )
        .unwrap();

        (TestServer::try_new(build_router(state)).unwrap(), api)
    }

    #[tokio::test]
    async fn pages_redirect_to_log_in_without_cookie() {
        let (server, _api) = get_server().await;

        for page in [
            endpoints::DASHBOARD_VIEW,
            endpoints::RECORDS_VIEW,
            endpoints::NEW_RECORD_VIEW,
            endpoints::RECORDS_CSV,
        ] {
            let response = server.get(page).await;

            response.assert_status_see_other();
            let location = response.header("location");
            assert!(
                location.to_str().unwrap().starts_with(endpoints::LOG_IN_VIEW),
                "want {page} to redirect to log in, got {location:?}"
            );
        }
    }

    #[tokio::test]
    async fn htmx_endpoints_redirect_with_header() {
        let (server, _api) = get_server().await;

        let response = server.post(endpoints::REFRESH).await;

        response.assert_status_ok();
        assert!(
            response
                .header("hx-redirect")
                .to_str()
                .unwrap()
                .starts_with(endpoints::LOG_IN_VIEW)
        );
    }

    #[tokio::test]
    async fn log_in_page_is_public() {
        let (server, _api) = get_server().await;

        server.get(endpoints::LOG_IN_VIEW).await.assert_status_ok();
        server.get(endpoints::REGISTER_VIEW).await.assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (server, _api) = get_server().await;

        server
            .get("/definitely/not/a/page")
            .await
            .assert_status_not_found();
    }
}
