//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::{IntoResponse, Response},
    routing::{get, put},
};

use crate::{
    AppState, Error,
    auth::auth_guard,
    category::{get_categories_endpoint, get_category_stats_endpoint},
    endpoints,
    health::get_health,
    summary::get_summary_endpoint,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        list_transactions_endpoint,
    },
    user::{get_current_user, set_budget_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::HEALTH, get(get_health));

    let protected_routes = Router::new()
        .route(endpoints::CURRENT_USER, get(get_current_user))
        .route(endpoints::BUDGET, put(set_budget_endpoint))
        .route(
            endpoints::TRANSACTIONS_API,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::SUMMARY, get(get_summary_endpoint))
        .route(
            endpoints::TRANSACTION,
            put(edit_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(endpoints::CATEGORIES, get(get_categories_endpoint))
        .route(endpoints::CATEGORY_STATS, get(get_category_stats_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}

#[cfg(test)]
mod routing_tests {
    use axum::{
        Router,
        extract::{Path, State},
        http::StatusCode,
        routing::post,
    };
    use axum_extra::extract::PrivateCookieJar;
    use axum_test::{TestResponse, TestServer};
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState,
        auth::set_auth_cookie,
        endpoints::{self, format_endpoint},
        user::{User, UserID, create_user},
    };

    use super::build_router;

    const TEST_LOG_IN_ROUTE_PATH: &str = "/test/log_in/{user_id}";

    async fn stub_log_in_route(
        State(state): State<AppState>,
        Path(user_id): Path<i64>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, StatusCode> {
        set_auth_cookie(jar, UserID::new(user_id), state.cookie_duration)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    }

    struct TestApp {
        server: TestServer,
        alice: User,
        bob: User,
    }

    impl TestApp {
        fn new() -> Self {
            let state = AppState::new(
                Connection::open_in_memory().unwrap(),
                "foobar",
                "Etc/UTC",
            )
            .unwrap();
            let (alice, bob) = {
                let connection = state.db_connection.lock().unwrap();
                (
                    create_user("Alice", None, &connection).unwrap(),
                    create_user("Bob", None, &connection).unwrap(),
                )
            };

            let app = build_router(state.clone()).merge(
                Router::new()
                    .route(TEST_LOG_IN_ROUTE_PATH, post(stub_log_in_route))
                    .with_state(state),
            );

            Self {
                server: TestServer::new(app).expect("Could not create test server."),
                alice,
                bob,
            }
        }

        async fn log_in(&self, user: &User) -> TestResponse {
            let response = self
                .server
                .post(&format_endpoint(TEST_LOG_IN_ROUTE_PATH, user.id.as_i64()))
                .await;
            response.assert_status_ok();

            response
        }
    }

    fn groceries() -> Value {
        json!({
            "title": "Groceries",
            "amount": 100,
            "type": "expense",
            "category": "Food",
            "date": "2024-03-05T12:00:00Z",
        })
    }

    #[tokio::test]
    async fn health_does_not_need_log_in() {
        let app = TestApp::new();

        let response = app.server.get(endpoints::HEALTH).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "ok");
    }

    #[tokio::test]
    async fn api_routes_need_log_in() {
        let app = TestApp::new();

        for path in [
            endpoints::CURRENT_USER,
            endpoints::TRANSACTIONS_API,
            endpoints::SUMMARY,
            endpoints::CATEGORIES,
            endpoints::CATEGORY_STATS,
        ] {
            let response = app.server.get(path).await;

            assert_eq!(
                response.status_code(),
                StatusCode::UNAUTHORIZED,
                "expected {path} to need log in"
            );
            assert_eq!(
                response.json::<Value>()["message"],
                "You must be logged in to access this resource"
            );
        }
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let app = TestApp::new();

        let response = app.server.get("/api/nope").await;

        response.assert_status_not_found();
        assert!(response.json::<Value>()["message"].is_string());
    }

    #[tokio::test]
    async fn current_user_returns_profile() {
        let app = TestApp::new();
        let cookies = app.log_in(&app.alice).await.cookies();

        let response = app
            .server
            .get(endpoints::CURRENT_USER)
            .add_cookies(cookies)
            .await;

        response.assert_status_ok();
        response.assert_json(&app.alice);
    }

    #[tokio::test]
    async fn create_then_list_transactions() {
        let app = TestApp::new();
        let cookies = app.log_in(&app.alice).await.cookies();

        let response = app
            .server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookies(cookies.clone())
            .json(&groceries())
            .await;
        response.assert_status(StatusCode::CREATED);
        let created = response.json::<Value>();
        assert_eq!(created["amount"], json!(100.0));
        assert_eq!(created["type"], "expense");

        let response = app
            .server
            .get(endpoints::TRANSACTIONS_API)
            .add_cookies(cookies)
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!([created]));
    }

    #[tokio::test]
    async fn create_with_invalid_fields_lists_errors() {
        let app = TestApp::new();
        let cookies = app.log_in(&app.alice).await.cookies();

        let response = app
            .server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookies(cookies)
            .json(&json!({ "title": "Refund", "amount": -5, "type": "expense", "category": "Food" }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(
            response.json::<Value>()["errors"],
            json!([{ "field": "amount", "message": "Amount must be greater than zero" }])
        );
    }

    #[tokio::test]
    async fn wrongly_typed_or_malformed_body_lists_errors() {
        let app = TestApp::new();
        let cookies = app.log_in(&app.alice).await.cookies();

        let response = app
            .server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookies(cookies.clone())
            .json(&json!({ "title": 5, "amount": 10, "type": "expense", "category": "Food" }))
            .await;
        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"][0]["field"], "body");

        let response = app
            .server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookies(cookies.clone())
            .text("{\"title\": ")
            .content_type("application/json")
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["errors"][0]["field"], "body");

        let response = app
            .server
            .put(endpoints::BUDGET)
            .add_cookies(cookies)
            .text("not json")
            .content_type("application/json")
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["errors"][0]["field"], "body");
    }

    #[tokio::test]
    async fn huge_amounts_are_rejected_and_summary_still_works() {
        let app = TestApp::new();
        let cookies = app.log_in(&app.alice).await.cookies();
        let huge = json!({
            "title": "Lottery",
            "amount": "79228162514264337593543950335",
            "type": "income",
            "category": "Luck",
        });

        for _ in 0..2 {
            let response = app
                .server
                .post(endpoints::TRANSACTIONS_API)
                .add_cookies(cookies.clone())
                .json(&huge)
                .await;
            response.assert_status_bad_request();
            assert_eq!(response.json::<Value>()["errors"][0]["field"], "amount");
        }

        let response = app
            .server
            .get(endpoints::SUMMARY)
            .add_cookies(cookies)
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["totalIncome"], json!(0.0));
    }

    #[tokio::test]
    async fn list_filters_by_query_parameters() {
        let app = TestApp::new();
        let cookies = app.log_in(&app.alice).await.cookies();
        let salary = json!({
            "title": "Pay",
            "amount": "1000",
            "type": "income",
            "category": "Salary",
            "date": "2024-03-01",
        });
        for body in [groceries(), salary] {
            app.server
                .post(endpoints::TRANSACTIONS_API)
                .add_cookies(cookies.clone())
                .json(&body)
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = app
            .server
            .get(endpoints::TRANSACTIONS_API)
            .add_query_params(json!({ "month": 3, "year": 2024, "type": "income", "category": "" }))
            .add_cookies(cookies.clone())
            .await;
        response.assert_status_ok();
        let listed = response.json::<Value>();
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
        assert_eq!(listed[0]["category"], "Salary");

        let response = app
            .server
            .get(endpoints::TRANSACTIONS_API)
            .add_query_params(json!({ "month": 13, "year": 2024 }))
            .add_cookies(cookies)
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn other_users_cannot_change_transactions() {
        let app = TestApp::new();
        let alice_cookies = app.log_in(&app.alice).await.cookies();
        let bob_cookies = app.log_in(&app.bob).await.cookies();
        let created = app
            .server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookies(alice_cookies.clone())
            .json(&groceries())
            .await
            .json::<Value>();
        let id = created["id"].as_i64().unwrap();
        let path = format_endpoint(endpoints::TRANSACTION, id);

        app.server
            .put(&path)
            .add_cookies(bob_cookies.clone())
            .json(&groceries())
            .await
            .assert_status_forbidden();
        app.server
            .delete(&path)
            .add_cookies(bob_cookies.clone())
            .await
            .assert_status_forbidden();

        // Bob cannot see Alice's transactions either.
        let response = app
            .server
            .get(endpoints::TRANSACTIONS_API)
            .add_cookies(bob_cookies)
            .await;
        assert_eq!(response.json::<Value>(), json!([]));

        let response = app
            .server
            .get(endpoints::TRANSACTIONS_API)
            .add_cookies(alice_cookies)
            .await;
        assert_eq!(response.json::<Value>(), json!([created]));
    }

    #[tokio::test]
    async fn update_and_delete_transaction() {
        let app = TestApp::new();
        let cookies = app.log_in(&app.alice).await.cookies();
        let created = app
            .server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookies(cookies.clone())
            .json(&groceries())
            .await
            .json::<Value>();
        let path = format_endpoint(endpoints::TRANSACTION, created["id"].as_i64().unwrap());

        let response = app
            .server
            .put(&path)
            .add_cookies(cookies.clone())
            .json(&json!({
                "title": "Dinner",
                "amount": 45.5,
                "type": "expense",
                "category": "Eating out",
            }))
            .await;
        response.assert_status_ok();
        let updated = response.json::<Value>();
        assert_eq!(updated["title"], "Dinner");
        assert_eq!(updated["date"], created["date"]);

        let response = app.server.delete(&path).add_cookies(cookies.clone()).await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({ "message": "Transaction removed" })
        );

        app.server
            .delete(&path)
            .add_cookies(cookies)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn summary_with_budget() {
        let app = TestApp::new();
        let cookies = app.log_in(&app.alice).await.cookies();
        app.server
            .put(endpoints::BUDGET)
            .add_cookies(cookies.clone())
            .json(&json!({ "monthlyBudget": 120 }))
            .await
            .assert_status_ok();
        let transactions = [
            groceries(),
            json!({ "title": "Snacks", "amount": 50, "type": "expense", "category": "Food", "date": "2024-03-20" }),
            json!({ "title": "Pay", "amount": 1000, "type": "income", "category": "Salary", "date": "2024-03-01" }),
            json!({ "title": "Bus", "amount": 80, "type": "expense", "category": "Transport", "date": "2024-02-10" }),
        ];
        for body in transactions {
            app.server
                .post(endpoints::TRANSACTIONS_API)
                .add_cookies(cookies.clone())
                .json(&body)
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = app
            .server
            .get(endpoints::SUMMARY)
            .add_query_params(json!({ "month": 3, "year": 2024 }))
            .add_cookies(cookies)
            .await;

        response.assert_status_ok();
        let summary = response.json::<Value>();
        assert_eq!(summary["totalIncome"], json!(1000.0));
        assert_eq!(summary["totalExpenses"], json!(150.0));
        assert_eq!(summary["balance"], json!(850.0));
        assert_eq!(summary["categoryBreakdown"], json!({ "Food": 150.0 }));
        assert_eq!(summary["monthlyData"].as_array().map(Vec::len), Some(3));
        assert_eq!(
            summary["budget"],
            json!({ "monthlyBudget": 120.0, "spent": 150.0, "remaining": -30.0, "exceeded": true })
        );
    }

    #[tokio::test]
    async fn categories_and_stats() {
        let app = TestApp::new();
        let cookies = app.log_in(&app.alice).await.cookies();
        let transactions = [
            groceries(),
            json!({ "title": "Bus", "amount": 80, "type": "expense", "category": "Transport", "date": "2024-03-10" }),
            json!({ "title": "Pay", "amount": 1000, "type": "income", "category": "Salary", "date": "2024-03-01" }),
        ];
        for body in transactions {
            app.server
                .post(endpoints::TRANSACTIONS_API)
                .add_cookies(cookies.clone())
                .json(&body)
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = app
            .server
            .get(endpoints::CATEGORIES)
            .add_cookies(cookies.clone())
            .await;
        response.assert_status_ok();
        response.assert_json(&json!(["Food", "Salary", "Transport"]));

        let response = app
            .server
            .get(endpoints::CATEGORY_STATS)
            .add_query_params(json!({ "month": 3, "year": 2024 }))
            .add_cookies(cookies)
            .await;
        response.assert_status_ok();
        response.assert_json(&json!([
            { "category": "Food", "total": 100.0, "count": 1 },
            { "category": "Transport", "total": 80.0, "count": 1 },
        ]));
    }
}
