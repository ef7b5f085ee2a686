//! HTTP routes
//!
//! | Method | Path | Access |
//! |---|---|---|
//! | GET | /health, /ready | public |
//! | POST | /auth/register, /auth/login | public |
//! | POST | /users | signed in |
//! | GET | /users/students | teacher |
//! | POST | /assignments | student |
//! | GET | /assignments | teacher |
//! | GET | /assignments/{studentId} | that student or a teacher |
//! | POST | /grades | teacher |
//! | GET | /grades | teacher |
//! | GET | /grades/ai/{assignmentId} | teacher |
//! | GET | /grades/{studentId} | that student or a teacher |

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::handlers::{assignments, auth, grades, users};
use crate::health::{health, readiness};
use crate::middleware::JwtAuth;
use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users", post(users::create))
        .route("/users/students", get(users::list_students))
        .route("/assignments", post(assignments::submit).get(assignments::list))
        .route("/assignments/{student_id}", get(assignments::list_for_student))
        .route("/grades", post(grades::grade).get(grades::list))
        .route("/grades/ai/{assignment_id}", get(grades::recommend))
        .route("/grades/{student_id}", get(grades::list_for_student))
        .route_layer(from_fn_with_state(state.jwt.clone(), JwtAuth::middleware));

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(readiness))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::PasswordHasher;
    use crate::config::Config;
    use crate::database::memory_pool;
    use crate::grading::testing::CannedAdvisor;
    use crate::notifications::testing::RecordingPublisher;

    struct TestApp {
        router: Router,
        publisher: Arc<RecordingPublisher>,
    }

    impl TestApp {
        async fn new() -> Self {
            Self::with_advisor(CannedAdvisor::Reply(
                r#"Well done. const result={"grade":8.5,"feedback":"Nice proof"}"#,
            ))
            .await
        }

        async fn with_advisor(advisor: CannedAdvisor) -> Self {
            let publisher = Arc::new(RecordingPublisher::default());
            let state = AppState::builder(Config::default(), memory_pool().await)
                .hasher(PasswordHasher::new(1024, 1, 1).unwrap())
                .publisher(publisher.clone())
                .advisor(Arc::new(advisor))
                .build()
                .await
                .unwrap();
            Self {
                router: router(state),
                publisher,
            }
        }

        async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => request.body(Body::empty()).unwrap(),
            };
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn register(&self, name: &str, email: &str, role: &str) -> Value {
            let response = self
                .send(
                    Method::POST,
                    "/auth/register",
                    None,
                    Some(json!({ "name": name, "email": email, "password": "secret1", "role": role })),
                )
                .await;
            assert_eq!(response.status(), StatusCode::CREATED);
            body_json(response).await
        }

        async fn login(&self, email: &str) -> String {
            let response = self
                .send(
                    Method::POST,
                    "/auth/login",
                    None,
                    Some(json!({ "email": email, "password": "secret1" })),
                )
                .await;
            assert_eq!(response.status(), StatusCode::OK);
            body_json(response).await["token"]
                .as_str()
                .unwrap()
                .to_string()
        }

        async fn submit(&self, token: &str, title: &str, subject: &str) -> Value {
            let response = self
                .send(
                    Method::POST,
                    "/assignments",
                    Some(token),
                    Some(json!({ "title": title, "content": format!("{title} content"), "subject": subject })),
                )
                .await;
            assert_eq!(response.status(), StatusCode::CREATED);
            body_json(response).await
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Teacher, two students, three assignments (two by Ada)
    async fn seeded() -> (TestApp, Value, Value, String, String, String) {
        let app = TestApp::new().await;
        app.register("Grace Hopper", "grace@school.test", "teacher").await;
        let ada = app.register("Ada Lovelace", "ada@school.test", "student").await;
        let bob = app.register("Bob Marley", "bob@school.test", "student").await;

        let teacher = app.login("grace@school.test").await;
        let ada_token = app.login("ada@school.test").await;
        let bob_token = app.login("bob@school.test").await;

        app.submit(&ada_token, "Algebra", "Math").await;
        app.submit(&ada_token, "Poetry", "English").await;
        app.submit(&bob_token, "Geometry", "Math").await;

        (app, ada, bob, teacher, ada_token, bob_token)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = TestApp::new().await;
        let response = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");

        let response = app.send(Method::GET, "/ready", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_hides_password_and_rejects_duplicates() {
        let app = TestApp::new().await;
        let user = app.register("Ada Lovelace", "ada@school.test", "student").await;
        assert_eq!(user["role"], "student");
        assert!(user.get("password").is_none());

        let response = app
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "name": "Ada", "email": "ada@school.test", "password": "secret1", "role": "student" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_register_validation_messages() {
        let app = TestApp::new().await;
        let response = app
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "name": "Ada", "email": "ada@school.test", "password": "secret1", "role": "admin" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "The role must be either 'student' or 'teacher'."
        );
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let app = TestApp::new().await;
        app.register("Ada Lovelace", "ada@school.test", "student").await;

        for email in ["ada@school.test", "nobody@school.test"] {
            let response = app
                .send(
                    Method::POST,
                    "/auth/login",
                    None,
                    Some(json!({ "email": email, "password": "wrong-password" })),
                )
                .await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let app = TestApp::new().await;
        let response = app.send(Method::GET, "/assignments", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.send(Method::GET, "/grades", Some("garbage"), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_role_guards() {
        let (app, ada, _, teacher, ada_token, _) = seeded().await;

        let response = app.send(Method::GET, "/assignments", Some(&ada_token), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(response).await["error"],
            "Forbidden: Requires role 'teacher'"
        );

        let response = app
            .send(
                Method::POST,
                "/assignments",
                Some(&teacher),
                Some(json!({ "title": "t", "content": "c", "subject": "Math" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app.send(Method::GET, "/users/students", Some(&teacher), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let students = body_json(response).await;
        assert_eq!(students.as_array().unwrap().len(), 2);
        assert_eq!(students[0]["id"], ada["id"]);
    }

    #[tokio::test]
    async fn test_create_user_requires_sign_in() {
        let (app, _, _, teacher, _, _) = seeded().await;
        let body = json!({
            "name": "Alan Turing",
            "email": "alan@school.test",
            "password": "secret1",
            "role": "teacher"
        });

        let response = app.send(Method::POST, "/users", None, Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.send(Method::POST, "/users", Some(&teacher), Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let user = body_json(response).await;
        assert_eq!(user["email"], "alan@school.test");
        assert!(user.get("password").is_none());
        app.login("alan@school.test").await;

        let response = app.send(Method::POST, "/users", Some(&teacher), Some(body)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_submit_publishes_notice_to_teachers() {
        let (app, ada, _, _, _, _) = seeded().await;

        let notices = app.publisher.notices.lock().unwrap();
        assert_eq!(notices.len(), 3);
        assert_eq!(notices[0].emails, vec!["grace@yopmail.com"]);
        assert_eq!(notices[0].student.id, ada["id"].as_i64().unwrap());
        assert_eq!(notices[0].assignment.title, "Algebra");
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_subject() {
        let (app, _, _, _, ada_token, _) = seeded().await;
        let response = app
            .send(
                Method::POST,
                "/assignments",
                Some(&ada_token),
                Some(json!({ "title": "History", "content": "1066", "subject": "History" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "The subject must be either 'English' or 'Math'."
        );
    }

    #[tokio::test]
    async fn test_assignment_listing_envelope() {
        let (app, _, _, teacher, _, _) = seeded().await;

        let response = app.send(Method::GET, "/assignments", Some(&teacher), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_json(response).await;
        assert_eq!(page["total"], 3);
        assert_eq!(page["page"], 1);
        assert_eq!(page["limit"], 3);
        assert_eq!(page["totalPages"], 1);

        let response = app
            .send(
                Method::GET,
                "/assignments?page=2&limit=2&sortBy=title&sortOrder=ASC",
                Some(&teacher),
                None,
            )
            .await;
        let page = body_json(response).await;
        assert_eq!(page["total"], 3);
        assert_eq!(page["totalPages"], 2);
        assert_eq!(page["data"].as_array().unwrap().len(), 1);
        assert_eq!(page["data"][0]["title"], "Poetry");
    }

    #[tokio::test]
    async fn test_assignment_filters() {
        let (app, _, _, teacher, _, _) = seeded().await;

        let response = app
            .send(Method::GET, "/assignments?subject=Math", Some(&teacher), None)
            .await;
        assert_eq!(body_json(response).await["total"], 2);

        let response = app
            .send(Method::GET, "/assignments?search=BOB", Some(&teacher), None)
            .await;
        let page = body_json(response).await;
        assert_eq!(page["total"], 1);
        assert_eq!(page["data"][0]["title"], "Geometry");

        let response = app
            .send(Method::GET, "/assignments?sortBy=password", Some(&teacher), None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .send(Method::GET, "/assignments?page=0", Some(&teacher), None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_student_scoped_listing() {
        let (app, ada, bob, teacher, ada_token, _) = seeded().await;
        let ada_id = ada["id"].as_i64().unwrap();
        let bob_id = bob["id"].as_i64().unwrap();

        let response = app
            .send(Method::GET, &format!("/assignments/{ada_id}"), Some(&ada_token), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_json(response).await;
        assert_eq!(page["total"], 2);
        assert!(page["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|a| a["student"]["id"] == ada["id"]));

        let response = app
            .send(Method::GET, &format!("/assignments/{bob_id}"), Some(&ada_token), None)
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .send(
                Method::GET,
                &format!("/assignments/{bob_id}?subject=English"),
                Some(&teacher),
                None,
            )
            .await;
        assert_eq!(body_json(response).await["total"], 0);

        let response = app
            .send(Method::GET, "/assignments/not-a-number", Some(&teacher), None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_grading_upserts_single_grade() {
        let (app, ada, _, teacher, ada_token, _) = seeded().await;
        let ada_id = ada["id"].as_i64().unwrap();

        let response = app
            .send(Method::GET, &format!("/assignments/{ada_id}?sortBy=id"), Some(&ada_token), None)
            .await;
        let assignment_id = body_json(response).await["data"][0]["id"].as_i64().unwrap();

        let response = app
            .send(
                Method::POST,
                "/grades",
                Some(&teacher),
                Some(json!({ "assignmentId": assignment_id, "grade": 7.5, "feedback": "Good start" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let first = body_json(response).await;
        assert_eq!(first["grade"], 7.5);
        assert_eq!(first["assignment"]["student"]["id"], ada["id"]);

        let response = app
            .send(
                Method::POST,
                "/grades",
                Some(&teacher),
                Some(json!({ "assignmentId": assignment_id, "grade": 9 })),
            )
            .await;
        let second = body_json(response).await;
        assert_eq!(second["id"], first["id"]);
        assert_eq!(second["grade"], 9.0);
        assert_eq!(second["feedback"], "Good start");

        let response = app
            .send(Method::GET, &format!("/grades/{ada_id}"), Some(&ada_token), None)
            .await;
        let page = body_json(response).await;
        assert_eq!(page["total"], 1);
        assert_eq!(page["data"][0]["teacher"]["email"], "grace@school.test");

        let response = app
            .send(Method::GET, "/grades?search=good&page=1&limit=5", Some(&teacher), None)
            .await;
        let page = body_json(response).await;
        assert_eq!(page["total"], 1);
        assert_eq!(page["limit"], 5);
    }

    #[tokio::test]
    async fn test_grading_unknown_assignment_is_not_found() {
        let (app, _, _, teacher, ada_token, _) = seeded().await;
        let response = app
            .send(
                Method::POST,
                "/grades",
                Some(&teacher),
                Some(json!({ "assignmentId": 999, "grade": 5 })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .send(
                Method::POST,
                "/grades",
                Some(&ada_token),
                Some(json!({ "assignmentId": 1, "grade": 10 })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_ai_recommendation() {
        let (app, _, _, teacher, _, _) = seeded().await;

        let response = app.send(Method::GET, "/grades/ai/1", Some(&teacher), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "grade": 8.5, "feedback": "Nice proof" })
        );

        let response = app.send(Method::GET, "/grades/ai/999", Some(&teacher), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ai_rate_limit_fallback() {
        let app = TestApp::with_advisor(CannedAdvisor::RateLimited).await;
        app.register("Grace Hopper", "grace@school.test", "teacher").await;
        app.register("Ada Lovelace", "ada@school.test", "student").await;
        let teacher = app.login("grace@school.test").await;
        let ada = app.login("ada@school.test").await;
        let assignment = app.submit(&ada, "Algebra", "Math").await;

        let response = app
            .send(
                Method::GET,
                &format!("/grades/ai/{}", assignment["id"]),
                Some(&teacher),
                None,
            )
            .await;
        assert_eq!(
            body_json(response).await,
            json!({
                "grade": 10.0,
                "feedback": "Hang tight! The AI needs a short break. Try again in an hour!"
            })
        );
    }
}
