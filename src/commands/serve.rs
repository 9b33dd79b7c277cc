use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{Request, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router, ServiceExt};
use serde::Deserialize;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::controllers::paste::{self, Unlock};
use crate::envelope::Password;
use crate::error::AppError;
use crate::expiry::Expiry;
use crate::{pages, App};

pub async fn run(app: App) -> anyhow::Result<()> {
    let addr = SocketAddr::from((app.config.address, app.config.port));
    info!("listening on {addr}, sharing as {}", app.config.base_url);

    axum::Server::bind(&addr)
        .serve(ServiceExt::<Request<Body>>::into_make_service(service(app)))
        .await?;

    Ok(())
}

/// The router, with trailing slashes trimmed before routing.
pub fn service(app: App) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/", get(index).post(create_paste))
        .route("/paste/:id", get(view_paste).post(unlock_paste))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(app.config.limits.max_upload_size))
        .layer(TraceLayer::new_for_http())
        .with_state(app);

    NormalizePath::trim_trailing_slash(router)
}

#[derive(Deserialize)]
struct CreateForm {
    content: Option<String>,
    expiry: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
struct UnlockForm {
    password: Option<String>,
}

async fn index() -> Html<&'static str> {
    Html(pages::INDEX_PAGE)
}

async fn create_paste(
    State(mut app): State<App>,
    Form(form): Form<CreateForm>,
) -> crate::AppResult<Redirect> {
    let content = form.content.ok_or(AppError::MissingField("content"))?;
    let expiry = match form.expiry.as_deref() {
        None | Some("") => Expiry::default(),
        Some(expiry) => expiry.parse().map_err(|err| AppError::InvalidField {
            field: "expiry",
            reason: format!("{err}"),
        })?,
    };
    let password = form.password.and_then(Password::new);

    let paste = paste::create(&mut app, content, expiry, password).await?;

    Ok(Redirect::to(&format!("/paste/{}", paste.id)))
}

async fn view_paste(
    State(mut app): State<App>,
    Path(id): Path<String>,
) -> crate::AppResult<Response> {
    let paste = paste::open(&mut app, &id).await?;

    let page = if paste.is_protected() {
        pages::password_prompt(&id, false)
    } else {
        pages::paste(&app.config.base_url, &id, &paste.content)
    };

    Ok(Html(page).into_response())
}

async fn unlock_paste(
    State(mut app): State<App>,
    Path(id): Path<String>,
    Form(form): Form<UnlockForm>,
) -> crate::AppResult<Response> {
    let password = form.password.and_then(Password::new);

    let response = match paste::unlock(&mut app, &id, password).await? {
        Unlock::Opened(content) => {
            Html(pages::paste(&app.config.base_url, &id, &content)).into_response()
        }
        Unlock::Denied => (
            StatusCode::UNAUTHORIZED,
            Html(pages::password_prompt(&id, true)),
        )
            .into_response(),
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
    use axum::http::Method;
    use axum::response::Response;
    use chrono::Duration;
    use tower::ServiceExt as _;

    use super::*;
    use crate::store::PasteStore;

    async fn send(app: &App, method: Method, uri: &str, form: Option<&str>) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match form {
            Some(form) => {
                request = request
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .header(CONTENT_LENGTH, form.len());
                Body::from(form.to_owned())
            }
            None => Body::empty(),
        };

        service(app.clone())
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Submit a paste and return the path it redirects to.
    async fn submit(app: &App, form: &str) -> String {
        let response = send(app, Method::POST, "/", Some(form)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        response.headers()[LOCATION].to_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn index_serves_form() {
        let (app, _) = crate::test_app();
        let response = send(&app, Method::GET, "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("<form"));
    }

    #[tokio::test]
    async fn plain_paste_flow() {
        let (mut app, _) = crate::test_app();
        let location = submit(&app, "content=hello+world&expiry=never&password=").await;
        assert!(location.starts_with("/paste/"));

        let response = send(&app, Method::GET, &location, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("hello world"));
        assert!(body.contains(&format!("http://paste.test{location}")));

        let id = location.trim_start_matches("/paste/");
        let stored = app.store.get(id).await.unwrap();
        assert_eq!(stored.content, b"hello world");
        assert_eq!(stored.salt, None);
    }

    #[tokio::test]
    async fn protected_paste_flow() {
        let (app, _) = crate::test_app();
        let location =
            submit(&app, "content=hello+world&password=secret123&expiry=never").await;

        let response = send(&app, Method::GET, &location, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("password protected"));
        assert!(!body.contains("hello world"));

        let response = send(&app, Method::POST, &location, Some("password=wrong")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_text(response).await;
        assert!(body.contains("Incorrect password"));
        assert!(!body.contains("hello world"));

        let response = send(&app, Method::POST, &location, Some("password=")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, Method::POST, &location, Some("password=secret123")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("hello world"));
    }

    #[tokio::test]
    async fn malformed_colour_codes_are_shown() {
        let (app, _) = crate::test_app();
        let location = submit(&app, "content=%1B%5B999m&expiry=never").await;

        let response = send(&app, Method::GET, &location, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("[999m"));

        let location = submit(&app, "content=%1B%5B38%3B5m+hidden&password=pw").await;
        let response = send(&app, Method::POST, &location, Some("password=pw")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("[38;5m hidden"));
    }

    #[tokio::test]
    async fn expired_paste_is_not_found() {
        let (mut app, clock) = crate::test_app();
        let location = submit(&app, "content=short+lived&expiry=10min").await;

        let response = send(&app, Method::GET, &location, None).await;
        assert_eq!(response.status(), StatusCode::OK);

        clock.advance(Duration::minutes(10) + Duration::seconds(1));
        let response = send(&app, Method::GET, &location, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let id = location.trim_start_matches("/paste/");
        assert!(matches!(app.store.get(id).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn unknown_paste_is_not_found() {
        let (app, _) = crate::test_app();
        let response = send(&app, Method::GET, "/paste/nope", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, Method::POST, "/paste/nope", Some("password=x")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_content_is_rejected() {
        let (app, _) = crate::test_app();
        let response = send(&app, Method::POST, "/", Some("expiry=never")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("content"));
    }

    #[tokio::test]
    async fn unknown_expiry_is_rejected() {
        let (app, _) = crate::test_app();
        let response = send(&app, Method::POST, "/", Some("content=x&expiry=1week")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn trailing_slash_is_ignored() {
        let (app, _) = crate::test_app();
        let location = submit(&app, "content=slash").await;

        let response = send(&app, Method::GET, &format!("{location}/"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("slash"));
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let (app, _) = crate::test_app();
        let form = format!("content={}", "a".repeat(app.config.limits.max_upload_size));
        let response = send(&app, Method::POST, "/", Some(&form)).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
