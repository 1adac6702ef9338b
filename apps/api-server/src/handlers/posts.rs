//! Post CRUD handlers.

use std::future::Future;

use actix_web::{HttpResponse, web};
use chrono::SecondsFormat;

use quill_core::domain::{NewPost, Post, PostChanges};
use quill_core::error::{DomainError, RepoError};
use quill_shared::dto::{CreatePostRequest, PostResponse, UpdatePostRequest};
use quill_shared::{CountResponse, MessageResponse};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /post
pub async fn find_all(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = with_deadline(&state, state.posts.find_all()).await?;

    let body: Vec<PostResponse> = posts.into_iter().map(to_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /post/{id}
pub async fn find_by_id(
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let post = with_deadline(&state, state.posts.find_by_id(id))
        .await?
        .ok_or_else(|| post_not_found(id))?;

    Ok(HttpResponse::Ok().json(to_response(post)))
}

/// GET /post/count
pub async fn count(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let count = with_deadline(&state, state.posts.count()).await?;

    Ok(HttpResponse::Ok().json(CountResponse { count }))
}

/// POST /post
pub async fn create(
    state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let new_post = NewPost::new(req.title, req.content)?;

    let post = with_deadline(&state, state.posts.create(new_post)).await?;
    tracing::info!(post_id = post.id, "Post created");

    Ok(HttpResponse::Created()
        .json(MessageResponse::new("Post created").with_post(to_response(post))))
}

/// PUT /post
pub async fn update(
    state: web::Data<AppState>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let id = req.id;
    let changes = PostChanges::new(req.id, req.title, req.content)?;

    let post = with_deadline(&state, state.posts.update(changes))
        .await
        .map_err(name_missing_post(id))?;
    tracing::info!(post_id = id, "Post updated");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Post updated").with_post(to_response(post))))
}

/// DELETE /post/{id}
pub async fn delete(state: web::Data<AppState>, path: web::Path<i32>) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    with_deadline(&state, state.posts.delete(id))
        .await
        .map_err(name_missing_post(id))?;
    tracing::info!(post_id = id, "Post deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted")))
}

/// Run a repository call under the request deadline.
///
/// Dropping the handler future (client gone) drops the query with it; the
/// timeout covers clients that stay connected.
async fn with_deadline<T, F>(state: &AppState, call: F) -> AppResult<T>
where
    F: Future<Output = Result<T, RepoError>>,
{
    match tokio::time::timeout(state.request_timeout, call).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => {
            tracing::warn!(timeout = ?state.request_timeout, "Database call exceeded request deadline");
            Err(AppError::Unavailable("Request deadline exceeded".to_string()))
        }
    }
}

fn post_not_found(id: i32) -> AppError {
    DomainError::NotFound {
        entity_type: "Post",
        id,
    }
    .into()
}

/// Replace the generic repository not-found detail with the post id.
fn name_missing_post(id: i32) -> impl FnOnce(AppError) -> AppError {
    move |err| match err {
        AppError::NotFound(_) => post_not_found(id),
        other => other,
    }
}

fn to_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        title: post.title,
        content: post.content,
        created_at: post.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        updated_at: post.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::http::header::ContentType;
    use actix_web::middleware::NormalizePath;
    use actix_web::{App, test};
    use async_trait::async_trait;
    use quill_core::domain::{NewPost, Post, PostChanges};
    use quill_core::error::RepoError;
    use quill_core::ports::{BaseRepository, PostRepository};
    use quill_infra::database::DatabaseConfig;
    use serde_json::{Value, json};

    use crate::handlers::configure_routes;
    use crate::state::AppState;

    async fn test_state() -> AppState {
        let mut config = DatabaseConfig::new("sqlite::memory:");
        config.max_connections = 1;
        AppState::init(&config, Duration::from_secs(5)).await.unwrap()
    }

    macro_rules! test_app {
        () => {
            test_app!(test_state().await)
        };
        ($state:expr) => {
            test::init_service(
                App::new()
                    .wrap(NormalizePath::trim())
                    .app_data(actix_web::web::Data::new($state))
                    .configure(configure_routes),
            )
            .await
        };
    }

    /// Repository whose calls never complete.
    struct StalledPosts;

    async fn stall<T>() -> Result<T, RepoError> {
        std::future::pending().await
    }

    #[async_trait]
    impl BaseRepository<Post, i32> for StalledPosts {
        async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
            stall().await
        }

        async fn find_by_id(&self, _id: i32) -> Result<Option<Post>, RepoError> {
            stall().await
        }

        async fn delete(&self, _id: i32) -> Result<(), RepoError> {
            stall().await
        }

        async fn count(&self) -> Result<u64, RepoError> {
            stall().await
        }
    }

    #[async_trait]
    impl PostRepository for StalledPosts {
        async fn create(&self, _post: NewPost) -> Result<Post, RepoError> {
            stall().await
        }

        async fn update(&self, _changes: PostChanges) -> Result<Post, RepoError> {
            stall().await
        }
    }

    #[actix_web::test]
    async fn test_hello_and_ping() {
        let app = test_app!();

        let req = test::TestRequest::get().uri("/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "message": "hello world" }));

        let req = test::TestRequest::get().uri("/ping").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "message": "pong" }));
    }

    #[actix_web::test]
    async fn test_post_crud_flow() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/post")
            .set_json(json!({ "title": "Test Title", "content": "Test Content" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Post created");
        assert_eq!(body["post"]["id"], 1);
        assert_eq!(body["post"]["createdAt"], body["post"]["updatedAt"]);

        let req = test::TestRequest::get().uri("/post").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["title"], "Test Title");

        let req = test::TestRequest::get().uri("/post/1").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["content"], "Test Content");

        let req = test::TestRequest::get().uri("/post/count").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "count": 1 }));

        let req = test::TestRequest::put()
            .uri("/post")
            .set_json(json!({ "id": 1, "title": "Updated Title", "content": "Updated Content" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Post updated");
        assert_eq!(body["post"]["title"], "Updated Title");

        let req = test::TestRequest::delete().uri("/post/1").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "message": "Post deleted" }));

        let req = test::TestRequest::get().uri("/post/1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/post/count").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "count": 0 }));
    }

    #[actix_web::test]
    async fn test_trailing_slash_lists_posts() {
        let app = test_app!();

        let req = test::TestRequest::get().uri("/post/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!([]));
    }

    #[actix_web::test]
    async fn test_malformed_input_is_bad_request() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/post")
            .insert_header(ContentType::json())
            .set_payload("{\"title\": ")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], 400);

        let req = test::TestRequest::get().uri("/post/abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/post")
            .set_json(json!({ "title": "", "content": "no title" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_unknown_id_is_not_found() {
        let app = test_app!();

        let req = test::TestRequest::put()
            .uri("/post")
            .set_json(json!({ "id": 42, "title": "T", "content": "C" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "Post with id 42 not found");

        let req = test::TestRequest::delete().uri("/post/42").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_closed_pool_is_unavailable() {
        let state = test_state().await;
        state.db.close_by_ref().await.unwrap();
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/ping").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], 503);

        let req = test::TestRequest::get().uri("/post").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn test_expired_deadline_is_unavailable() {
        let mut state = test_state().await;
        state.posts = Arc::new(StalledPosts);
        state.request_timeout = Duration::from_millis(20);
        let app = test_app!(state);

        for uri in ["/post", "/post/1", "/post/count"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["detail"], "Request deadline exceeded");
        }

        let req = test::TestRequest::post()
            .uri("/post")
            .set_json(json!({ "title": "T", "content": "C" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
