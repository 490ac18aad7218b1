use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;
use http_body_util::BodyExt;

pub fn create_test_app() -> Router {
    solquest_backend::create_app()
}

pub fn request(method: &str, uri: &str, learner: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(learner) = learner {
        builder = builder.header("x-learner-id", learner);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
