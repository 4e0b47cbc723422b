//! Sanitised JSON request bodies.
//!
//! Object keys that start with `$` or contain `.` are dropped at every depth
//! and `<`/`>` in string values are HTML-escaped before a body reaches a
//! handler.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use serde_json::Value;

use crate::domain::{Document, Error};

fn is_operator_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

fn escape_markup(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

/// Strip operator keys and escape markup in `value`.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use tour_booking::inbound::http::body::sanitize;
///
/// let clean = sanitize(json!({"$gt": "", "name": "<b>Hi</b>", "a.b": 1}));
/// assert_eq!(clean, json!({"name": "&lt;b&gt;Hi&lt;/b&gt;"}));
/// ```
#[must_use]
pub fn sanitize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !is_operator_key(key))
                .map(|(key, value)| (key, sanitize(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize).collect()),
        Value::String(text) => Value::String(escape_markup(&text)),
        other => other,
    }
}

/// A sanitised JSON object body.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Document);

impl JsonBody {
    /// Unwrap the document.
    #[must_use]
    pub fn into_inner(self) -> Document {
        self.0
    }
}

impl FromRequest for JsonBody {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = web::Json::<Value>::from_request(req, payload);
        Box::pin(async move {
            let web::Json(value) = fut.await?;
            match sanitize(value) {
                Value::Object(document) => Ok(Self(document)),
                _ => Err(Error::invalid_request("Request body must be a JSON object").into()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn nested_operator_keys_are_removed() {
        let clean = sanitize(json!({
            "email": {"$gt": ""},
            "guides": [{"$where": "1"}, "<script>"],
        }));
        assert_eq!(
            clean,
            json!({"email": {}, "guides": [{}, "&lt;script&gt;"]})
        );
    }

    #[rstest]
    fn scalars_pass_through() {
        assert_eq!(sanitize(json!(4.5)), json!(4.5));
        assert_eq!(sanitize(json!(null)), json!(null));
    }

    #[actix_web::test]
    async fn extractor_rejects_non_object_bodies() {
        let app = actix_test::init_service(App::new().route(
            "/",
            web::post().to(|body: JsonBody| async move {
                HttpResponse::Ok().json(Value::Object(body.into_inner()))
            }),
        ))
        .await;

        let ok = actix_test::TestRequest::post()
            .uri("/")
            .set_json(json!({"name": "Tour", "$set": 1}))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, ok).await;
        assert_eq!(body, json!({"name": "Tour"}));

        let array = actix_test::TestRequest::post()
            .uri("/")
            .set_json(json!([1, 2]))
            .to_request();
        let res = actix_test::call_service(&app, array).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
