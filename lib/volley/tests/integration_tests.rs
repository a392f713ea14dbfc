//! Integration tests for request building and sending, using wiremock.

use std::io::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use volley::{Data, Error, FileField, Method, Phase, Session};
use wiremock::{
    Mock, MockServer, Request, Respond, ResponseTemplate,
    matchers::{basic_auth, bearer_token, body_string, header, method, path, query_param},
};

/// Responds with the request body and content type.
struct EchoBody;

impl Respond for EchoBody {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let content_type = request
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        ResponseTemplate::new(200)
            .insert_header("content-type", content_type.as_str())
            .set_body_bytes(request.body.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Message {
    msg: String,
    num: u32,
}

#[tokio::test]
async fn test_get_with_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/get"))
        .and(query_param("key1", "value1"))
        .and(query_param("key2", "value2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut response = volley::get(format!("{}/get", mock_server.uri()))
        .expect("url")
        .params([("key1", "value1")])
        .params([("key2", "value2")])
        .send()
        .await
        .expect("response");

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.expect("text"), "ok");
}

#[tokio::test]
async fn test_headers_last_write_wins() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/headers"))
        .and(header("origin", "https://example.org"))
        .and(header("x-mode", "second"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = volley::get(format!("{}/headers", mock_server.uri()))
        .expect("url")
        .headers([("Origin", "https://example.org"), ("X-Mode", "first")])
        .expect("headers")
        .header("x-mode", "second")
        .expect("header")
        .send()
        .await
        .expect("response");

    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn test_invalid_header_is_rejected_before_sending() {
    let err = volley::get("http://127.0.0.1:1/")
        .expect("url")
        .header("bad header", "value")
        .expect_err("invalid header name");

    assert!(matches!(err, Error::InvalidHeader(_)));
    assert_eq!(err.phase(), Phase::Build);
}

#[tokio::test]
async fn test_invalid_url_is_rejected_immediately() {
    let err = volley::get("::not a url::").expect_err("invalid url");
    assert!(matches!(err, Error::InvalidUrl(_)));
}

#[tokio::test]
async fn test_request_cookies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cookies"))
        .and(header("cookie", "n1=v1; n2=v2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = volley::get(format!("{}/cookies", mock_server.uri()))
        .expect("url")
        .cookies([("n1", "v1"), ("n2", "v2")])
        .send()
        .await
        .expect("response");

    assert!(response.is_success());
}

#[tokio::test]
async fn test_form_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/post"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("k1=v1&k2=v+2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = volley::post(format!("{}/post", mock_server.uri()))
        .expect("url")
        .form([("k1", "v1")])
        .form([("k2", "v 2")])
        .send()
        .await
        .expect("response");

    assert!(response.is_success());
}

#[tokio::test]
async fn test_json_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("content-type", "application/json"))
        .respond_with(EchoBody)
        .mount(&mock_server)
        .await;

    let mut response = volley::post(format!("{}/echo", mock_server.uri()))
        .expect("url")
        .json(Data::from([
            ("msg", serde_json::json!("hello world")),
            ("num", serde_json::json!(2019)),
        ]))
        .send()
        .await
        .expect("response");

    let echoed: Message = response.json().await.expect("json");
    assert_eq!(
        echoed,
        Message {
            msg: "hello world".to_string(),
            num: 2019,
        }
    );
}

#[tokio::test]
async fn test_json_value_from_struct() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/echo"))
        .respond_with(EchoBody)
        .mount(&mock_server)
        .await;

    let input = Message {
        msg: "typed".to_string(),
        num: 7,
    };
    let mut response = volley::put(format!("{}/echo", mock_server.uri()))
        .expect("url")
        .json_value(&input)
        .expect("serializable")
        .send()
        .await
        .expect("response");

    assert_eq!(response.json::<Message>().await.expect("json"), input);
}

#[tokio::test]
async fn test_multipart_upload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(EchoBody)
        .mount(&mock_server)
        .await;

    let mut first = tempfile::NamedTempFile::new().expect("temp file");
    first.write_all(b"first image bytes").expect("write");
    let mut second = tempfile::NamedTempFile::new().expect("temp file");
    second.write_all(b"second image bytes").expect("write");

    let mut response = volley::post(format!("{}/upload", mock_server.uri()))
        .expect("url")
        .form([("album", "holiday")])
        .files([
            FileField::new("testimage1", "testimage1.jpg", first.path()),
            FileField::new("testimage2", "testimage2.jpg", second.path()),
        ])
        .send()
        .await
        .expect("response");

    let content_type = response.header("content-type").expect("content type").to_string();
    let boundary = content_type
        .strip_prefix("multipart/form-data; boundary=")
        .expect("multipart content type")
        .to_string();

    let body = response.text().await.expect("text");
    assert!(body.starts_with(&format!("--{boundary}\r\n")));
    assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    assert!(body.contains("name=\"album\"\r\n\r\nholiday\r\n"));
    assert!(body.contains(
        "name=\"testimage1\"; filename=\"testimage1.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nfirst image bytes\r\n"
    ));
    assert!(body.contains(
        "name=\"testimage2\"; filename=\"testimage2.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nsecond image bytes\r\n"
    ));
}

#[tokio::test]
async fn test_missing_attachment_fails_at_send() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let builder = volley::post(format!("{}/upload", mock_server.uri()))
        .expect("url")
        .files([FileField::new("f", "missing.jpg", "./does/not/exist.jpg")]);

    let err = builder.send().await.expect_err("missing file");
    assert!(matches!(err, Error::File { ref path, .. } if path.ends_with("exist.jpg")));
    assert!(err.is_build());
}

#[tokio::test]
async fn test_basic_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/basic-auth/admin/pass"))
        .and(basic_auth("admin", "pass"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/basic-auth/admin/pass"))
        .respond_with(ResponseTemplate::new(401))
        .with_priority(10)
        .mount(&mock_server)
        .await;

    let url = format!("{}/basic-auth/admin/pass", mock_server.uri());

    let ok = volley::post(&url)
        .expect("url")
        .basic_auth("admin", "pass")
        .send()
        .await
        .expect("response");
    assert_eq!(ok.status(), 200);

    let denied = volley::post(&url)
        .expect("url")
        .basic_auth("admin", "wrong")
        .send()
        .await
        .expect("non-2xx is not an error");
    assert_eq!(denied.status(), 401);
    assert!(denied.is_client_error());
}

#[tokio::test]
async fn test_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bearer"))
        .and(bearer_token("secret-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = volley::get(format!("{}/bearer", mock_server.uri()))
        .expect("url")
        .header("Authorization", "Token overridden")
        .expect("header")
        .bearer_token("secret-token")
        .send()
        .await
        .expect("response");

    assert!(response.is_success());
}

#[tokio::test]
async fn test_every_verb() {
    let mock_server = MockServer::start().await;

    for verb in ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"] {
        Mock::given(method(verb))
            .and(path("/any"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let url = format!("{}/any", mock_server.uri());
    let session = Session::new();
    let builders = [
        session.get(&url),
        session.post(&url),
        session.put(&url),
        session.delete(&url),
        session.patch(&url),
        session.head(&url),
        session.request(Method::Options, &url),
    ];

    for builder in builders {
        let response = builder.expect("url").send().await.expect("response");
        assert_eq!(response.status(), 200);
    }
}

#[tokio::test]
async fn test_body_can_only_be_decoded_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/once"))
        .respond_with(ResponseTemplate::new(200).set_body_string("payload"))
        .mount(&mock_server)
        .await;

    let mut response = volley::get(format!("{}/once", mock_server.uri()))
        .expect("url")
        .send()
        .await
        .expect("response");

    assert_eq!(response.text().await.expect("text"), "payload");
    assert!(response.is_consumed());

    let err = response.bytes().await.expect_err("second decode");
    assert!(matches!(err, Error::BodyConsumed));
    assert_eq!(err.phase(), Phase::Decode);
}

#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/delay"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let session = volley::with_timeout(Duration::from_millis(100));
    let err = session
        .get(format!("{}/delay", mock_server.uri()))
        .expect("url")
        .send()
        .await
        .expect_err("should time out");

    assert!(err.is_timeout());
    assert_eq!(err.phase(), Phase::Send);
}

#[tokio::test]
async fn test_connection_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };

    let err = volley::get(format!("http://127.0.0.1:{port}/"))
        .expect("url")
        .send()
        .await
        .expect_err("nothing listening");

    assert!(err.is_connection(), "unexpected error: {err}");
}
