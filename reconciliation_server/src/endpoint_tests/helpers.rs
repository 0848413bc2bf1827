use actix_web::{http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;
use serde_json::Value;

pub async fn post_request(path: &str, body: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, Value) {
    let req = TestRequest::post().uri(path).insert_header(("content-type", "application/json")).set_payload(body.to_string());
    call(req, configure).await
}

pub async fn get_request(path: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, Value) {
    call(TestRequest::get().uri(path), configure).await
}

async fn call(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, Value) {
    let _ = env_logger::try_init();
    let service = test::init_service(App::new().configure(configure)).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let json = serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into()));
    (status, json)
}
