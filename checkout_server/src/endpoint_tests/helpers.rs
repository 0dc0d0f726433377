use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;

pub const USER_HEADER: &str = "x-user-id";

pub async fn get_request(
    user_id: Option<i64>,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = with_user(TestRequest::get().uri(path), user_id);
    send(req, configure).await
}

pub async fn post_request(
    user_id: Option<i64>,
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = with_user(TestRequest::post().uri(path), user_id).set_json(body);
    send(req, configure).await
}

fn with_user(req: TestRequest, user_id: Option<i64>) -> TestRequest {
    match user_id {
        Some(id) => req.insert_header((USER_HEADER, id.to_string())),
        None => req,
    }
}

async fn send(req: TestRequest, configure: fn(&mut ServiceConfig)) -> Result<(StatusCode, String), String> {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let bytes = res.into_body().try_into_bytes().map_err(|_| "Could not read response body".to_string())?;
    Ok((status, String::from_utf8_lossy(&bytes).into_owned()))
}
