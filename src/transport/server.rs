//! actix-webによるHTTPサーバー

use std::sync::Arc;

use actix_web::http::header::HeaderMap;
use actix_web::http::StatusCode as ActixStatusCode;
use actix_web::web::{self, Bytes};
use actix_web::{App as ActixApp, HttpRequest, HttpResponse, HttpServer};
use log::{info, warn};

use crate::common::{get_max_body_size, parse_query_string, Method, Request, Response};
use crate::error::Error;
use crate::App;

/// actix-webのリクエストから共通形式のRequestに変換
fn convert_request(req: &HttpRequest, body: Bytes) -> Result<Request, Error> {
    let method = Method::from_str(req.method().as_str())
        .ok_or_else(|| Error::BadRequest(format!("Unsupported method: {}", req.method())))?;

    let mut request = Request::new(method, req.path());
    request.query_params = parse_query_string(req.query_string());
    copy_headers(req.headers(), &mut request);

    if !body.is_empty() {
        request.body = Some(body.to_vec());
    }
    Ok(request)
}

/// ヘッダーを取り込む（Cookieヘッダーはクッキーとしても解析される）
fn copy_headers(headers: &HeaderMap, request: &mut Request) {
    for (key, value) in headers.iter() {
        if let Ok(value_str) = value.to_str() {
            request.insert_header(key.as_str(), value_str);
        }
    }
}

/// 共通形式のResponseからactix-webのHttpResponseに変換
fn convert_to_http_response(response: Response) -> HttpResponse {
    let status =
        ActixStatusCode::from_u16(response.status).unwrap_or(ActixStatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = HttpResponse::build(status);

    for (key, value) in response.headers {
        builder.insert_header((key, value));
    }
    for cookie in &response.cookies {
        builder.append_header(("Set-Cookie", cookie.to_header_value()));
    }

    match response.body {
        Some(body) => builder.body(body),
        None => builder.finish(),
    }
}

/// すべてのメソッド・パスを受け付けてAppへ渡すactix-web用ハンドラー
async fn handle_request(req: HttpRequest, body: Bytes, app: web::Data<Arc<App>>) -> HttpResponse {
    let max = get_max_body_size();
    if body.len() > max {
        warn!("Request body too large: {} bytes (limit {})", body.len(), max);
        return convert_to_http_response(Response::from_error(&Error::PayloadTooLarge(format!(
            "{} bytes",
            body.len()
        ))));
    }

    let response = match convert_request(&req, body) {
        Ok(request) => app.handle(request).await,
        Err(e) => {
            warn!("Rejected request: {}", e);
            Response::from_error(&e)
        }
    };
    convert_to_http_response(response)
}

/// アプリケーションをHTTPサーバーとして実行
pub async fn run_server(app: App, host: &str, port: u16) -> std::io::Result<()> {
    info!("Starting HTTP server on {}:{}", host, port);

    let app_data = Arc::new(app);
    let max_body = get_max_body_size();

    HttpServer::new(move || {
        ActixApp::new()
            .app_data(web::Data::new(app_data.clone()))
            // リクエストボディサイズの上限（共通設定）
            .app_data(web::PayloadConfig::new(max_body))
            .default_service(web::to(handle_request))
    })
    .bind((host, port))?
    .run()
    .await
}
