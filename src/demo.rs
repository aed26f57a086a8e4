//! サンプルのルートテーブル（`bootstrap`バイナリと結合テストで使用）

use std::path::PathBuf;

use log::info;
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::error::Error;
use crate::handler;
use crate::App;

/// POST /login のリクエストボディ（欠けたフィールドは空文字列）
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn hello_world(_ctx: RequestContext) -> Result<&'static str, Error> {
    Ok("Hello World")
}

fn hello_query(ctx: RequestContext) -> Result<String, Error> {
    Ok(format!("Hello {}", ctx.query_or("name", "Guest")))
}

fn hello_request(ctx: RequestContext) -> Result<String, Error> {
    let first = ctx.header("firstname").unwrap_or_default();
    let last = ctx.cookie("lastname").unwrap_or_default();
    Ok(format!("Hello {} {}", first, last))
}

fn user_order(ctx: RequestContext) -> Result<String, Error> {
    let user_id = ctx.param("userId").unwrap_or_default();
    let order_id = ctx.param("orderId").unwrap_or_default();
    Ok(format!("Get Order {} From User {}", order_id, user_id))
}

fn hello_form(ctx: RequestContext) -> Result<String, Error> {
    let name = ctx.form_value("name")?.unwrap_or_default();
    Ok(format!("Hello {}", name))
}

fn login(ctx: RequestContext) -> Result<String, Error> {
    let request: LoginRequest = ctx.json()?;
    Ok(format!("Hello {}", request.username))
}

/// サンプルアプリケーションを構築（アップロードは`upload_dir`に保存される）
pub fn build_app(upload_dir: impl Into<PathBuf>) -> Result<App, Error> {
    let upload_dir = upload_dir.into();
    info!("Uploads will be stored in {}", upload_dir.display());

    let upload = move |ctx: RequestContext| -> Result<&'static str, Error> {
        let file = ctx.form_file("file")?;
        let file_name = file.sanitized_file_name().ok_or_else(|| {
            Error::BadRequest(format!("Invalid upload file name: {:?}", file.file_name))
        })?;
        ctx.save_file(file, upload_dir.join(file_name))?;
        Ok("Upload Success")
    };

    App::builder()
        .handler(handler::get("/", hello_world)?)
        .handler(handler::get("/hello", hello_query)?)
        .handler(handler::get("/request", hello_request)?)
        .handler(handler::get("/users/:userId/orders/:orderId", user_order)?)
        .handler(handler::post("/hello", hello_form)?)
        .handler(handler::post("/upload", upload)?)
        .handler(handler::post("/login", login)?)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_route_table() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(dir.path()).unwrap();

        let routes: Vec<_> = app.routes().map(|(m, p)| format!("{} {}", m, p)).collect();
        assert_eq!(
            routes,
            vec![
                "GET /",
                "GET /hello",
                "GET /request",
                "GET /users/:userId/orders/:orderId",
                "POST /hello",
                "POST /upload",
                "POST /login",
            ]
        );
    }
}
