use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use log::info;
use routebridge::{
    common::{Middleware, Request, Response},
    error::Error,
    handler, App, RequestContext,
};

// リクエストIDを採番してハンドラーとレスポンスに渡すミドルウェア
struct RequestIdMiddleware {
    next_id: AtomicU64,
}

#[async_trait]
impl Middleware for RequestIdMiddleware {
    async fn pre_process(&self, mut req: Request) -> Result<Request, Error> {
        let id = match req.header("x-request-id") {
            Some(id) => id.to_string(),
            None => format!("req-{}", self.next_id.fetch_add(1, Ordering::Relaxed)),
        };
        info!("{} {} assigned {}", req.method, req.path, id);
        req.locals_mut().set("request_id", id);
        Ok(req)
    }

    async fn post_process(&self, res: Response) -> Result<Response, Error> {
        Ok(res.with_header("X-Powered-By", "routebridge"))
    }
}

fn hello_handler(ctx: RequestContext) -> Result<String, Error> {
    let id = ctx
        .locals()
        .get::<String>("request_id")
        .cloned()
        .unwrap_or_default();
    Ok(format!("Hello {} ({})", ctx.query_or("name", "Guest"), id))
}

fn build_app() -> Result<App, Error> {
    App::builder()
        .middleware(RequestIdMiddleware {
            next_id: AtomicU64::new(1),
        })
        .handler(handler::get("/hello", hello_handler)?)
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();
    let app = build_app()?;

    #[cfg(feature = "server")]
    {
        routebridge::transport::run_server(app, "0.0.0.0", 8080).await?;
    }

    // サーバーなしの場合は生リクエストを流して結果を表示
    #[cfg(not(feature = "server"))]
    {
        let raw = b"GET /hello?name=Rangga HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let res = app.test_raw(raw).await;
        println!("{}", String::from_utf8_lossy(&res));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use routebridge::common::Method;

    #[tokio::test]
    async fn test_request_id_reaches_handler() {
        let app = build_app().unwrap();

        let res = app.handle(Request::new(Method::GET, "/hello")).await;
        assert_eq!(res.body_text(), "Hello Guest (req-1)");
        assert_eq!(res.header("x-powered-by"), Some("routebridge"));

        let req = Request::new(Method::GET, "/hello")
            .with_query_param("name", "Rangga")
            .with_header("X-Request-Id", "abc");
        let res = app.handle(req).await;
        assert_eq!(res.body_text(), "Hello Rangga (abc)");
    }
}
