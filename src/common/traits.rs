//! コアトレイト定義（Handler、Middleware）

use async_trait::async_trait;
use crate::context::{PathParams, RequestContext};
use crate::error::Error;
use crate::handler::RoutePattern;
use super::http::{Request, Response, Method};

/// ハンドラーの特性
#[async_trait]
pub trait Handler: Send + Sync {
    /// ハンドラーが受け付けるHTTPメソッド
    fn method(&self) -> Method;

    /// ハンドラーに関連付けられたルートパターン
    fn pattern(&self) -> &RoutePattern;

    /// メソッドとパスがマッチすればバインドされたパスパラメータを返す
    fn matches(&self, method: &Method, path: &str) -> Option<PathParams> {
        if *method != self.method() {
            return None;
        }
        self.pattern().match_path(path)
    }

    /// リクエストを処理
    async fn handle(&self, ctx: RequestContext) -> Result<Response, Error>;
}

/// ミドルウェアの特性
#[async_trait]
pub trait Middleware: Send + Sync {
    /// リクエスト前の処理
    async fn pre_process(&self, req: Request) -> Result<Request, Error>;

    /// レスポンス後の処理
    async fn post_process(&self, res: Response) -> Result<Response, Error>;
}
