//! RouteBridge: 名前付きセグメントのルーティングとリクエストコンテキストを備えた
//! 小さなHTTPリクエスト処理ライブラリ
//!
//! ルートテーブルは`AppBuilder::build`で確定し、以後は不変のまま
//! 複数のリクエストから共有される（`Arc<App>`）。

use std::time::Instant;

use log::{error, info, warn};

pub mod common;
pub mod context;
pub mod demo;
pub mod error;
pub mod handler;
pub mod transport;

pub use common::*;
pub use context::{FilePart, Form, PathParams, RequestContext};
pub use error::*;
pub use handler::{Json, ResponseWrapper, RoutePattern};

/// リクエストを処理するアプリケーションを構築するためのビルダー
#[derive(Default)]
pub struct AppBuilder {
    handlers: Vec<Box<dyn Handler>>,
    middlewares: Vec<Box<dyn Middleware>>,
}

impl AppBuilder {
    /// 新しいAppBuilderインスタンスを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ハンドラを追加（登録順に照合される）
    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: Handler + 'static,
    {
        self.handlers.push(Box::new(handler));
        self
    }

    /// ミドルウェアを追加
    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.middlewares.push(Box::new(middleware));
        self
    }

    /// アプリケーションをビルドして返却
    ///
    /// 同じメソッドで同じ形のパターンが二重に登録されている場合はConfigurationエラー。
    pub fn build(self) -> Result<App, Error> {
        for (i, later) in self.handlers.iter().enumerate() {
            let duplicate = self.handlers[..i].iter().find(|earlier| {
                earlier.method() == later.method() && earlier.pattern().same_shape(later.pattern())
            });
            if let Some(earlier) = duplicate {
                error!(
                    "Duplicate route: {} {} conflicts with {}",
                    later.method(),
                    later.pattern(),
                    earlier.pattern()
                );
                return Err(Error::Configuration(format!(
                    "Duplicate route {} {} (already registered as {})",
                    later.method(),
                    later.pattern(),
                    earlier.pattern()
                )));
            }
        }

        info!(
            "Built app with {} routes and {} middlewares",
            self.handlers.len(),
            self.middlewares.len()
        );
        Ok(App {
            handlers: self.handlers,
            middlewares: self.middlewares,
        })
    }
}

/// リクエストを処理するアプリケーション
pub struct App {
    handlers: Vec<Box<dyn Handler>>,
    middlewares: Vec<Box<dyn Middleware>>,
}

impl App {
    /// 新しいAppBuilderインスタンスを作成
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// メソッドとパスにマッチする最初のハンドラとバインドされたパラメータを取得
    pub fn find_route(&self, method: &Method, path: &str) -> Option<(&dyn Handler, PathParams)> {
        self.handlers
            .iter()
            .find_map(|handler| handler.matches(method, path).map(|params| (&**handler, params)))
    }

    /// 登録済みルートの一覧（登録順）
    pub fn routes(&self) -> impl Iterator<Item = (Method, &str)> {
        self.handlers.iter().map(|h| (h.method(), h.pattern().as_str()))
    }

    /// ミドルウェアのリストを取得
    pub fn middlewares(&self) -> &[Box<dyn Middleware>] {
        &self.middlewares
    }

    /// リクエストをルーティングしてハンドラを実行する
    ///
    /// ハンドラやミドルウェアのエラーはエラーレスポンスに変換される。
    /// マッチするルートがない場合のみ`Error::NotFound`を返す。
    pub async fn dispatch(&self, request: Request) -> Result<Response, Error> {
        let started = Instant::now();
        let method = request.method;
        let path = request.path.clone();

        let Some((handler, params)) = self.find_route(&method, &path) else {
            warn!("Route not found: {} {}", method, path);
            return Err(Error::NotFound(format!("{} {}", method, path)));
        };

        let response = self.run_pipeline(handler, request, params).await;

        info!(
            "{} {} -> {} ({:?})",
            method,
            path,
            response.status,
            started.elapsed()
        );
        Ok(response)
    }

    /// ミドルウェア（前処理）→ハンドラ→ミドルウェア（後処理）
    async fn run_pipeline(&self, handler: &dyn Handler, request: Request, params: PathParams) -> Response {
        let mut req_processed = request;
        for middleware in &self.middlewares {
            match middleware.pre_process(req_processed).await {
                Ok(processed) => req_processed = processed,
                Err(e) => {
                    error!("Middleware error: {}", e);
                    return Response::from_error(&e);
                }
            }
        }

        let ctx = RequestContext::new(req_processed, params);
        let response = match handler.handle(ctx).await {
            Ok(res) => res,
            Err(e) => {
                error!("Handler error: {}", e);
                Response::from_error(&e)
            }
        };

        let mut res_processed = response;
        for middleware in &self.middlewares {
            match middleware.post_process(res_processed).await {
                Ok(processed) => res_processed = processed,
                Err(e) => {
                    error!("Middleware error in post-processing: {}", e);
                    res_processed = Response::from_error(&e);
                }
            }
        }
        res_processed
    }

    /// トランスポート層向け: 常にレスポンスを返す（ルートなしは404）
    pub async fn handle(&self, request: Request) -> Response {
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => Response::from_error(&e),
        }
    }

    /// 生のHTTP/1.1リクエストバイト列を処理し、生のレスポンスバイト列を返す
    ///
    /// 不正なリクエストは400（ボディ上限超過は413）のレスポンスになる。
    pub async fn test_raw(&self, raw: &[u8]) -> Vec<u8> {
        let response = match transport::wire::parse_request(raw, get_max_body_size()) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!("Failed to parse raw request: {}", e);
                Response::from_error(&e)
            }
        };
        transport::wire::encode_response(response)
    }
}
