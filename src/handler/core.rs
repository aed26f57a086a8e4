use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use log::{log, Level};

use crate::common::{Handler, Method, Response};
use crate::context::RequestContext;
use crate::error::Error;

use super::pattern::RoutePattern;
use super::response::ResponseWrapper;

/// 登録ログ（開発時はinfo、本番相当ではdebugに落とす）
fn log_registration(kind: &str, method: Method, pattern: &RoutePattern) {
    let level = if cfg!(debug_assertions) { Level::Info } else { Level::Debug };
    log!(level, "Registering {} for {} with pattern: {}", kind, method, pattern);
}

/// ルートハンドラー
pub struct RouteHandler<F, R>
where
    F: Fn(RequestContext) -> Result<R, Error> + Send + Sync + 'static,
    R: ResponseWrapper + 'static,
{
    /// ルートパターン
    pub pattern: RoutePattern,
    /// HTTPメソッド
    pub method: Method,
    /// ハンドラー関数
    pub handler_fn: F,
    /// レスポンスの型
    pub _response_type: PhantomData<fn() -> R>,
}

impl<F, R> RouteHandler<F, R>
where
    F: Fn(RequestContext) -> Result<R, Error> + Send + Sync + 'static,
    R: ResponseWrapper + 'static,
{
    /// 新しいRouteHandlerを作成（パターンが不正ならConfigurationエラー）
    pub fn try_new(method: Method, pattern: &str, handler_fn: F) -> Result<Self, Error> {
        let pattern = RoutePattern::parse(pattern)?;
        log_registration("handler", method, &pattern);
        Ok(Self {
            pattern,
            method,
            handler_fn,
            _response_type: PhantomData,
        })
    }
}

/// 非同期ルートハンドラー
pub struct AsyncRouteHandler<F, R, Fut>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    R: ResponseWrapper + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
{
    /// ルートパターン
    pub pattern: RoutePattern,
    /// HTTPメソッド
    pub method: Method,
    /// 非同期ハンドラー関数
    pub handler_fn: F,
    pub _future_type: PhantomData<fn() -> Fut>,
}

impl<F, R, Fut> AsyncRouteHandler<F, R, Fut>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    R: ResponseWrapper + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
{
    /// 新しいAsyncRouteHandlerを作成
    pub fn try_new(method: Method, pattern: &str, handler_fn: F) -> Result<Self, Error> {
        let pattern = RoutePattern::parse(pattern)?;
        log_registration("async handler", method, &pattern);
        Ok(Self {
            pattern,
            method,
            handler_fn,
            _future_type: PhantomData,
        })
    }
}

#[async_trait]
impl<F, R> Handler for RouteHandler<F, R>
where
    F: Fn(RequestContext) -> Result<R, Error> + Send + Sync + 'static,
    R: ResponseWrapper + 'static,
{
    fn method(&self) -> Method {
        self.method
    }

    fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    async fn handle(&self, ctx: RequestContext) -> Result<Response, Error> {
        let result = (self.handler_fn)(ctx)?;
        result.into_response()
    }
}

#[async_trait]
impl<F, R, Fut> Handler for AsyncRouteHandler<F, R, Fut>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    R: ResponseWrapper + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
{
    fn method(&self) -> Method {
        self.method
    }

    fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    async fn handle(&self, ctx: RequestContext) -> Result<Response, Error> {
        let result = (self.handler_fn)(ctx).await?;
        result.into_response()
    }
}
