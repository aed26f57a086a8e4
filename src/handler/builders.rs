use std::future::Future;

use futures::future::{self, Ready};
use log::warn;
use serde::de::DeserializeOwned;

use crate::common::Method;
use crate::context::body::is_json_like_content_type;
use crate::context::RequestContext;
use crate::error::Error;

use super::core::{AsyncRouteHandler, RouteHandler};
use super::response::ResponseWrapper;

// 可読性のための型エイリアス（JSONボディ必須の非同期ハンドラー）
pub type JsonOrError<Fut, R> = future::Either<Ready<Result<R, Error>>, Fut>;

/// JSONボディを取り出す（ボディなし・Content-Type不一致・不正なJSONはBadRequest）
fn decode_json_body<T: DeserializeOwned>(ctx: &RequestContext) -> Result<T, Error> {
    if ctx.body().is_empty() {
        return Err(Error::BadRequest("Missing request body".to_string()));
    }

    let ct = ctx.content_type().ok_or_else(|| {
        warn!("Request with body missing Content-Type header");
        Error::BadRequest("Missing Content-Type header".to_string())
    })?;

    if !is_json_like_content_type(ct) {
        warn!("Unsupported Content-Type for JSON parsing: {}", ct);
        return Err(Error::BadRequest(format!(
            "Unsupported Content-Type: {} (expected application/json or *+json)",
            ct
        )));
    }

    ctx.json()
}

// 同期: ボディをTとしてデコードしてから呼び出す薄いアダプタ
fn require_json_sync<F, T, R>(
    handler: F,
) -> impl Fn(RequestContext) -> Result<R, Error> + Send + Sync + 'static
where
    F: Fn(RequestContext, T) -> Result<R, Error> + Send + Sync + 'static,
    T: DeserializeOwned + 'static,
    R: ResponseWrapper + 'static,
{
    move |ctx| {
        let body = decode_json_body::<T>(&ctx)?;
        handler(ctx, body)
    }
}

// 非同期: デコードに失敗したら即時エラーfutureを返すアダプタ
fn require_json_async<F, T, R, Fut>(
    handler: F,
) -> impl Fn(RequestContext) -> JsonOrError<Fut, R> + Send + Sync + 'static
where
    F: Fn(RequestContext, T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + 'static,
    R: ResponseWrapper + Send + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
{
    move |ctx| match decode_json_body::<T>(&ctx) {
        Ok(body) => future::Either::Right(handler(ctx, body)),
        Err(e) => future::Either::Left(future::ready(Err(e))),
    }
}

macro_rules! method_builders {
    ($($method:ident => $sync_name:ident, $async_name:ident;)*) => {
        $(
            #[doc = concat!(stringify!($method), "ハンドラーを作成")]
            pub fn $sync_name<F, R>(pattern: &str, handler: F) -> Result<RouteHandler<F, R>, Error>
            where
                F: Fn(RequestContext) -> Result<R, Error> + Send + Sync + 'static,
                R: ResponseWrapper + 'static,
            {
                RouteHandler::try_new(Method::$method, pattern, handler)
            }

            #[doc = concat!("非同期", stringify!($method), "ハンドラーを作成")]
            pub fn $async_name<F, R, Fut>(
                pattern: &str,
                handler: F,
            ) -> Result<AsyncRouteHandler<F, R, Fut>, Error>
            where
                F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
                R: ResponseWrapper + 'static,
                Fut: Future<Output = Result<R, Error>> + Send + 'static,
            {
                AsyncRouteHandler::try_new(Method::$method, pattern, handler)
            }
        )*
    };
}

method_builders! {
    GET => get, async_get;
    POST => post, async_post;
    PUT => put, async_put;
    PATCH => patch, async_patch;
    DELETE => delete, async_delete;
    HEAD => head, async_head;
    OPTIONS => options, async_options;
}

/// JSONボディを型付きで受け取るPOSTハンドラーを作成
pub fn post_json<F, T, R>(
    pattern: &str,
    handler: F,
) -> Result<RouteHandler<impl Fn(RequestContext) -> Result<R, Error> + Send + Sync + 'static, R>, Error>
where
    F: Fn(RequestContext, T) -> Result<R, Error> + Send + Sync + 'static,
    T: DeserializeOwned + 'static,
    R: ResponseWrapper + 'static,
{
    RouteHandler::try_new(Method::POST, pattern, require_json_sync(handler))
}

/// JSONボディを型付きで受け取る非同期POSTハンドラーを作成
pub fn async_post_json<F, T, R, Fut>(
    pattern: &str,
    handler: F,
) -> Result<
    AsyncRouteHandler<
        impl Fn(RequestContext) -> JsonOrError<Fut, R> + Send + Sync + 'static,
        R,
        JsonOrError<Fut, R>,
    >,
    Error,
>
where
    F: Fn(RequestContext, T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + 'static,
    R: ResponseWrapper + Send + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
{
    AsyncRouteHandler::try_new(Method::POST, pattern, require_json_async(handler))
}
