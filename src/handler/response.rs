use serde::Serialize;

use crate::common::Response;
use crate::error::Error;

/// レスポンス変換トレイト
pub trait ResponseWrapper {
    /// 自身をResponseに変換
    fn into_response(self) -> Result<Response, Error>;
}

/// Response型に対するResponseWrapper実装（恒等関数）
impl ResponseWrapper for Response {
    fn into_response(self) -> Result<Response, Error> {
        Ok(self)
    }
}

/// 文字列は200 OKのテキストレスポンスになる
impl ResponseWrapper for String {
    fn into_response(self) -> Result<Response, Error> {
        Ok(Response::ok().text(self))
    }
}

impl ResponseWrapper for &'static str {
    fn into_response(self) -> Result<Response, Error> {
        Ok(Response::ok().text(self))
    }
}

/// シリアライズ可能な値を200 OKのJSONレスポンスにするラッパー
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize> ResponseWrapper for Json<T> {
    fn into_response(self) -> Result<Response, Error> {
        Response::ok().json(&self.0)
    }
}
