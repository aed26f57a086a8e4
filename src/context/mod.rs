//! ハンドラーに渡されるリクエストコンテキスト
//!
//! データの出どころ（クエリ・ヘッダー・クッキー・パスパラメータ・ボディ）ごとに
//! 名前付きのアクセサを提供する。1リクエストにつき1つ生成され、
//! ハンドラーの終了とともに破棄される。

pub mod body;
pub mod params;

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use serde::de::DeserializeOwned;

use crate::common::{Locals, Method, Request};
use crate::error::Error;

pub use body::{FilePart, Form};
pub use params::PathParams;

/// リクエストコンテキスト
#[derive(Debug)]
pub struct RequestContext {
    request: Request,
    params: PathParams,
    /// フォーム解析結果（初回アクセス時に一度だけ解析）
    form: OnceLock<Result<Form, Error>>,
}

impl RequestContext {
    /// リクエストとバインド済みパスパラメータからコンテキストを作成
    pub fn new(request: Request, params: PathParams) -> Self {
        Self {
            request,
            params,
            form: OnceLock::new(),
        }
    }

    pub fn method(&self) -> Method {
        self.request.method
    }

    pub fn path(&self) -> &str {
        &self.request.path
    }

    /// クエリパラメータを取得
    pub fn query(&self, name: &str) -> Option<&str> {
        self.request.query_params.get(name).map(|v| v.as_str())
    }

    /// クエリパラメータを取得（存在しないか空ならデフォルト値）
    pub fn query_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.query(name).filter(|v| !v.is_empty()).unwrap_or(default)
    }

    pub fn queries(&self) -> &HashMap<String, String> {
        &self.request.query_params
    }

    /// ヘッダー値を取得（大文字小文字を区別しない）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    /// クッキー値を取得
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.request.cookies.get(name).map(|v| v.as_str())
    }

    /// パスパラメータを取得
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// 生のボディ（ボディなしは空スライス）
    pub fn body(&self) -> &[u8] {
        self.request.body.as_deref().unwrap_or(&[])
    }

    pub fn content_type(&self) -> Option<&str> {
        self.request.content_type()
    }

    /// ボディをJSONとしてデシリアライズ
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        self.request.json()
    }

    /// フォーム（urlencoded / multipart）を取得
    pub fn form(&self) -> Result<&Form, Error> {
        self.form
            .get_or_init(|| body::parse_form(self.content_type(), self.body()))
            .as_ref()
            .map_err(|e| e.clone())
    }

    /// フォームのテキストフィールドを取得
    pub fn form_value(&self, name: &str) -> Result<Option<&str>, Error> {
        Ok(self.form()?.value(name))
    }

    /// アップロードされたファイルを取得（存在しなければBadRequest）
    pub fn form_file(&self, name: &str) -> Result<&FilePart, Error> {
        self.form()?.file(name).ok_or_else(|| {
            Error::BadRequest(format!("No uploaded file for field '{}'", name))
        })
    }

    /// アップロードされたファイルを指定パスへ保存
    pub fn save_file(&self, part: &FilePart, dest: impl AsRef<Path>) -> Result<(), Error> {
        body::save_file_part(part, dest.as_ref())
    }

    /// ミドルウェアが設定した共有値
    pub fn locals(&self) -> &Locals {
        self.request.locals()
    }

    /// 元のリクエストへの参照
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn into_request(self) -> Request {
        self.request
    }
}
