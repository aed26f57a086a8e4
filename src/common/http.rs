//! HTTP関連の基本型とユーティリティ

use std::collections::HashMap;
use std::fmt;
use log::warn;
use serde::{Serialize, de::DeserializeOwned};
use crate::error::Error;
use super::cookie::{parse_cookie_header, Cookie};
use super::locals::Locals;
use super::utils::is_header_value_valid;

/// HTTPステータスコード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    // 2xx Success
    Ok = 200,
    Created = 201,
    NoContent = 204,

    // 4xx Client Error
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    PayloadTooLarge = 413,
    UnprocessableEntity = 422,

    // 5xx Server Error
    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// u16の値を取得
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// 理由句を取得
    pub fn reason_phrase(&self) -> &'static str {
        reason_phrase_for(self.as_u16())
    }

    /// 成功ステータスかどうか判定
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    /// クライアントエラーかどうか判定
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    /// サーバーエラーかどうか判定
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl From<StatusCode> for u16 {
    fn from(status: StatusCode) -> u16 {
        status.as_u16()
    }
}

/// 数値のステータスコードに対応する理由句
pub fn reason_phrase_for(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// HTTPメソッド
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
}

impl Method {
    /// ルーティングで扱うすべてのメソッド
    pub const ALL: [Method; 7] = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::HEAD,
        Method::OPTIONS,
    ];

    /// リクエスト行に書かれる名前
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
        }
    }

    /// 文字列からMethodに変換（大文字小文字は区別しない）
    pub fn from_str(method: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(method))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTPリクエスト（トランスポート層から受け取る生データ）
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTPメソッド
    pub method: Method,
    /// リクエストパス（クエリ文字列を含まない）
    pub path: String,
    /// クエリパラメータ（重複キーは後勝ち）
    pub query_params: HashMap<String, String>,
    /// HTTPヘッダー（キーは小文字で保持）
    pub headers: HashMap<String, String>,
    /// クッキー
    pub cookies: HashMap<String, String>,
    /// リクエストボディ
    pub body: Option<Vec<u8>>,
    /// ミドルウェアからハンドラーへ渡す値
    locals: Locals,
}

impl Request {
    /// 新しいリクエストを作成
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query_params: HashMap::new(),
            headers: HashMap::new(),
            cookies: HashMap::new(),
            body: None,
            locals: Locals::new(),
        }
    }

    /// クエリパラメータを追加
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// ヘッダーを追加（キーは小文字化、CRLFを含む値は拒否）
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_header(key, value);
        self
    }

    /// ヘッダーを追加する（`Cookie` ヘッダーはクッキーとしても取り込む）
    pub fn insert_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into().to_ascii_lowercase();
        let value = value.into();
        if !is_header_value_valid(&value) {
            warn!("Rejected request header with invalid value: {}", key);
            return;
        }
        if key == "cookie" {
            self.cookies.extend(parse_cookie_header(&value));
        }
        self.headers.insert(key, value);
    }

    /// クッキーを追加
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// ボディを追加
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// ヘッダー値を取得（大文字小文字を区別しない）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Content-Typeヘッダーを取得
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// ボディをJSONとしてパース
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if let Some(body) = &self.body {
            serde_json::from_slice(body)
                .map_err(|e| Error::BadRequest(format!("Invalid JSON body: {}", e)))
        } else {
            Err(Error::BadRequest("No request body".to_string()))
        }
    }

    /// 共有値の不変参照を取得
    pub fn locals(&self) -> &Locals {
        &self.locals
    }

    /// 共有値の可変参照を取得
    pub fn locals_mut(&mut self) -> &mut Locals {
        &mut self.locals
    }

    /// 共有値をまとめて設定
    pub fn with_locals(mut self, locals: Locals) -> Self {
        self.locals = locals;
        self
    }
}

/// HTTPレスポンス
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTPステータスコード
    pub status: u16,
    /// HTTPヘッダー
    pub headers: HashMap<String, String>,
    /// Set-Cookieで送出するクッキー
    pub cookies: Vec<Cookie>,
    /// レスポンスボディ
    pub body: Option<Vec<u8>>,
}

impl Response {
    /// 新しいレスポンスを作成
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            cookies: Vec::new(),
            body: None,
        }
    }

    /// StatusCodeから新しいレスポンスを作成
    pub fn with_status(status: StatusCode) -> Self {
        Self::new(status.as_u16())
    }

    /// 同名（大文字小文字を区別しない）のヘッダーを置き換える
    fn set_header(&mut self, key: String, value: String) {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&key));
        self.headers.insert(key, value);
    }

    /// ヘッダーを追加（CRLFを含む値は拒否）
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if is_header_value_valid(&value) {
            self.set_header(key, value);
        } else {
            warn!("Rejected response header with invalid value: {}", key);
        }
        self
    }

    /// Set-Cookieするクッキーを追加
    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// ボディを追加
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// テキストをボディとして設定
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.set_header("Content-Type".to_string(), "text/plain; charset=utf-8".to_string());
        self.body = Some(text.into().into_bytes());
        self
    }

    /// JSONをボディとして設定
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(value)
            .map_err(|e| Error::ResponseSerialization(e.to_string()))?;

        self.set_header("Content-Type".to_string(), "application/json".to_string());
        self.body = Some(json);
        Ok(self)
    }

    /// ヘッダー値を取得（大文字小文字を区別しない）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// ボディをUTF-8文字列として取得（ボディなしは空文字列）
    pub fn body_text(&self) -> String {
        self.body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    /// 200 OKレスポンスを作成
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// 201 Createdレスポンスを作成
    pub fn created() -> Self {
        Self::new(201)
    }

    /// 204 No Contentレスポンスを作成
    pub fn no_content() -> Self {
        Self::new(204)
    }

    /// 400 Bad Requestレスポンスを作成
    pub fn bad_request() -> Self {
        Self::new(400)
    }

    /// 404 Not Foundレスポンスを作成
    pub fn not_found() -> Self {
        Self::new(404)
    }

    /// 500 Internal Server Errorレスポンスを作成
    pub fn internal_server_error() -> Self {
        Self::new(500)
    }

    /// Error型から固定メッセージのレスポンスを生成（内部の詳細は含めない）
    pub fn from_error(error: &Error) -> Self {
        let status = error.status_code();
        let message = match status {
            500..=599 => "Internal Server Error",
            _ => reason_phrase_for(status),
        };
        Response::new(status).text(message)
    }
}
