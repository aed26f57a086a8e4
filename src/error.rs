//! エラー型の定義

use thiserror::Error;

/// アプリケーションのエラー型
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// マッチするルートが存在しない
    #[error("Route not found: {0}")]
    NotFound(String),

    /// 不正なリクエスト（フォーム・multipart・JSONボディの解析失敗など）
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// リクエストボディが上限サイズを超過
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// ハンドラー内部のエラー（ファイル保存の失敗など）
    #[error("Internal server error: {0}")]
    Internal(String),

    /// レスポンスのシリアライズエラー
    #[error("Failed to serialize response: {0}")]
    ResponseSerialization(String),

    /// ミドルウェアエラー
    #[error("Middleware error: {0}")]
    Middleware(String),

    /// 設定エラー（ルート定義の重複・不正なパターンなど）
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// エラーからHTTPステータスコードを取得
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            Error::BadRequest(_) => 400,
            Error::PayloadTooLarge(_) => 413,
            Error::Internal(_) => 500,
            Error::ResponseSerialization(_) => 500,
            Error::Middleware(_) => 500,
            Error::Configuration(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(Error::NotFound("GET /x".into()).status_code(), 404);
        assert_eq!(Error::BadRequest("bad json".into()).status_code(), 400);
        assert_eq!(Error::PayloadTooLarge("big".into()).status_code(), 413);
        assert_eq!(Error::Internal("disk full".into()).status_code(), 500);
        assert_eq!(Error::Configuration("dup".into()).status_code(), 500);
    }

    #[test]
    fn test_display_includes_detail() {
        let e = Error::NotFound("GET /missing".to_string());
        assert_eq!(e.to_string(), "Route not found: GET /missing");
    }
}
