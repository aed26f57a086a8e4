//! HTTPクッキー関連の実装

use std::collections::HashMap;
use std::time::Duration;
use ::cookie::time::{Duration as TimeDuration, OffsetDateTime};
use chrono::{DateTime, Utc};
use log::warn;
use crate::error::Error;
use super::utils::{validate_cookie_name_value, is_header_value_valid};

/// Cookieリクエストヘッダーを解析する（RFC 6265、`cookie` クレートを使用）
///
/// 解析できないペアは読み飛ばし、同名のクッキーは後勝ち。
pub fn parse_cookie_header(cookie_header: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();

    for cookie in ::cookie::Cookie::split_parse(cookie_header).flatten() {
        map.insert(cookie.name().to_string(), cookie.value().to_string());
    }

    map
}

/// SameSite属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl From<SameSite> for ::cookie::SameSite {
    fn from(same_site: SameSite) -> Self {
        match same_site {
            SameSite::Strict => ::cookie::SameSite::Strict,
            SameSite::Lax => ::cookie::SameSite::Lax,
            SameSite::None => ::cookie::SameSite::None,
        }
    }
}

/// レスポンスで送出するHTTPクッキー（`Set-Cookie`一行分）
#[derive(Debug, Clone, Default)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub max_age: Option<Duration>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Cookie {
    /// 名前と値を検証してクッキーを作成
    pub fn try_new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        let value = value.into();
        validate_cookie_name_value(&name, &value)?;
        Ok(Self {
            name,
            value,
            ..Self::default()
        })
    }

    pub fn with_path(self, path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..self
        }
    }

    pub fn with_domain(self, domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            ..self
        }
    }

    pub fn with_expires(self, expires: DateTime<Utc>) -> Self {
        Self {
            expires: Some(expires),
            ..self
        }
    }

    pub fn with_max_age(self, max_age: Duration) -> Self {
        Self {
            max_age: Some(max_age),
            ..self
        }
    }

    pub fn secure(self, secure: bool) -> Self {
        Self { secure, ..self }
    }

    pub fn http_only(self, http_only: bool) -> Self {
        Self { http_only, ..self }
    }

    pub fn with_same_site(self, same_site: SameSite) -> Self {
        Self {
            same_site: Some(same_site),
            ..self
        }
    }

    /// Set-Cookieヘッダー値を生成（書式は`cookie`クレートに任せる）
    ///
    /// CR/LFなどを含むPath/Domainは出力せずに読み飛ばす。
    pub fn to_header_value(&self) -> String {
        let mut builder = ::cookie::Cookie::build((self.name.as_str(), self.value.as_str()))
            .secure(self.secure)
            .http_only(self.http_only);

        match &self.path {
            Some(path) if is_header_value_valid(path) => builder = builder.path(path.as_str()),
            Some(path) => warn!("Skipping invalid Path attribute for cookie {}: {:?}", self.name, path),
            None => {}
        }
        match &self.domain {
            Some(domain) if is_header_value_valid(domain) => builder = builder.domain(domain.as_str()),
            Some(domain) => warn!("Skipping invalid Domain attribute for cookie {}: {:?}", self.name, domain),
            None => {}
        }
        if let Some(expires) = self.expires {
            match OffsetDateTime::from_unix_timestamp(expires.timestamp()) {
                Ok(at) => builder = builder.expires(at),
                Err(e) => warn!("Skipping out-of-range Expires for cookie {}: {}", self.name, e),
            }
        }
        if let Some(max_age) = self.max_age {
            let secs = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
            builder = builder.max_age(TimeDuration::seconds(secs));
        }
        if let Some(same_site) = self.same_site {
            builder = builder.same_site(same_site.into());
        }

        builder.build().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_header() {
        let cookies = parse_cookie_header("lastname=Mahendra; session=abc123");
        assert_eq!(cookies.get("lastname"), Some(&"Mahendra".to_string()));
        assert_eq!(cookies.get("session"), Some(&"abc123".to_string()));
    }

    #[test]
    fn test_parse_cookie_header_skips_garbage() {
        let cookies = parse_cookie_header("novalue; a=1; b=2");
        assert_eq!(cookies.get("a"), Some(&"1".to_string()));
        assert_eq!(cookies.get("b"), Some(&"2".to_string()));
        assert!(cookies.get("novalue").is_none());
    }

    #[test]
    fn test_session_cookie_header_value() {
        let cookie = Cookie::try_new("lastname", "Mahendra")
            .unwrap()
            .with_path("/")
            .http_only(true)
            .with_same_site(SameSite::Lax);

        let header = cookie.to_header_value();
        assert!(header.starts_with("lastname=Mahendra; "));
        assert!(header.contains("; Path=/"));
        assert!(header.contains("; HttpOnly"));
        assert!(header.contains("; SameSite=Lax"));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn test_cookie_expiry_attributes() {
        use chrono::TimeZone;

        let expires = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let header = Cookie::try_new("token", "abc")
            .unwrap()
            .with_domain("example.com")
            .with_expires(expires)
            .with_max_age(Duration::from_secs(3600))
            .secure(true)
            .to_header_value();

        assert!(header.starts_with("token=abc; "));
        assert!(header.contains("; Domain=example.com"));
        assert!(header.contains("; Expires=Tue, 31 Dec 2024 23:59:59 GMT"));
        assert!(header.contains("; Max-Age=3600"));
        assert!(header.contains("; Secure"));
    }

    #[test]
    fn test_cookie_try_new_validation() {
        assert!(Cookie::try_new("SID", "abcDEF123-_.:~").is_ok());
        assert!(Cookie::try_new("SID", "bad;value").is_err());
        assert!(Cookie::try_new("SID", "bad\nvalue").is_err());
        assert!(Cookie::try_new("bad name", "v").is_err());
    }

    #[test]
    fn test_invalid_domain_is_not_written() {
        let cookie = Cookie {
            domain: Some("bad\r\ndomain".into()),
            ..Cookie::try_new("A", "B").unwrap()
        };
        assert_eq!(cookie.to_header_value(), "A=B");
    }
}
