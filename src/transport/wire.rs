//! HTTP/1.1のメッセージ単位のエンコード・デコード（ソケットを持たないコーデック）
//!
//! `App::test_raw`やテストから、生のリクエストバイト列を`Request`へ、
//! `Response`を生のレスポンスバイト列へ変換するために使う。

use std::io::Write;

use log::{debug, error, warn};

use crate::common::utils::{is_header_name_valid, is_header_value_valid};
use crate::common::{reason_phrase_for, split_path_and_query, Method, Request, Response};
use crate::error::Error;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// ヘッダー部とボディ部の境界を探す
fn split_head(raw: &[u8]) -> Result<(&str, &[u8]), Error> {
    let pos = raw
        .windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
        .ok_or_else(|| Error::BadRequest("Incomplete HTTP message head".to_string()))?;

    let head = std::str::from_utf8(&raw[..pos])
        .map_err(|e| Error::BadRequest(format!("HTTP message head is not valid UTF-8: {}", e)))?;
    Ok((head, &raw[pos + HEAD_TERMINATOR.len()..]))
}

/// `Name: value`形式のヘッダー行を解析
fn parse_header_line(line: &str) -> Result<(&str, &str), Error> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| Error::BadRequest(format!("Malformed header line: {:?}", line)))?;
    let value = value.trim();

    if !is_header_name_valid(name) {
        return Err(Error::BadRequest(format!("Invalid header name: {:?}", name)));
    }
    if !is_header_value_valid(value) {
        return Err(Error::BadRequest(format!("Invalid value for header {}", name)));
    }
    Ok((name, value))
}

/// chunked転送エンコーディングのボディを復号
fn decode_chunked(mut rest: &[u8], max_body_size: usize) -> Result<Vec<u8>, Error> {
    let mut body = Vec::new();

    loop {
        let line_end = rest
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or_else(|| Error::BadRequest("Truncated chunk size line".to_string()))?;
        let size_line = std::str::from_utf8(&rest[..line_end])
            .map_err(|_| Error::BadRequest("Chunk size line is not valid UTF-8".to_string()))?;
        // チャンク拡張（`;name=value`）は無視
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| Error::BadRequest(format!("Invalid chunk size: {:?}", size_hex)))?;
        rest = &rest[line_end + 2..];

        if size == 0 {
            // トレーラーは読み捨てる
            break;
        }

        if size > max_body_size.saturating_sub(body.len()) {
            return Err(Error::PayloadTooLarge(format!(
                "Chunked request body exceeds maximum allowed size {} bytes",
                max_body_size
            )));
        }
        if rest.len() < size.saturating_add(2) || &rest[size..size + 2] != b"\r\n" {
            return Err(Error::BadRequest("Truncated or malformed chunk data".to_string()));
        }

        body.extend_from_slice(&rest[..size]);
        rest = &rest[size + 2..];
    }

    debug!("Decoded chunked body: {} bytes", body.len());
    Ok(body)
}

/// 生のHTTP/1.1リクエストを`Request`に変換する
///
/// ボディは`Content-Length`または`Transfer-Encoding: chunked`で区切られる。
/// ボディが`max_body_size`を超える場合は`Error::PayloadTooLarge`。
pub fn parse_request(raw: &[u8], max_body_size: usize) -> Result<Request, Error> {
    let (head, rest) = split_head(raw)?;
    let mut lines = head.split("\r\n");

    let request_line = lines.next().unwrap_or("");
    let mut parts = request_line.split(' ');
    let (method_str, target, version) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(t), Some(v), None) => (m, t, v),
        _ => {
            return Err(Error::BadRequest(format!("Malformed request line: {:?}", request_line)));
        }
    };

    if !version.starts_with("HTTP/1.") {
        return Err(Error::BadRequest(format!("Unsupported HTTP version: {}", version)));
    }
    let method = Method::from_str(method_str)
        .ok_or_else(|| Error::BadRequest(format!("Unsupported method: {}", method_str)))?;
    if !target.starts_with('/') {
        return Err(Error::BadRequest(format!("Unsupported request target: {}", target)));
    }

    let (path, query_params) = split_path_and_query(target);
    let mut request = Request::new(method, path);
    request.query_params = query_params;

    for line in lines {
        let (name, value) = parse_header_line(line)?;
        request.insert_header(name, value);
    }

    let chunked = request
        .header("transfer-encoding")
        .map(|te| te.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false);
    let content_length = request.header("content-length");

    let body = match (chunked, content_length) {
        (true, Some(_)) => {
            warn!("Request carries both Transfer-Encoding and Content-Length");
            return Err(Error::BadRequest(
                "Both Transfer-Encoding and Content-Length are present".to_string(),
            ));
        }
        (true, None) => decode_chunked(rest, max_body_size)?,
        (false, Some(len)) => {
            let len = len
                .parse::<usize>()
                .map_err(|_| Error::BadRequest(format!("Invalid Content-Length: {}", len)))?;
            if len > max_body_size {
                return Err(Error::PayloadTooLarge(format!(
                    "Request body size {} bytes exceeds maximum allowed size {} bytes",
                    len, max_body_size
                )));
            }
            if rest.len() < len {
                return Err(Error::BadRequest(format!(
                    "Request body is shorter than Content-Length ({} < {})",
                    rest.len(),
                    len
                )));
            }
            rest[..len].to_vec()
        }
        (false, None) => Vec::new(),
    };

    if !body.is_empty() {
        request.body = Some(body);
    }
    Ok(request)
}

/// ボディを持たないステータスか
fn is_bodiless_status(status: u16) -> bool {
    (100..200).contains(&status) || status == 204 || status == 304
}

/// 出力可能なヘッダーを検証して集める（不正なものがあればNone）
fn collect_headers(response: &Response) -> Option<Vec<(String, String)>> {
    let mut headers: Vec<(String, String)> = Vec::new();

    for (name, value) in &response.headers {
        // Content-Lengthはフレームワーク側で付与する
        if name.eq_ignore_ascii_case("Content-Length") {
            continue;
        }
        if !is_header_name_valid(name) || !is_header_value_valid(value) {
            error!("Invalid response header detected: {:?}", name);
            return None;
        }
        headers.push((name.clone(), value.clone()));
    }
    headers.sort();

    for cookie in &response.cookies {
        let value = cookie.to_header_value();
        if !is_header_value_valid(&value) {
            error!("Invalid Set-Cookie value for cookie {:?}", cookie.name);
            return None;
        }
        headers.push(("Set-Cookie".to_string(), value));
    }

    Some(headers)
}

/// `Response`を生のHTTP/1.1レスポンスに変換する
///
/// 不正なヘッダーを含むレスポンスは500レスポンスに置き換える。
pub fn encode_response(response: Response) -> Vec<u8> {
    let (response, headers) = match collect_headers(&response) {
        Some(headers) => (response, headers),
        None => {
            let fallback = Response::internal_server_error().text("Internal Server Error");
            let headers = collect_headers(&fallback).unwrap_or_default();
            (fallback, headers)
        }
    };

    let mut out = Vec::new();
    out.extend_from_slice(
        format!("HTTP/1.1 {} {}\r\n", response.status, reason_phrase_for(response.status)).as_bytes(),
    );
    for (name, value) in headers {
        out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }

    let body = if is_bodiless_status(response.status) {
        Vec::new()
    } else {
        let body = response.body.unwrap_or_default();
        out.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
        body
    };

    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&body);
    out
}

/// レスポンスを任意のライターへ書き出す
pub fn write_response_to<W: Write>(response: Response, out: &mut W) -> Result<(), Error> {
    out.write_all(&encode_response(response))
        .map_err(|e| Error::Internal(format!("Failed to write response: {}", e)))?;
    out.flush()
        .map_err(|e| Error::Internal(format!("Failed to flush response: {}", e)))
}

/// デコード済みの生レスポンス（クライアント側・テスト用）
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// 受信順のヘッダー（同名ヘッダーも保持）
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// 最初に見つかったヘッダー値（大文字小文字を区別しない）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set-Cookieヘッダーの値をすべて返す
    pub fn set_cookies(&self) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("set-cookie"))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// 生のHTTP/1.1レスポンスを解析する（`Content-Length`区切りのみ）
pub fn parse_response(raw: &[u8]) -> Result<RawResponse, Error> {
    let (head, rest) = split_head(raw)?;
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap_or("");
    let mut parts = status_line.splitn(3, ' ');
    let status = match (parts.next(), parts.next()) {
        (Some(v), Some(code)) if v.starts_with("HTTP/1.") => code
            .parse::<u16>()
            .map_err(|_| Error::BadRequest(format!("Invalid status code: {}", code)))?,
        _ => {
            return Err(Error::BadRequest(format!("Malformed status line: {:?}", status_line)));
        }
    };

    let mut headers = Vec::new();
    for line in lines {
        let (name, value) = parse_header_line(line)?;
        headers.push((name.to_string(), value.to_string()));
    }

    let mut response = RawResponse {
        status,
        headers,
        body: Vec::new(),
    };
    if let Some(len) = response.header("content-length") {
        let len = len
            .parse::<usize>()
            .map_err(|_| Error::BadRequest(format!("Invalid Content-Length: {}", len)))?;
        if rest.len() < len {
            return Err(Error::BadRequest("Response body is truncated".to_string()));
        }
        response.body = rest[..len].to_vec();
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Cookie;

    const MAX: usize = 1024;

    #[test]
    fn test_parse_get_with_query_headers_and_cookies() {
        let raw = b"GET /hello?name=Rangga&x=1&x=2 HTTP/1.1\r\nHost: localhost\r\nFirstName: Rangga\r\nCookie: lastname=Mahendra\r\n\r\n";
        let req = parse_request(raw, MAX).unwrap();

        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "/hello");
        assert_eq!(req.query_params.get("name"), Some(&"Rangga".to_string()));
        assert_eq!(req.query_params.get("x"), Some(&"2".to_string()));
        assert_eq!(req.header("firstname"), Some("Rangga"));
        assert_eq!(req.cookies.get("lastname"), Some(&"Mahendra".to_string()));
        assert!(req.body.is_none());
    }

    #[test]
    fn test_chunked_and_content_length_bodies_are_identical() {
        let plain = b"POST /hello HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: 11\r\n\r\nname=Rangga";
        let chunked = b"POST /hello HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nname=\r\n6;ext=1\r\nRangga\r\n0\r\n\r\n";

        let a = parse_request(plain, MAX).unwrap();
        let b = parse_request(chunked, MAX).unwrap();
        assert_eq!(a.body, Some(b"name=Rangga".to_vec()));
        assert_eq!(a.body, b.body);
    }

    #[test]
    fn test_body_limits() {
        let raw = b"POST /upload HTTP/1.1\r\nContent-Length: 2048\r\n\r\n";
        assert!(matches!(parse_request(raw, MAX), Err(Error::PayloadTooLarge(_))));

        let raw = b"POST /upload HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n10\r\n0123456789abcdef\r\n0\r\n\r\n";
        assert!(matches!(parse_request(raw, 8), Err(Error::PayloadTooLarge(_))));

        // 途方もないチャンクサイズでもオーバーフローせずにエラーになる
        let raw = b"POST /hello HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n1\r\na\r\nffffffffffffffff\r\nxyz\r\n0\r\n\r\n";
        assert!(matches!(parse_request(raw, 1024), Err(Error::PayloadTooLarge(_))));
        assert!(matches!(parse_request(raw, usize::MAX), Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_malformed_requests_are_bad_request() {
        let cases: &[&[u8]] = &[
            b"GET /hello HTTP/1.1\r\nHost: x\r\n",
            b"GET /hello\r\n\r\n",
            b"BREW /pot HTTP/1.1\r\n\r\n",
            b"GET hello HTTP/1.1\r\n\r\n",
            b"GET / HTTP/2\r\n\r\n",
            b"GET / HTTP/1.1\r\nBad Header\r\n\r\n",
            b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nshort",
            b"POST / HTTP/1.1\r\nContent-Length: abc\r\n\r\n",
            b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\nContent-Length: 3\r\n\r\nabc",
            b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n",
        ];
        for raw in cases {
            assert!(
                matches!(parse_request(raw, MAX), Err(Error::BadRequest(_))),
                "expected BadRequest for {:?}",
                String::from_utf8_lossy(raw)
            );
        }
    }

    #[test]
    fn test_encode_response_framing() {
        let res = Response::ok()
            .text("Hello World")
            .with_cookie(Cookie::try_new("a", "1").unwrap().with_path("/"))
            .with_cookie(Cookie::try_new("b", "2").unwrap().http_only(true));

        let raw = encode_response(res);
        let text = String::from_utf8(raw.clone()).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\nHello World"));

        let parsed = parse_response(&raw).unwrap();
        assert_eq!(parsed.status, 200);
        assert_eq!(parsed.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(parsed.header("content-length"), Some("11"));
        assert_eq!(parsed.set_cookies(), vec!["a=1; Path=/", "b=2; HttpOnly"]);
        assert_eq!(parsed.body_text(), "Hello World");
    }

    #[test]
    fn test_user_content_length_is_replaced() {
        let mut res = Response::ok().text("abc");
        res.headers.insert("Content-Length".to_string(), "999".to_string());

        let parsed = parse_response(&encode_response(res)).unwrap();
        assert_eq!(parsed.header("content-length"), Some("3"));
        assert_eq!(parsed.body, b"abc".to_vec());
    }

    #[test]
    fn test_invalid_header_becomes_500() {
        let mut res = Response::ok().text("secret");
        res.headers.insert("X-Bad".to_string(), "a\r\nInjected: 1".to_string());

        let parsed = parse_response(&encode_response(res)).unwrap();
        assert_eq!(parsed.status, 500);
        assert!(parsed.header("injected").is_none());
        assert_eq!(parsed.body_text(), "Internal Server Error");
    }

    #[test]
    fn test_no_content_has_no_body() {
        let raw = encode_response(Response::no_content().with_body(b"ignored".to_vec()));
        assert_eq!(raw, b"HTTP/1.1 204 No Content\r\n\r\n".to_vec());
    }

    #[test]
    fn test_write_response_to_writer() {
        let mut out = Vec::new();
        write_response_to(Response::not_found().text("Not Found"), &mut out).unwrap();
        assert!(out.starts_with(b"HTTP/1.1 404 Not Found\r\n"));
    }
}
