//! 共通ユーティリティ関数群（URLデコード、クエリ解析、環境設定 等）

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use crate::error::Error;

/// デフォルトのリクエストボディ上限（5MB）
pub const DEFAULT_MAX_BODY_SIZE: usize = 5 * 1024 * 1024;

/// デフォルトのアップロード保存先
pub const DEFAULT_UPLOAD_DIR: &str = "./target";

/// URLエンコーディングのデコード関数（クエリ・フォーム用、`+` はスペース）
pub fn percent_decode(input: &str) -> String {
    decode_bytes(input, true)
}

/// パスセグメント用のデコード（`+` はそのまま残す）
pub fn percent_decode_path(input: &str) -> String {
    decode_bytes(input, false)
}

fn decode_bytes(input: &str, plus_as_space: bool) -> String {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (from_hex(bytes[i + 1]), from_hex(bytes[i + 2])) {
                result.push(h * 16 + l);
                i += 3;
                continue;
            }
        } else if plus_as_space && bytes[i] == b'+' {
            result.push(b' ');
            i += 1;
            continue;
        }
        result.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&result).into_owned()
}

/// 16進数文字をバイト値に変換するヘルパー関数
fn from_hex(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// クエリ文字列（およびurlencodedフォーム）をパースしてURLデコードを行う
///
/// 重複したキーは後に現れた値で上書きされる。
pub fn parse_query_string(query_string: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    if query_string.is_empty() {
        return params;
    }

    for pair in query_string.split('&') {
        if pair.is_empty() {
            continue;
        }
        let mut parts = pair.splitn(2, '=');
        if let Some(key) = parts.next() {
            let value = parts.next().unwrap_or("");
            params.insert(percent_decode(key), percent_decode(value));
        }
    }

    params
}

/// リクエストターゲット（`/path?query`）をパスとクエリパラメータに分割する
pub fn split_path_and_query(target: &str) -> (String, HashMap<String, String>) {
    match target.split_once('?') {
        Some((path, query)) => (path.to_string(), parse_query_string(query)),
        None => (target.to_string(), HashMap::new()),
    }
}

/// リクエストボディの最大サイズ（バイト）を取得する
/// 優先順位: 環境変数 `ROUTEBRIDGE_MAX_BODY_SIZE` -> デフォルト 5MB
pub fn get_max_body_size() -> usize {
    env::var("ROUTEBRIDGE_MAX_BODY_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_BODY_SIZE)
}

/// アップロードファイルの保存先ディレクトリを取得する
/// 優先順位: 環境変数 `ROUTEBRIDGE_UPLOAD_DIR` -> `./target`
pub fn get_upload_dir() -> PathBuf {
    env::var("ROUTEBRIDGE_UPLOAD_DIR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR))
}

/// ヘッダー値に使用可能な文字かを判定（CRLF・制御文字を拒否）
pub fn is_header_value_valid(value: &str) -> bool {
    // 保守的にUS-ASCII可視範囲とHTAB/SP以外の制御文字を拒否する
    value.chars().all(|c| {
        let code = c as u32;
        (code >= 0x20 && code != 0x7F) || c == '\t'
    })
}

/// ヘッダー名が安全なトークンかを判定
pub fn is_header_name_valid(name: &str) -> bool {
    if name.is_empty() { return false; }
    // token = 1*tchar, tchar = "!#$%&'*+-.^_`|~" or DIGIT or ALPHA
    name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '!'|'#'|'$'|'%'|'&'|'\''|'*'|'+'|'-'|'.'|'^'|'_'|'`'|'|'|'~'))
}

/// Cookie名が安全なトークンか（RFC6265準拠の簡易版）
pub fn is_cookie_name_valid(name: &str) -> bool {
    if name.is_empty() { return false; }
    const FORBIDDEN: &[char] = &['(',')','<','>','@',',',';',':','\\','"','/','[',']','?','{','}',' ','\t','\r','\n'];
    name.chars().all(|c| c.is_ascii() && !c.is_ascii_control() && !FORBIDDEN.contains(&c))
}

/// Cookie値が安全か（RFC6265 cookie-octetの簡易版）
/// 許容: 0x21, 0x23-0x2B, 0x2D-0x3A, 0x3C-0x5B, 0x5D-0x7E
pub fn is_cookie_value_valid(value: &str) -> bool {
    value.chars().all(|c| {
        let b = c as u32;
        matches!(b,
            0x21 |
            0x23..=0x2B |
            0x2D..=0x3A |
            0x3C..=0x5B |
            0x5D..=0x7E
        )
    })
}

/// ヘルパー: 無効なCookie名/値ならErrorを返す
pub fn validate_cookie_name_value(name: &str, value: &str) -> Result<(), Error> {
    if !is_cookie_name_valid(name) {
        return Err(Error::BadRequest("cookie name contains invalid characters".into()));
    }
    if !is_cookie_value_valid(value) {
        return Err(Error::BadRequest("cookie value contains invalid characters".into()));
    }
    Ok(())
}
