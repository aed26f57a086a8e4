//! 結合テスト用の共通ヘルパー

#![allow(dead_code)]

use routebridge::transport::{parse_response, RawResponse};

pub const BOUNDARY: &str = "----routebridge-test-boundary";

/// テスト用のアップロードファイル
pub const CONTOH_TXT: &[u8] = include_bytes!("../fixtures/contoh.txt");

/// multipart/form-dataのボディを組み立てる
pub struct MultipartBuilder {
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self { body: Vec::new() }
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                name, file_name
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    pub fn build(mut self) -> Vec<u8> {
        self.body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

/// Content-Length付きの生リクエストを組み立てる
pub fn raw_request(method: &str, target: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut raw = format!("{} {} HTTP/1.1\r\nHost: localhost\r\n", method, target).into_bytes();
    for (name, value) in headers {
        raw.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }
    if !body.is_empty() {
        raw.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
    }
    raw.extend_from_slice(b"\r\n");
    raw.extend_from_slice(body);
    raw
}

/// chunked転送エンコーディングの生リクエストを組み立てる
pub fn raw_chunked_request(
    method: &str,
    target: &str,
    headers: &[(&str, &str)],
    body: &[u8],
    chunk_size: usize,
) -> Vec<u8> {
    let mut raw = format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\n",
        method, target
    )
    .into_bytes();
    for (name, value) in headers {
        raw.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }
    raw.extend_from_slice(b"\r\n");
    for chunk in body.chunks(chunk_size) {
        raw.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        raw.extend_from_slice(chunk);
        raw.extend_from_slice(b"\r\n");
    }
    raw.extend_from_slice(b"0\r\n\r\n");
    raw
}

/// test_rawの結果をデコードする
pub fn decode(raw: &[u8]) -> RawResponse {
    parse_response(raw).expect("response should be well-formed HTTP/1.1")
}
