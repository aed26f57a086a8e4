//! リクエストボディの解析（urlencodedフォーム、multipart、アップロードファイル）

use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use log::{debug, warn};
use multipart::server::Multipart;

use crate::common::parse_query_string;
use crate::error::Error;

/// Content-Typeのメディアタイプ部分（パラメータ除去・小文字化）
pub fn media_type(ct: &str) -> String {
    ct.split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Content-Typeの許容範囲を判定（JSON系）
pub fn is_json_like_content_type(ct: &str) -> bool {
    let main_type = media_type(ct);
    main_type == "application/json" || main_type.ends_with("+json")
}

/// application/x-www-form-urlencoded かどうか
pub fn is_form_urlencoded(ct: &str) -> bool {
    media_type(ct) == "application/x-www-form-urlencoded"
}

/// multipart/form-data かどうか
pub fn is_multipart_form(ct: &str) -> bool {
    media_type(ct) == "multipart/form-data"
}

/// Content-Typeからmultipartのboundaryを取り出す
pub fn multipart_boundary(ct: &str) -> Option<String> {
    ct.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("boundary") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}

/// multipartでアップロードされたファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// フォームのフィールド名
    pub field_name: String,
    /// クライアントが送ってきたファイル名
    pub file_name: String,
    /// パートのContent-Type
    pub content_type: Option<String>,
    /// ファイルの中身
    pub data: Vec<u8>,
}

impl FilePart {
    /// ファイルサイズ（バイト）
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// ファイル名の最後のパス要素だけを返す（`..` や空は拒否）
    pub fn sanitized_file_name(&self) -> Option<String> {
        let last = self
            .file_name
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or("")
            .trim();
        if last.is_empty() || last == "." || last == ".." {
            None
        } else {
            Some(last.to_string())
        }
    }
}

/// フォームの解析結果（テキストフィールドとファイル）
#[derive(Debug, Clone, Default)]
pub struct Form {
    fields: HashMap<String, String>,
    files: Vec<FilePart>,
}

impl Form {
    /// テキストフィールドの値を取得
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.as_str())
    }

    /// フィールド名に対応する最初のファイルを取得
    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.files.iter().find(|f| f.field_name == name)
    }

    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    pub fn files(&self) -> &[FilePart] {
        &self.files
    }
}

/// Content-Typeに応じてボディをフォームとして解析する
///
/// フォーム以外のContent-Type（またはContent-Typeなし）の場合は空のフォームを返す。
pub fn parse_form(content_type: Option<&str>, body: &[u8]) -> Result<Form, Error> {
    let Some(ct) = content_type else {
        return Ok(Form::default());
    };

    if is_form_urlencoded(ct) {
        let text = std::str::from_utf8(body)
            .map_err(|e| Error::BadRequest(format!("Form body is not valid UTF-8: {}", e)))?;
        return Ok(Form {
            fields: parse_query_string(text),
            files: Vec::new(),
        });
    }

    if is_multipart_form(ct) {
        let boundary = multipart_boundary(ct).ok_or_else(|| {
            warn!("multipart/form-data request without boundary: {}", ct);
            Error::BadRequest("Missing multipart boundary".to_string())
        })?;
        return parse_multipart(body, &boundary);
    }

    debug!("Content-Type {} is not a form, skipping form parsing", ct);
    Ok(Form::default())
}

/// multipart/form-dataのボディをメモリ上で解析する
fn parse_multipart(body: &[u8], boundary: &str) -> Result<Form, Error> {
    let mut multipart = Multipart::with_body(Cursor::new(body), boundary);
    let mut form = Form::default();

    while let Some(mut field) = multipart
        .read_entry()
        .map_err(|e| Error::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let mut data = Vec::new();
        field
            .data
            .read_to_end(&mut data)
            .map_err(|e| Error::BadRequest(format!("Failed to read multipart field: {}", e)))?;

        let field_name = field.headers.name.to_string();
        match field.headers.filename.clone() {
            Some(file_name) => {
                debug!("multipart file part: field={} file={} ({} bytes)", field_name, file_name, data.len());
                form.files.push(FilePart {
                    field_name,
                    file_name,
                    content_type: field.headers.content_type.as_ref().map(|m| m.to_string()),
                    data,
                });
            }
            None => {
                let value = String::from_utf8(data).map_err(|e| {
                    Error::BadRequest(format!("Multipart field {} is not valid UTF-8: {}", field_name, e))
                })?;
                form.fields.insert(field_name, value);
            }
        }
    }

    Ok(form)
}

/// アップロードファイルを保存する
///
/// 保存先ディレクトリ内の一時ファイルへ書き込んでからリネームする。
/// 途中で失敗した場合、一時ファイルはdrop時に削除される。
pub fn save_file_part(part: &FilePart, dest: &Path) -> Result<(), Error> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    fs::create_dir_all(dir).map_err(|e| {
        Error::Internal(format!("Failed to create directory {}: {}", dir.display(), e))
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| Error::Internal(format!("Failed to create temporary file: {}", e)))?;
    tmp.write_all(&part.data)
        .map_err(|e| Error::Internal(format!("Failed to write uploaded file: {}", e)))?;
    // 失敗時は一時ファイルもここで削除される
    tmp.persist(dest).map_err(|e| {
        let message = format!("Failed to save file to {}: {}", dest.display(), e.error);
        drop(e.file);
        Error::Internal(message)
    })?;

    debug!("Saved {} bytes to {}", part.data.len(), dest.display());
    Ok(())
}
