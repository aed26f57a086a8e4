//! 名前付きセグメント（`:name`）によるルートパターン

use std::fmt;

use log::{debug, warn};

use crate::common::percent_decode_path;
use crate::context::PathParams;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// ルートパターン（例: `/users/:userId/orders/:orderId`）
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

/// 先頭の`/`と末尾の`/`（1つだけ）を取り除いてセグメントに分割
fn split_segments(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

impl RoutePattern {
    /// パターン文字列を解析
    pub fn parse(pattern: &str) -> Result<Self, Error> {
        if !pattern.starts_with('/') {
            return Err(Error::Configuration(format!(
                "Route pattern must start with '/': {}",
                pattern
            )));
        }

        let mut segments = Vec::new();
        for raw_segment in split_segments(pattern) {
            if raw_segment.is_empty() {
                return Err(Error::Configuration(format!(
                    "Route pattern contains an empty segment: {}",
                    pattern
                )));
            }

            let segment = match raw_segment.strip_prefix(':') {
                Some("") => {
                    return Err(Error::Configuration(format!(
                        "Route parameter without a name in pattern: {}",
                        pattern
                    )));
                }
                Some(name) => {
                    if segments
                        .iter()
                        .any(|s| matches!(s, Segment::Param(n) if n == name))
                    {
                        return Err(Error::Configuration(format!(
                            "Duplicate route parameter '{}' in pattern: {}",
                            name, pattern
                        )));
                    }
                    Segment::Param(name.to_string())
                }
                None => Segment::Literal(raw_segment.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// 登録時のパターン文字列
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// パラメータ名（出現順）
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// パスがマッチすればバインドされたパラメータを返す
    ///
    /// リテラルは大文字小文字を区別して完全一致、パラメータは空でない1セグメントにマッチする。
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        let path_segments = split_segments(path);
        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (segment, value) in self.segments.iter().zip(path_segments) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != value {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if value.is_empty() {
                        return None;
                    }
                    params.push(name.as_str(), percent_decode_path(value));
                }
            }
        }

        debug!("Path {} matched pattern {}", path, self.raw);
        Some(params)
    }

    /// パラメータ名を無視して同じ形をしているか（重複ルートの判定用）
    pub fn same_shape(&self, other: &RoutePattern) -> bool {
        if self.segments.len() != other.segments.len() {
            return false;
        }
        let same = self
            .segments
            .iter()
            .zip(&other.segments)
            .all(|(a, b)| match (a, b) {
                (Segment::Literal(x), Segment::Literal(y)) => x == y,
                (Segment::Param(_), Segment::Param(_)) => true,
                _ => false,
            });
        if same {
            warn!("Patterns {} and {} have the same shape", self.raw, other.raw);
        }
        same
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_pattern() {
        let p = RoutePattern::parse("/").unwrap();
        assert!(p.match_path("/").is_some());
        assert!(p.match_path("").is_some());
        assert!(p.match_path("/hello").is_none());
    }

    #[test]
    fn test_literal_match_is_case_sensitive() {
        let p = RoutePattern::parse("/hello").unwrap();
        assert!(p.match_path("/hello").is_some());
        assert!(p.match_path("/hello/").is_some());
        assert!(p.match_path("/Hello").is_none());
        assert!(p.match_path("/hello/world").is_none());
    }

    #[test]
    fn test_named_params_bind_by_name() {
        let p = RoutePattern::parse("/users/:userId/orders/:orderId").unwrap();
        let params = p.match_path("/users/rangga/orders/2").unwrap();
        assert_eq!(params.get("userId"), Some("rangga"));
        assert_eq!(params.get("orderId"), Some("2"));
        assert_eq!(p.param_names().collect::<Vec<_>>(), vec!["userId", "orderId"]);

        assert!(p.match_path("/users/rangga/order/2").is_none());
        assert!(p.match_path("/users/rangga/orders").is_none());
    }

    #[test]
    fn test_param_values_are_percent_decoded() {
        let p = RoutePattern::parse("/files/:name").unwrap();
        let params = p.match_path("/files/hello%20world+x").unwrap();
        assert_eq!(params.get("name"), Some("hello world+x"));
    }

    #[test]
    fn test_empty_segment_does_not_bind() {
        let p = RoutePattern::parse("/users/:id/orders").unwrap();
        assert!(p.match_path("/users//orders").is_none());
    }

    #[test]
    fn test_invalid_patterns_are_rejected() {
        assert!(matches!(RoutePattern::parse("hello"), Err(Error::Configuration(_))));
        assert!(matches!(RoutePattern::parse("/a//b"), Err(Error::Configuration(_))));
        assert!(matches!(RoutePattern::parse("/users/:"), Err(Error::Configuration(_))));
        assert!(matches!(RoutePattern::parse("/:id/x/:id"), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_same_shape_ignores_param_names() {
        let a = RoutePattern::parse("/users/:id").unwrap();
        let b = RoutePattern::parse("/users/:userId/").unwrap();
        let c = RoutePattern::parse("/users/me").unwrap();
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
        assert_eq!(b.to_string(), "/users/:userId/");
    }
}
