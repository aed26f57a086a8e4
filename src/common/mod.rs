//! 共通の抽象化レイヤーとトレイト定義

pub mod http;
pub mod cookie;
pub mod locals;
pub mod traits;
pub mod utils;

pub use http::{Method, Request, Response, StatusCode, reason_phrase_for};
pub use cookie::{Cookie, SameSite, parse_cookie_header};
pub use locals::Locals;
pub use traits::{Handler, Middleware};
pub use utils::{
    get_max_body_size, get_upload_dir, parse_query_string, percent_decode, percent_decode_path,
    split_path_and_query,
};
