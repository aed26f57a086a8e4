//! ハンドラーの実装（分割モジュール）

pub mod response;
pub mod pattern;
pub mod core;
pub mod builders;

pub use response::{Json, ResponseWrapper};
pub use pattern::RoutePattern;
pub use core::{RouteHandler, AsyncRouteHandler};
pub use builders::{
    get, async_get,
    post, async_post,
    put, async_put,
    patch, async_patch,
    delete, async_delete,
    head, async_head,
    options, async_options,
    post_json, async_post_json,
    JsonOrError,
};
