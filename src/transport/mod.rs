//! トランスポート層（HTTP/1.1コーデックとネットワークサーバー）

pub mod wire;

#[cfg(feature = "server")]
pub mod server;

pub use wire::{encode_response, parse_request, parse_response, write_response_to, RawResponse};

#[cfg(feature = "server")]
pub use server::run_server;
