//! 環境変数によるボディ上限のテスト（環境変数を書き換えるため独立したバイナリにする）

mod common;

use common::{decode, raw_chunked_request, raw_request};
use routebridge::demo::build_app;

#[test]
fn test_body_over_limit_is_413() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(dir.path()).unwrap();
    let headers = [("Content-Type", "application/x-www-form-urlencoded")];
    let body = b"name=this-body-is-longer-than-sixteen-bytes";

    temp_env::with_var("ROUTEBRIDGE_MAX_BODY_SIZE", Some("16"), || {
        let rt = tokio::runtime::Runtime::new().unwrap();

        let res = decode(&rt.block_on(app.test_raw(&raw_request("POST", "/hello", &headers, body))));
        assert_eq!(res.status, 413);
        assert_eq!(res.body_text(), "Payload Too Large");

        let raw = raw_chunked_request("POST", "/hello", &headers, body, 8);
        let res = decode(&rt.block_on(app.test_raw(&raw)));
        assert_eq!(res.status, 413);

        let res = decode(&rt.block_on(app.test_raw(&raw_request("POST", "/hello", &headers, b"name=ok"))));
        assert_eq!(res.status, 200);
        assert_eq!(res.body_text(), "Hello ok");
    });
}
