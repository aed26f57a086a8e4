#[cfg(feature = "server")]
use std::env;

use log::info;

use routebridge::demo;
use routebridge::get_upload_dir;

#[tokio::main]
async fn main() {
    // ロガーの初期化
    env_logger::init();

    let upload_dir = get_upload_dir();
    let app = match demo::build_app(upload_dir) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to build application: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting RouteBridge application");

    #[cfg(feature = "server")]
    {
        let port = match env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse::<u16>() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error parsing port: {}", e);
                std::process::exit(1);
            }
        };
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        info!("Running as HTTP server on {}:{}", host, port);
        if let Err(e) = routebridge::transport::run_server(app, &host, port).await {
            eprintln!("Server error: {}", e);
            std::process::exit(1);
        }
    }

    #[cfg(not(feature = "server"))]
    {
        drop(app);
        println!("Please enable the 'server' feature to run the HTTP server.");
        println!("Example: cargo run --features server");
        std::process::exit(1);
    }
}
