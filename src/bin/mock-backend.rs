//! Demo backends for trying the load balancer locally.
//!
//! ```text
//! mock-backend --backend 8081="Server A" --backend 8082="Server B" --backend 8083="Server C"
//! lb-proxy --backend http://localhost:8081 --backend http://localhost:8082 \
//!          --backend http://localhost:8083 --backend http://localhost:8085
//! ```

use std::net::SocketAddr;

use axum::Router;
use clap::Parser;

#[derive(Parser)]
#[command(name = "mock-backend")]
#[command(about = "Start demo HTTP backends that greet with their name and port", long_about = None)]
struct Cli {
    /// `PORT=NAME` pairs; one server is started per pair.
    #[arg(long = "backend", value_name = "PORT=NAME", value_parser = parse_backend, required = true)]
    backends: Vec<(u16, String)>,
}

fn parse_backend(raw: &str) -> Result<(u16, String), String> {
    let (port, name) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PORT=NAME, got `{}`", raw))?;
    let port = port.parse().map_err(|e| format!("invalid port `{}`: {}", port, e))?;
    Ok((port, name.to_string()))
}

fn greeting(name: &str, port: u16) -> String {
    format!("Hello from {} (Port {})", name, port)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut servers = Vec::new();

    for (port, name) in cli.backends {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let body = greeting(&name, port);
        let app = Router::new().fallback(move || {
            let body = body.clone();
            async move { body }
        });

        println!("Backend server running on http://{}", addr);
        servers.push(tokio::spawn(async move { axum::serve(listener, app).await }));
    }

    for server in servers {
        server.await??;
    }
    Ok(())
}
