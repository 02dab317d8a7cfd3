// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Plain-text metrics endpoint.

use cipherbench_benchmark::MetricsExporter;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

/// Start the metrics server in a background task.
pub fn start_metrics_server(port: u16, exporter: MetricsExporter) {
    tokio::spawn(async move {
        let addr = format!("0.0.0.0:{}", port);
        match TcpListener::bind(&addr).await {
            Ok(listener) => {
                tracing::info!("Metrics server starting on {}", addr);
                serve(listener, exporter).await;
            }
            Err(e) => {
                tracing::error!("Failed to bind metrics server: {}", e);
            }
        }
    });
}

/// Answer every connection with the current exposition text.
async fn serve(listener: TcpListener, exporter: MetricsExporter) {
    loop {
        match listener.accept().await {
            Ok((mut socket, _)) => {
                let body = exporter.render();
                tokio::spawn(async move {
                    let response = format!(
                        "HTTP/1.0 200 OK\r\nConnection: close\r\nContent-Length: {}\r\nContent-Type: text/plain; version=0.0.4\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.flush().await;
                });
            }
            Err(e) => tracing::warn!("Metrics connection failed: {}", e),
        }
    }
}
