use portal_auth::api;
use portal_auth::logger::*;
use portal_auth::server::*;
use portal_auth::settings::*;
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let address: SocketAddr = project_settings.http.address.parse()?;
    if let Some(tls) = &project_settings.http.tls {
        for (what, path) in [("cert", &tls.cert_path), ("key", &tls.key_path)] {
            if !fs::metadata(path)?.is_file() {
                return Err(anyhow::anyhow!(
                    "TLS {} is not a regular file: {:?}",
                    what,
                    path
                ));
            }
        }
    } else if project_settings.app.is_production() {
        warn!("serving plain HTTP in production");
    }

    let server = Arc::new(Server::try_new(&project_settings).await?);
    let routes = api::service(server.clone());

    let shutdown = shutdown_on(signal::ctrl_c());

    info!("listening on {}", address);
    match &project_settings.http.tls {
        Some(tls) => {
            warp::serve(routes)
                .tls()
                .cert_path(&tls.cert_path)
                .key_path(&tls.key_path)
                .bind_with_graceful_shutdown(address, shutdown)
                .1
                .await
        }
        None => {
            warp::serve(routes)
                .try_bind_with_graceful_shutdown(address, shutdown)?
                .1
                .await
        }
    }

    let shutdown_timeout = std::time::Duration::from_secs(100);
    match tokio::time::timeout(shutdown_timeout, server.shutdown()).await {
        Ok(_) => info!("server shutdown successfully"),
        Err(_) => error!("server shutdown timed out"),
    }

    Ok(())
}

/// Resolves when `signal` fires. If the handler cannot be installed it never
/// resolves, so the server keeps running instead of stopping right after binding.
async fn shutdown_on(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        error!("could not listen for SIGINT, graceful shutdown disabled: {}", e);
        std::future::pending::<()>().await;
    }
}
