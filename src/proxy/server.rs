use crate::{
    config::ProxyConfig,
    error::{EditError, Result},
    gemini::GeminiClient,
    logger,
    models::media::MAX_UPLOAD_BYTES,
    proxy::{EditProxy, ProxyFailure},
};
use actix_web::{dev::Server, middleware, web, App, HttpRequest, HttpResponse, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

/// Generous ceiling on request bodies. The 10 MiB upload guidance is advisory
/// and base64 inflates by 4/3, so this only stops runaway uploads.
pub const BODY_LIMIT_BYTES: usize = MAX_UPLOAD_BYTES * 6;

/// Mounts the edit handler on `route` for every HTTP method.
pub fn configure(cfg: &mut web::ServiceConfig, proxy: web::Data<EditProxy>, route: &str) {
    configure_with_limit(cfg, proxy, route, BODY_LIMIT_BYTES);
}

pub fn configure_with_limit(
    cfg: &mut web::ServiceConfig,
    proxy: web::Data<EditProxy>,
    route: &str,
    body_limit: usize,
) {
    cfg.app_data(proxy)
        .app_data(web::PayloadConfig::new(body_limit))
        .route(route, web::route().to(edit_image));
}

/// A body that cannot be read (too large, truncated) is handled as an empty
/// one, so the caller still gets the JSON error contract.
async fn edit_image(
    req: HttpRequest,
    body: std::result::Result<web::Bytes, actix_web::Error>,
    proxy: web::Data<EditProxy>,
) -> std::result::Result<HttpResponse, ProxyFailure> {
    let body = body.unwrap_or_else(|e| {
        log::error!("Failed to read {} request body: {}", req.method(), e);
        web::Bytes::new()
    });
    let reply = proxy.handle(req.method(), &body).await?;
    Ok(HttpResponse::Ok().json(reply))
}

/// Serves `proxy` on an already bound listener.
pub fn serve(proxy: EditProxy, route: &str, listener: TcpListener) -> Result<Server> {
    let proxy = web::Data::new(proxy);
    let route = route.to_string();

    let server = HttpServer::new(move || {
        let proxy = proxy.clone();
        let route = route.clone();
        App::new()
            .wrap(middleware::Logger::new("%r %s %Dms"))
            .configure(move |cfg| configure(cfg, proxy, &route))
    })
    .listen(listener)
    .map_err(|e| EditError::ConfigError(format!("Failed to listen: {}", e)))?
    .run();

    Ok(server)
}

/// Builds the model client from `config` and runs until shutdown. A missing
/// credential fails here, before any socket is bound.
pub async fn run(config: ProxyConfig) -> Result<()> {
    let model = GeminiClient::new(&config.gemini)?;
    let proxy = EditProxy::new(Arc::new(model));

    let listener = TcpListener::bind((config.host(), config.port())).map_err(|e| {
        EditError::ConfigError(format!(
            "Failed to bind {}:{}: {}",
            config.host(),
            config.port(),
            e
        ))
    })?;

    logger::log_startup_info(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.host(),
        config.port(),
    );
    logger::log_config_info(&config);

    serve(proxy, config.route(), listener)?
        .await
        .map_err(|e| EditError::ConfigError(format!("Server error: {}", e)))
}
