use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use crate::authentication::RequireMailCredentials;
use crate::configuration::Settings;
use crate::dispatcher::MailDispatcher;
use crate::email_client::EmailClient;
use crate::routes;
use crate::token_manager::{RefreshHandle, TokenManager};

pub struct Application {
    port: u16,
    server: Server,
    refresh: RefreshHandle,
}

impl Application {
    /// Wires the token manager, mail client and HTTP server together and
    /// starts the scheduled token refresh.
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let token_manager = Arc::new(TokenManager::new(&configuration.gmail)?);
        let recipient = configuration.gmail.recipient()?;
        let email_client = EmailClient::new(
            configuration.gmail.api_base_url.clone(),
            Arc::clone(&token_manager),
            configuration.gmail.timeout(),
        )
        .context("Failed to build the mail provider client")?;
        let dispatcher = MailDispatcher::new(email_client, recipient);

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind {}", address))?;
        let port = listener.local_addr()?.port();

        let refresh = Arc::clone(&token_manager).start(configuration.gmail.refresh_interval());
        let server = run(listener, dispatcher, token_manager)?;

        Ok(Self {
            port,
            server,
            refresh,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        let outcome = self.server.await;
        self.refresh.stop();
        outcome
    }
}

pub fn run(
    listener: TcpListener,
    dispatcher: MailDispatcher,
    token_manager: Arc<TokenManager>,
) -> Result<Server, std::io::Error> {
    let dispatcher = web::Data::new(dispatcher);
    let token_manager = web::Data::from(token_manager);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health", web::get().to(routes::health_check::health_check))
            .service(
                web::resource("/api/contact")
                    .app_data(
                        web::JsonConfig::default()
                            .error_handler(routes::contact::json_error_handler),
                    )
                    .route(web::post().to(routes::contact::contact))
                    .default_service(web::to(routes::contact::method_not_allowed))
                    .wrap(RequireMailCredentials),
            )
            .app_data(dispatcher.clone())
            .app_data(token_manager.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
