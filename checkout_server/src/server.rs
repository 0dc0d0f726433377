use std::time::Duration;

use actix_web::{
    dev::Server,
    error::JsonPayloadError,
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpRequest,
    HttpServer,
};
use checkout_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    IpnApi,
    OrderFlowApi,
    PaymentSessionApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    routes::{health, CreateOrderRoute, InitiatePaymentRoute, OrderByIdRoute, PaymentIpnRoute, PaymentReturnRoute},
    workers::{payment_expiry_task, restock_task},
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, notification_hooks());
    let producers = handlers.producers();
    let _handlers = handlers.start_handlers();
    // Workers run for the lifetime of the server.
    let _restock = restock_task(db.clone(), producers.clone(), &config.workers).start();
    let _expiry = payment_expiry_task(db.clone(), producers.clone(), &config.workers).start();
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Customer notifications hang off these hooks. For now they only log.
fn notification_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev| {
        Box::pin(async move {
            info!("📬️ Order #{} for user {} was paid by [{}]", ev.order.id, ev.order.user_id, ev.payment.gateway_ref);
        })
    });
    hooks.on_order_annulled(|ev| {
        Box::pin(async move {
            info!("📬️ Order #{} for user {} was annulled: {:?}", ev.order.id, ev.order.user_id, ev.reason);
        })
    });
    hooks
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ServerError::InvalidRequestBody(err.to_string()).into()
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), config.checkout.clone());
        let sessions_api = PaymentSessionApi::new(db.clone(), config.provider.clone());
        let ipn_api = IpnApi::new(db.clone(), config.provider.clone(), producers.clone());
        let options = ServerOptions::from_config(&config);
        let api_scope = web::scope("/api")
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(InitiatePaymentRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cko::access_log"))
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(sessions_api))
            .app_data(web::Data::new(ipn_api))
            .app_data(web::Data::new(options))
            .service(health)
            .service(api_scope)
            .service(PaymentIpnRoute::<SqliteDatabase>::new())
            .service(PaymentReturnRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
