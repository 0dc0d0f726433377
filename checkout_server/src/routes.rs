//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use std::collections::HashMap;

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use checkout_engine::{
    db_types::OrderId,
    provider::{IpnResponse, IpnResponseCode},
    CheckoutDatabase,
    IpnApi,
    OrderFlowApi,
    PaymentSessionApi,
};
use log::*;

use crate::{
    auth::UserIdentity,
    config::ServerOptions,
    data_objects::{NewOrderRequest, OrderResponse},
    errors::ServerError,
    helpers::get_remote_ip,
};

/// Used as the customer's address on the provider's page if the request carries no usable peer address.
const UNKNOWN_CLIENT_IP: &str = "127.0.0.1";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl CheckoutDatabase);
/// Places an order for the authenticated user.
///
/// The body names a shipping address owned by the user and at least one `{product_id, quantity}` line. Prices come
/// from the catalog, never from the request. On success the order is `PENDING` and its stock is held until
/// `expires_at`.
pub async fn create_order<B: CheckoutDatabase>(
    identity: UserIdentity,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let NewOrderRequest { address_id, items } = body.into_inner();
    debug!("💻️ POST order for user {} with {} lines", identity.user_id(), items.len());
    let order = api.create_order(identity.user_id(), address_id, items).await?;
    let scale = api.config().currency_scale;
    Ok(HttpResponse::Created().json(OrderResponse::new(order, scale)))
}

route!(order_by_id => Get "/orders/{id}" impl CheckoutDatabase);
pub async fn order_by_id<B: CheckoutDatabase>(
    identity: UserIdentity,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET order #{order_id} for user {}", identity.user_id());
    let order = api.fetch_order_for_user(order_id, identity.user_id()).await?;
    let scale = api.config().currency_scale;
    Ok(HttpResponse::Ok().json(OrderResponse::new(order, scale)))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(initiate_payment => Post "/orders/{id}/payment" impl CheckoutDatabase);
/// Returns the signed redirect to the payment provider for one of the user's pending orders.
///
/// Calling this again while the session is live returns the same redirect.
pub async fn initiate_payment<B: CheckoutDatabase>(
    req: HttpRequest,
    identity: UserIdentity,
    path: web::Path<OrderId>,
    api: web::Data<PaymentSessionApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let client_ip = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| {
            warn!("💻️ Could not determine the client address for order #{order_id}. Using {UNKNOWN_CLIENT_IP}");
            UNKNOWN_CLIENT_IP.to_string()
        });
    debug!("💻️ POST payment for order #{order_id} by user {} from {client_ip}", identity.user_id());
    let session = api.initiate_or_reuse(order_id, &client_ip, identity.user_id()).await?;
    Ok(HttpResponse::Ok().json(session))
}

fn query_params(req: &HttpRequest) -> Result<HashMap<String, String>, ServerError> {
    web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .map_err(|e| ServerError::InvalidRequestPath(e.to_string()))
}

route!(payment_ipn => Get "/payments/ipn" impl CheckoutDatabase);
/// The provider's server-to-server payment notification.
///
/// The provider expects HTTP 200 with `{"RspCode", "Message"}` for every call, so nothing here is ever returned as an
/// HTTP error.
pub async fn payment_ipn<B: CheckoutDatabase>(req: HttpRequest, api: web::Data<IpnApi<B>>) -> HttpResponse {
    trace!("💻️ Received payment notification");
    let response = match query_params(&req) {
        Ok(params) => api.process_provider_callback(params).await,
        Err(e) => {
            warn!("💻️ Could not read payment notification. {e}");
            IpnResponse::from(IpnResponseCode::UnknownError)
        },
    };
    debug!("💻️ Payment notification answered with {}", response.code);
    HttpResponse::Ok().json(response)
}

route!(payment_return => Get "/payments/return" impl CheckoutDatabase);
/// Where the provider sends the customer's browser after payment. This only reports what the redirect claims; the
/// order is updated by the IPN alone.
pub async fn payment_return<B: CheckoutDatabase>(
    req: HttpRequest,
    api: web::Data<IpnApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = query_params(&req)?;
    let inspection = api.inspect_return(params);
    debug!("💻️ Customer returned from the payment page: {inspection:?}");
    Ok(HttpResponse::Ok().json(inspection))
}
