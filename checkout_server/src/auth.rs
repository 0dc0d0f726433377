//! Caller identity.
//!
//! The checkout server does not authenticate anyone itself. It sits behind an authentication proxy that verifies the
//! customer's session and forwards the user id in a trusted header (`x-user-id` unless `CKO_USER_ID_HEADER` says
//! otherwise). Handlers that act on behalf of a customer take a [`UserIdentity`] argument, and requests without a
//! usable header are turned away with `401 Unauthorized` before the handler runs.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use checkout_engine::db_types::UserId;
use log::debug;

use crate::{config::ServerOptions, errors::ServerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserIdentity(pub UserId);

impl UserIdentity {
    pub fn user_id(&self) -> UserId {
        self.0
    }
}

fn identity_from_request(req: &HttpRequest) -> Result<UserIdentity, ServerError> {
    let header = req
        .app_data::<web::Data<ServerOptions>>()
        .map(|o| o.user_id_header.clone())
        .unwrap_or_else(|| ServerOptions::default().user_id_header);
    let value = req.headers().get(header.as_str()).ok_or_else(|| ServerError::MissingIdentity(header.clone()))?;
    let user_id = value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<UserId>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            debug!("💻️ Ignoring unreadable user id in {header}: {value:?}");
            ServerError::MissingIdentity(format!("{header} does not hold a valid user id"))
        })?;
    Ok(UserIdentity(user_id))
}

impl FromRequest for UserIdentity {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identity_from_request(req))
    }
}
