use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, HttpResponse};

use crate::token_manager::{TokenError, TokenManager};

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Mail credentials are not configured")]
    MissingCredential,
    #[error("Unable to obtain a mail access token")]
    TokenUnavailable(#[source] TokenError),
}

#[derive(serde::Serialize)]
struct AuthErrorBody {
    error: String,
}

/// Lets a request through only if the mail credential can still produce an
/// access token. Otherwise it answers `401 Unauthorized` and the wrapped
/// service is never called.
pub struct RequireMailCredentials;

impl<S, B> Transform<S, ServiceRequest> for RequireMailCredentials
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Transform = RequireMailCredentialsMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireMailCredentialsMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireMailCredentialsMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireMailCredentialsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    #[allow(clippy::type_complexity)]
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let token_manager = req.app_data::<web::Data<TokenManager>>().cloned();

        Box::pin(async move {
            match check_mail_credentials(token_manager).await {
                Ok(()) => service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_left_body),
                Err(e) => {
                    tracing::warn!(
                        error.cause_chain = ?e,
                        error.message = %e,
                        "Rejecting request, mail credentials are unusable"
                    );
                    let response = HttpResponse::Unauthorized().json(AuthErrorBody {
                        error: e.to_string(),
                    });
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

#[tracing::instrument(name = "Checking mail credentials", skip(token_manager))]
async fn check_mail_credentials(
    token_manager: Option<web::Data<TokenManager>>,
) -> Result<(), AuthError> {
    let token_manager = token_manager.ok_or(AuthError::MissingCredential)?;
    token_manager
        .access_token()
        .await
        .map_err(AuthError::TokenUnavailable)?;
    Ok(())
}
