use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
    typed_header::TypedHeaderRejection,
};

use std::sync::Arc;

use crate::{accounts, transactions, users};
use engine::{Engine, EngineError};

static USER_ID_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-user-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// The authenticated caller, inserted by the `identify` middleware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Caller(pub(crate) i64);

/// `TypedHeader` for the caller identity header.
///
/// The authenticating gateway in front of this service sets "x-user-id" to the
/// id of the user it has verified.
#[derive(Debug)]
struct UserIdHeader(i64);

impl Header for UserIdHeader {
    fn name() -> &'static axum::http::HeaderName {
        &USER_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let Ok(value) = value.trim().parse::<i64>() else {
            return Err(AxumError::invalid());
        };
        if value <= 0 {
            return Err(AxumError::invalid());
        }

        Ok(UserIdHeader(value))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        values.extend(std::iter::once(axum::http::HeaderValue::from(self.0)));
    }
}

async fn identify(
    user_header: Result<TypedHeader<UserIdHeader>, TypedHeaderRejection>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Ok(TypedHeader(UserIdHeader(user_id))) = user_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    match state.engine.user(user_id).await {
        Ok(_) => {}
        Err(EngineError::NotFound(_) | EngineError::InvalidOperation(_)) => {
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(err) => {
            tracing::error!("failed to resolve caller {user_id}: {err}");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    request.extensions_mut().insert(Caller(user_id));
    Ok(next.run(request).await)
}

/// Builds the HTTP API on top of `engine`.
pub fn router(engine: Arc<Engine>) -> Router {
    let state = ServerState { engine };

    Router::new()
        .route(
            "/accounts",
            post(accounts::account_new).get(accounts::list),
        )
        .route(
            "/accounts/{id}",
            get(accounts::detail)
                .patch(accounts::adjust)
                .delete(accounts::remove),
        )
        .route("/accounts/{id}/balance", get(accounts::balance))
        .route(
            "/accounts/{id}/reconciliation",
            get(accounts::reconciliation),
        )
        .route("/transactions", get(transactions::list))
        .route("/transactions/{id}", get(transactions::get))
        .route("/transactions/deposit", post(transactions::deposit))
        .route("/transactions/withdraw", post(transactions::withdraw))
        .route("/transactions/transfer", post(transactions::transfer))
        .route(
            "/user/profile",
            get(users::profile).patch(users::update_profile),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), identify))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(engine))).await
}

