use crate::errors::{AppError, AppResult, ErrorEnvelope};
use crate::memory_storage::InMemoryStore;
use crate::models::*;
use crate::repository::{CreditRepository, CustomerRepository};
use crate::services::{CreditService, CustomerService};
use crate::validation::Validate;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request, State},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub customer_service: CustomerService,
    pub credit_service: CreditService,
}

impl AppState {
    /// Wires both services over the given repositories.
    pub fn new(customers: Arc<dyn CustomerRepository>, credits: Arc<dyn CreditRepository>) -> Self {
        let customer_service = CustomerService::new(customers);
        let credit_service = CreditService::new(credits, customer_service.clone());
        Self {
            customer_service,
            credit_service,
        }
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self::new(Arc::new(store.clone()), Arc::new(store))
    }
}

/// `Path` extractor whose failures render as a validation error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `Query` extractor whose failures render as a validation error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// JSON body extractor that also runs the payload's field validation.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state).await?;
        payload.validate()?;
        Ok(Self(payload))
    }
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-credit-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

// ============ Customers ============

/// POST /api/customers
///
/// Registers a customer. A cpf that is already registered yields 409.
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "customers",
    request_body = CustomerDto,
    responses(
        (status = 201, description = "Customer registered", body = CustomerView),
        (status = 400, description = "Invalid payload", body = ErrorEnvelope),
        (status = 409, description = "CPF already registered", body = ErrorEnvelope)
    )
)]
pub async fn save_customer(
    State(state): State<Arc<AppState>>,
    ValidatedJson(dto): ValidatedJson<CustomerDto>,
) -> AppResult<(StatusCode, Json<CustomerView>)> {
    tracing::info!("POST /api/customers");

    let customer = state
        .customer_service
        .register(dto.into_new_customer())
        .await?;

    tracing::info!("Customer {} registered", customer.id);
    Ok((StatusCode::CREATED, Json(CustomerView::from(&customer))))
}

/// GET /api/customers/:id
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "customers",
    params(
        ("id" = i64, Path, description = "Customer id")
    ),
    responses(
        (status = 200, description = "Customer found", body = CustomerView),
        (status = 400, description = "Unknown customer id", body = ErrorEnvelope)
    )
)]
pub async fn find_customer(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<CustomerView>> {
    tracing::info!("GET /api/customers/{}", id);

    let customer = state.customer_service.find_by_id(id).await?;
    Ok(Json(CustomerView::from(&customer)))
}

/// DELETE /api/customers/:id
///
/// Removes the customer together with every credit it owns.
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "customers",
    params(
        ("id" = i64, Path, description = "Customer id")
    ),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 400, description = "Unknown customer id", body = ErrorEnvelope)
    )
)]
pub async fn delete_customer(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    tracing::info!("DELETE /api/customers/{}", id);

    state.customer_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/customers?customerId=
#[utoipa::path(
    patch,
    path = "/api/customers",
    tag = "customers",
    params(CustomerIdQuery),
    request_body = CustomerUpdateDto,
    responses(
        (status = 200, description = "Customer updated", body = CustomerView),
        (status = 400, description = "Invalid payload or unknown customer id", body = ErrorEnvelope)
    )
)]
pub async fn update_customer(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CustomerIdQuery>,
    ValidatedJson(dto): ValidatedJson<CustomerUpdateDto>,
) -> AppResult<Json<CustomerView>> {
    tracing::info!("PATCH /api/customers?customerId={}", query.customer_id);

    let customer = state
        .customer_service
        .update(query.customer_id, dto.into_patch())
        .await?;
    Ok(Json(CustomerView::from(&customer)))
}

// ============ Credits ============

/// POST /api/credits
///
/// Opens a credit proposal for an existing customer.
#[utoipa::path(
    post,
    path = "/api/credits",
    tag = "credits",
    request_body = CreditDto,
    responses(
        (status = 201, description = "Credit opened", body = CreditView),
        (status = 400, description = "Invalid payload or unknown customer id", body = ErrorEnvelope)
    )
)]
pub async fn save_credit(
    State(state): State<Arc<AppState>>,
    ValidatedJson(dto): ValidatedJson<CreditDto>,
) -> AppResult<(StatusCode, Json<CreditView>)> {
    tracing::info!("POST /api/credits - customerId={}", dto.customer_id);

    let (credit, owner) = state
        .credit_service
        .create_with_owner(dto.into_proposal())
        .await?;

    tracing::info!(
        "Credit {} - Customer {} saved!",
        credit.credit_code,
        owner.first_name
    );
    Ok((StatusCode::CREATED, Json(CreditView::new(&credit, &owner))))
}

/// GET /api/credits?customerId=
///
/// Lists a customer's credits. An unknown customer id yields an empty list.
#[utoipa::path(
    get,
    path = "/api/credits",
    tag = "credits",
    params(CustomerIdQuery),
    responses(
        (status = 200, description = "Credits owned by the customer", body = Vec<CreditListView>)
    )
)]
pub async fn find_all_credits_by_customer(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CustomerIdQuery>,
) -> AppResult<Json<Vec<CreditListView>>> {
    tracing::info!("GET /api/credits?customerId={}", query.customer_id);

    let credits = state
        .credit_service
        .find_all_by_customer(query.customer_id)
        .await?;
    Ok(Json(credits.iter().map(CreditListView::from).collect()))
}

/// GET /api/credits/:creditCode?customerId=
#[utoipa::path(
    get,
    path = "/api/credits/{creditCode}",
    tag = "credits",
    params(
        ("creditCode" = Uuid, Path, description = "Credit code"),
        CustomerIdQuery
    ),
    responses(
        (status = 200, description = "Credit found", body = CreditView),
        (status = 400, description = "Unknown credit code or credit owned by another customer", body = ErrorEnvelope)
    )
)]
pub async fn find_credit_by_code(
    State(state): State<Arc<AppState>>,
    ApiPath(credit_code): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<CustomerIdQuery>,
) -> AppResult<Json<CreditView>> {
    tracing::info!(
        "GET /api/credits/{}?customerId={}",
        credit_code,
        query.customer_id
    );

    let credit = state
        .credit_service
        .find_by_credit_code(query.customer_id, credit_code)
        .await?;
    let owner = state.customer_service.find_by_id(credit.customer_id).await?;
    Ok(Json(CreditView::new(&credit, &owner)))
}
