use utoipa::OpenApi;

use crate::errors::ErrorEnvelope;
use crate::handlers;
use crate::models::{
    CreditDto, CreditListView, CreditStatus, CreditView, CustomerDto, CustomerUpdateDto,
    CustomerView,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Credit Application API",
        version = "0.1.0"
    ),
    tags(
        (name = "customers", description = "Customer registration endpoints"),
        (name = "credits", description = "Credit proposal endpoints")
    ),
    paths(
        handlers::save_customer,
        handlers::find_customer,
        handlers::delete_customer,
        handlers::update_customer,
        handlers::save_credit,
        handlers::find_all_credits_by_customer,
        handlers::find_credit_by_code,
    ),
    components(schemas(
        CustomerDto,
        CustomerUpdateDto,
        CustomerView,
        CreditDto,
        CreditView,
        CreditListView,
        CreditStatus,
        ErrorEnvelope,
    ))
)]
pub struct ApiDoc;
