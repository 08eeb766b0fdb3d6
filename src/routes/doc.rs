use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, ProtectedResponse, TokenIdentity},
        orders::{OrderDetails, OrderResponse, ResolvedOrderItem, SubmitOrderRequest},
        products::{CreateProductRequest, ProductResponse, UpdateProductRequest},
        reports::{SalesReport, TopProduct},
    },
    models::{Order, OrderItem, Product},
    routes::{auth, health, orders, products as product_routes, reports},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::protected,
        product_routes::list_products,
        product_routes::create_product,
        product_routes::update_product,
        product_routes::delete_product,
        orders::list_orders,
        orders::submit_order,
        reports::sales_today,
        reports::sales_this_month,
        reports::top_products
    ),
    components(
        schemas(
            Product,
            Order,
            OrderItem,
            LoginRequest,
            LoginResponse,
            TokenIdentity,
            ProtectedResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductResponse,
            SubmitOrderRequest,
            OrderResponse,
            OrderDetails,
            ResolvedOrderItem,
            SalesReport,
            TopProduct,
            health::HealthData
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Login and token verification"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Orders", description = "Order ledger endpoints"),
        (name = "Reports", description = "Sales reporting endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
