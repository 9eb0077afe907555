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
        analytics::{MonthlyRevenue, SellerAnalytics, TopProduct},
        auth::{LoginRequest, LoginResponse, RegisterRequest, SessionUser},
        cart::{AddToCartRequest, CartLine, CartList, CartSummary, UpdateCartItemRequest},
        orders::{OrderLineRequest, OrderList, OrderWithItems, PlaceOrderRequest},
        products::{CategoryList, ProductDetail, ProductForm, ProductList, ProductProperties},
        profile::{ContactRequest, CustomerProfile},
        reviews::{CreateReviewRequest, ReviewList},
        saved::{SaveItemRequest, SavedList, SavedProduct},
        seller_orders::{
            OrderCustomer, SellerOrder, SellerOrderItem, SellerOrderList, UpdateOrderStatusRequest,
        },
        sellers::{PublicSeller, SellerDetail, SellerList, SellerProfileForm, SellerSummary},
    },
    models::{
        CartItem, ContactMessage, Order, OrderItem, Product, ProfileRecord, Review, Role,
        SavedItem, Seller, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        auth, cart, contact, customer, health, orders, params, products, reviews, seller, sellers,
    },
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
        auth::register,
        auth::login,
        auth::current_session,
        products::list_products,
        products::get_product,
        products::list_categories,
        products::list_featured,
        products::list_properties,
        sellers::list_sellers,
        sellers::get_seller,
        reviews::list_reviews,
        reviews::create_review,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::place_order,
        orders::get_order,
        customer::list_saved,
        customer::save_for_later,
        customer::remove_saved,
        customer::move_saved_to_cart,
        customer::get_profile,
        customer::put_address,
        customer::put_payment,
        contact::submit_contact,
        seller::get_profile,
        seller::create_profile,
        seller::update_profile,
        seller::list_products,
        seller::create_product,
        seller::get_product,
        seller::update_product,
        seller::delete_product,
        seller::list_orders,
        seller::get_order,
        seller::update_order_status,
        seller::analytics
    ),
    components(
        schemas(
            User,
            Role,
            Seller,
            Product,
            CartItem,
            SavedItem,
            Order,
            OrderItem,
            Review,
            ProfileRecord,
            ContactMessage,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            SessionUser,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartLine,
            CartSummary,
            CartList,
            SaveItemRequest,
            SavedProduct,
            SavedList,
            PlaceOrderRequest,
            OrderLineRequest,
            OrderList,
            OrderWithItems,
            ProductForm,
            ProductList,
            ProductDetail,
            CategoryList,
            ProductProperties,
            SellerProfileForm,
            SellerSummary,
            PublicSeller,
            SellerList,
            SellerDetail,
            CreateReviewRequest,
            ReviewList,
            CustomerProfile,
            ContactRequest,
            UpdateOrderStatusRequest,
            OrderCustomer,
            SellerOrderItem,
            SellerOrder,
            SellerOrderList,
            SellerAnalytics,
            TopProduct,
            MonthlyRevenue,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::SellerQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<SellerOrder>,
            ApiResponse<SellerAnalytics>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and session"),
        (name = "Products", description = "Public catalog"),
        (name = "Sellers", description = "Public seller directory"),
        (name = "Reviews", description = "Product and seller reviews"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Customer orders"),
        (name = "Customer", description = "Saved items and customer profile"),
        (name = "Contact", description = "Contact form"),
        (name = "Seller", description = "Seller dashboard: profile, products, orders, analytics"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
