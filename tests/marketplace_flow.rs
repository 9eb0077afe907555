use handcrafted_haven::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::{
        auth::RegisterRequest,
        cart::{AddToCartRequest, UpdateCartItemRequest},
        orders::{OrderLineRequest, PlaceOrderRequest},
        profile::ContactRequest,
        reviews::CreateReviewRequest,
        saved::SaveItemRequest,
        seller_orders::UpdateOrderStatusRequest,
    },
    error::AppError,
    middleware::auth::{AuthUser, MaybeAuthUser},
    models::{Product, ProfileKind, Role},
    routes::params::OrderListQuery,
    services::{
        analytics_service, auth_service, cart_service, order_service, product_service,
        profile_service, review_service, saved_service, seller_order_service, seller_service,
    },
    state::AppState,
    upload::FormData,
};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

// Each test registers its own accounts, so tests share the database without truncating it.
async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run marketplace flow tests.");
            return Ok(None);
        }
    };
    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    Ok(Some(AppState::new(
        pool,
        AppConfig::for_database(database_url, "flow-test-secret"),
    )))
}

async fn register(state: &AppState, name: &str, role: Role) -> anyhow::Result<AuthUser> {
    let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4());
    let user = auth_service::register_user(
        state,
        RegisterRequest {
            name: name.into(),
            email,
            password: "secret123".into(),
            role: Some(role),
        },
    )
    .await?
    .data
    .expect("user");
    Ok(AuthUser {
        user_id: user.id,
        role,
        name: user.name,
        email: user.email,
    })
}

async fn open_shop(state: &AppState, seller: &AuthUser, shop: &str) -> anyhow::Result<()> {
    let mut form = FormData::default();
    form.insert_text("name", seller.name.clone());
    form.insert_text("shop_name", shop);
    seller_service::create_profile(state, seller, form).await?;
    Ok(())
}

async fn list_product(
    state: &AppState,
    seller: &AuthUser,
    name: &str,
    price: &str,
) -> anyhow::Result<Product> {
    let mut form = FormData::default();
    form.insert_text("name", name);
    form.insert_text("price", price);
    form.insert_text("category", "Ceramics");
    form.insert_text("description", "Made by hand");
    let product = product_service::create_product(state, seller, form)
        .await?
        .data
        .expect("product");
    Ok(product)
}

fn line(product: &Product, quantity: i32) -> OrderLineRequest {
    OrderLineRequest {
        product_id: product.id,
        quantity,
        price: product.price,
    }
}

async fn audit_count(state: &AppState, action: &str, id_key: &str, id: Uuid) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM audit_logs WHERE action = $1 AND metadata ->> $2 = $3",
    )
    .bind(action)
    .bind(id_key)
    .bind(id.to_string())
    .fetch_one(&state.pool)
    .await?;
    Ok(count)
}

#[tokio::test]
async fn multi_seller_order_is_split_per_seller() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let potter = register(&state, "Potter", Role::Seller).await?;
    let weaver = register(&state, "Weaver", Role::Seller).await?;
    let customer = register(&state, "Customer", Role::Customer).await?;
    open_shop(&state, &potter, "Kiln").await?;
    open_shop(&state, &weaver, "Loom").await?;

    let mug = list_product(&state, &potter, "Mug", "10.00").await?;
    let runner = list_product(&state, &weaver, "Runner", "25.00").await?;

    // repeated adds merge into one line
    for quantity in [1, 2] {
        cart_service::add_to_cart(
            &state,
            &customer,
            AddToCartRequest {
                product_id: mug.id,
                quantity,
            },
        )
        .await?;
    }
    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: runner.id,
            quantity: 1,
        },
    )
    .await?;
    let cart = cart_service::list_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.summary.item_count, 4);
    assert_eq!(cart.summary.subtotal, Decimal::new(5500, 2));

    let order_number = format!("HH-{}", Uuid::new_v4());
    let request = PlaceOrderRequest {
        order_number: order_number.clone(),
        shipping_address: json!({ "street": "1 Kiln Lane", "city": "Stoke" }),
        total_amount: Decimal::new(5500, 2),
        payment_details: Some(json!({ "method": "card" })),
        items: vec![line(&mug, 3), line(&runner, 1)],
    };
    let placed = order_service::place_order(&state, &customer, request.clone())
        .await?
        .data
        .expect("order");
    assert_eq!(placed.order.status, "pending");
    assert_eq!(placed.items.len(), 2);

    let cart = cart_service::list_cart(&state, &customer).await?.data.expect("cart");
    assert!(cart.items.is_empty(), "cart is emptied by checkout");

    let duplicate = order_service::place_order(&state, &customer, request).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let mine = order_service::list_orders(&state, &customer, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert_eq!(mine.items.len(), 1);
    assert_eq!(mine.items[0].order.order_number, order_number);

    let potter_orders = seller_order_service::list_seller_orders(&state, &potter)
        .await?
        .data
        .expect("seller orders");
    assert_eq!(potter_orders.items.len(), 1);
    let slice = &potter_orders.items[0];
    assert_eq!(slice.items.len(), 1);
    assert_eq!(slice.items[0].product_id, mug.id);
    assert_eq!(slice.total_amount, Decimal::new(3000, 2));
    assert_eq!(slice.customer.name, "Customer");

    let weaver_slice = seller_order_service::get_seller_order(&state, &weaver, placed.order.id)
        .await?
        .data
        .expect("seller order");
    assert_eq!(weaver_slice.total_amount, Decimal::new(2500, 2));

    // pending cannot jump straight to shipped
    let skipped = seller_order_service::update_order_status(
        &state,
        &potter,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await;
    assert!(matches!(skipped, Err(AppError::BadRequest(_))));

    let updated = seller_order_service::update_order_status(
        &state,
        &potter,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: "processing".into(),
        },
    )
    .await?
    .data
    .expect("updated");
    assert_eq!(updated.status, "processing");

    let analytics = analytics_service::seller_analytics(&state, &potter)
        .await?
        .data
        .expect("analytics");
    assert_eq!(analytics.total_sales, Decimal::new(3000, 2));
    assert_eq!(analytics.total_orders, 1);
    assert_eq!(analytics.total_items_sold, 3);
    assert_eq!(analytics.total_products, 1);
    assert_eq!(analytics.top_products[0].product_id, mug.id);
    assert_eq!(analytics.monthly_revenue.len(), 1);

    let deleted = product_service::delete_product(&state, &potter, mug.id).await;
    assert!(matches!(deleted, Err(AppError::Conflict(_))));

    Ok(())
}

#[tokio::test]
async fn sellers_only_see_orders_with_their_products() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let potter = register(&state, "Potter", Role::Seller).await?;
    let stranger = register(&state, "Stranger", Role::Seller).await?;
    let customer = register(&state, "Customer", Role::Customer).await?;
    open_shop(&state, &potter, "Kiln").await?;
    open_shop(&state, &stranger, "Elsewhere").await?;
    let vase = list_product(&state, &potter, "Vase", "40.00").await?;

    let placed = order_service::place_order(
        &state,
        &customer,
        PlaceOrderRequest {
            order_number: format!("HH-{}", Uuid::new_v4()),
            shipping_address: json!({ "city": "Bath" }),
            total_amount: Decimal::new(4000, 2),
            payment_details: None,
            items: vec![line(&vase, 1)],
        },
    )
    .await?
    .data
    .expect("order");

    let hidden = seller_order_service::get_seller_order(&state, &stranger, placed.order.id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));

    let stranger_orders = seller_order_service::list_seller_orders(&state, &stranger)
        .await?
        .data
        .expect("orders");
    assert!(stranger_orders.items.is_empty());

    let foreign_update = seller_order_service::update_order_status(
        &state,
        &stranger,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: "cancelled".into(),
        },
    )
    .await;
    assert!(matches!(foreign_update, Err(AppError::NotFound)));

    let analytics = analytics_service::seller_analytics(&state, &stranger)
        .await?
        .data
        .expect("analytics");
    assert_eq!(analytics.total_orders, 0);
    assert_eq!(analytics.total_sales, Decimal::ZERO);

    Ok(())
}

#[tokio::test]
async fn saved_items_and_cart_quantities() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let seller = register(&state, "Maker", Role::Seller).await?;
    let customer = register(&state, "Shopper", Role::Customer).await?;
    open_shop(&state, &seller, "Bench").await?;
    let spoon = list_product(&state, &seller, "Spoon", "8.50").await?;

    let saved = saved_service::save_for_later(
        &state,
        &customer,
        SaveItemRequest {
            product_id: spoon.id,
        },
    )
    .await?
    .data
    .expect("saved");
    let again = saved_service::save_for_later(
        &state,
        &customer,
        SaveItemRequest {
            product_id: spoon.id,
        },
    )
    .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let moved = saved_service::move_to_cart(&state, &customer, saved.id)
        .await?
        .data
        .expect("cart item");
    assert_eq!(moved.quantity, 1);
    let remaining = saved_service::list_saved(&state, &customer).await?.data.expect("saved");
    assert!(remaining.items.is_empty());

    let zero = cart_service::update_quantity(
        &state,
        &customer,
        spoon.id,
        UpdateCartItemRequest { quantity: 0 },
    )
    .await;
    assert!(matches!(zero, Err(AppError::BadRequest(_))));

    let set = cart_service::update_quantity(
        &state,
        &customer,
        spoon.id,
        UpdateCartItemRequest { quantity: 4 },
    )
    .await?
    .data
    .expect("cart item");
    assert_eq!(set.quantity, 4);

    cart_service::remove_from_cart(&state, &customer, spoon.id).await?;
    let missing = cart_service::remove_from_cart(&state, &customer, spoon.id).await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    Ok(())
}

#[tokio::test]
async fn one_review_per_customer_and_target() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let seller = register(&state, "Glazer", Role::Seller).await?;
    let customer = register(&state, "Reviewer", Role::Customer).await?;
    open_shop(&state, &seller, "Glaze").await?;
    let bowl = list_product(&state, &seller, "Bowl", "30.00").await?;

    let review = review_service::create_review(
        &state,
        &customer,
        CreateReviewRequest {
            product_id: Some(bowl.id),
            seller_id: None,
            rating: 4,
            comment: "Beautiful glaze".into(),
        },
    )
    .await?
    .data
    .expect("review");
    assert_eq!(review.user_name, "Reviewer");

    let duplicate = review_service::create_review(
        &state,
        &customer,
        CreateReviewRequest {
            product_id: Some(bowl.id),
            seller_id: None,
            rating: 5,
            comment: "Still great".into(),
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let unknown = review_service::create_review(
        &state,
        &customer,
        CreateReviewRequest {
            product_id: Some(Uuid::new_v4()),
            seller_id: None,
            rating: 5,
            comment: "Who?".into(),
        },
    )
    .await;
    assert!(matches!(unknown, Err(AppError::Missing(_))));

    Ok(())
}

#[tokio::test]
async fn order_lines_keep_the_checkout_price() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let seller = register(&state, "Turner", Role::Seller).await?;
    let customer = register(&state, "Bargain", Role::Customer).await?;
    open_shop(&state, &seller, "Lathe").await?;
    let bowl = list_product(&state, &seller, "Bowl", "30.00").await?;

    let checkout_price = Decimal::new(2250, 2);
    assert_ne!(checkout_price, bowl.price);
    let placed = order_service::place_order(
        &state,
        &customer,
        PlaceOrderRequest {
            order_number: format!("HH-{}", Uuid::new_v4()),
            shipping_address: json!({ "city": "York" }),
            total_amount: Decimal::new(4500, 2),
            payment_details: None,
            items: vec![OrderLineRequest {
                product_id: bowl.id,
                quantity: 2,
                price: checkout_price,
            }],
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(placed.items[0].price, checkout_price);

    let mine = order_service::list_orders(&state, &customer, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert_eq!(mine.items[0].items[0].price, checkout_price);

    let slice = seller_order_service::get_seller_order(&state, &seller, placed.order.id)
        .await?
        .data
        .expect("seller order");
    assert_eq!(slice.items[0].price, checkout_price);
    assert_eq!(slice.items[0].line_total, Decimal::new(4500, 2));
    assert_eq!(slice.total_amount, Decimal::new(4500, 2));

    Ok(())
}

#[tokio::test]
async fn profile_and_contact_writes_are_audited() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let customer = register(&state, "Writer", Role::Customer).await?;
    let record = profile_service::upsert_record(
        &state,
        &customer,
        ProfileKind::Payment,
        json!({ "card_number": "4000 0000 0000 0002", "cvv": "999" }),
    )
    .await?
    .data
    .expect("record");
    assert_eq!(record.data, json!({ "card_last4": "0002" }));
    assert_eq!(audit_count(&state, "profile_upsert", "record_id", record.id).await?, 1);

    let message = profile_service::submit_contact(
        &state,
        &MaybeAuthUser(Some(customer.clone())),
        ContactRequest {
            name: "Writer".into(),
            email: customer.email.clone(),
            subject: "Commission".into(),
            message: "Could you make a teapot?".into(),
        },
    )
    .await?
    .data
    .expect("message");
    assert_eq!(message.user_id, Some(customer.user_id));
    assert_eq!(audit_count(&state, "contact_submit", "message_id", message.id).await?, 1);

    Ok(())
}
