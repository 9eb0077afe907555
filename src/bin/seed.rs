use handcrafted_haven::{
    config::AppConfig,
    db::{DbPool, create_pool, run_migrations},
    models::Role,
    services::auth_service::hash_password,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let customer_id = ensure_user(
        &pool,
        "Casey Customer",
        "customer@example.com",
        "customer123",
        Role::Customer,
    )
    .await?;
    let seller_user_id = ensure_user(
        &pool,
        "Morgan Maker",
        "seller@example.com",
        "seller123",
        Role::Seller,
    )
    .await?;
    let seller_id = ensure_seller(&pool, seller_user_id).await?;
    seed_products(&pool, seller_id).await?;

    println!("Seed completed. Customer ID: {customer_id}, Seller ID: {seller_id}");
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_seller(pool: &DbPool, user_id: Uuid) -> anyhow::Result<Uuid> {
    let (seller_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO sellers (id, user_id, name, shop_name, location, bio, story, contact)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (user_id) DO UPDATE SET shop_name = EXCLUDED.shop_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind("Morgan Maker")
    .bind("Kiln & Loom")
    .bind("Asheville, NC")
    .bind("Wheel-thrown stoneware and hand-woven textiles.")
    .bind("Started with a secondhand wheel in a garage in 2015.")
    .bind("seller@example.com")
    .fetch_one(pool)
    .await?;

    println!("Ensured seller profile {seller_id}");
    Ok(seller_id)
}

async fn seed_products(pool: &DbPool, seller_id: Uuid) -> anyhow::Result<()> {
    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE seller_id = $1")
        .bind(seller_id)
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        println!("Products already seeded");
        return Ok(());
    }

    let products = [
        ("Speckled Mug", "Stoneware mug, 12oz", 2800, "Ceramics", "Cream", "Stoneware"),
        ("Serving Bowl", "Large ash-glazed bowl", 6400, "Ceramics", "Green", "Stoneware"),
        ("Table Runner", "Hand-woven cotton runner", 4500, "Textiles", "Indigo", "Cotton"),
        ("Wool Throw", "Chunky knit throw blanket", 12000, "Textiles", "Grey", "Wool"),
    ];

    for (name, desc, cents, category, color, material) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, seller_id, name, description, price, category, color, material)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(seller_id)
        .bind(name)
        .bind(desc)
        .bind(Decimal::new(cents, 2))
        .bind(category)
        .bind(color)
        .bind(material)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
