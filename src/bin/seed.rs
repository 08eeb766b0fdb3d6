use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum_pos_api::{config::AppConfig, db::create_pool};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.store_timeout).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    ensure_user(&pool, "admin", "System Admin", "admin123", "admin").await?;
    ensure_user(&pool, "cashier1", "Cashier One", "cashier123", "cashier").await?;
    ensure_user(&pool, "cashier2", "Cashier Two", "cashier234", "cashier").await?;
    seed_products(&pool).await?;

    println!("Seed completed.");
    Ok(())
}

/// Upsert a staff login; re-running the seed resets the password and role.
async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    name: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, name, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO UPDATE
        SET name = EXCLUDED.name,
            password_hash = EXCLUDED.password_hash,
            role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(name)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {username} (role={role})");
    Ok(row.0)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        ("Espresso", "Beverages", 350_i64),
        ("Cappuccino", "Beverages", 450),
        ("Drip Coffee", "Beverages", 275),
        ("Blueberry Muffin", "Bakery", 395),
        ("Butter Croissant", "Bakery", 425),
        ("Turkey Club", "Sandwiches", 899),
    ];

    for (name, category, price) in products {
        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        if existing.is_some() {
            continue;
        }
        sqlx::query("INSERT INTO products (id, name, category, price) VALUES ($1, $2, $3, $4)")
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(category)
            .bind(price)
            .execute(pool)
            .await?;
    }

    println!("Seeded products");
    Ok(())
}
