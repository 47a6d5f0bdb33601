use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use bakehouse_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_profile(&pool, "admin@bakehouse.test", "admin123!", "admin").await?;
    let customer_id =
        ensure_profile(&pool, "customer@bakehouse.test", "customer123!", "customer").await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_profile(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO profiles (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let profile_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM profiles WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured profile {email} (role={role})");
    Ok(profile_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        (
            "Sandwich Loaf",
            "Soft white loaf, great for sandwiches",
            11.00,
            3.85,
            "Sandwich Breads",
            24,
        ),
        (
            "Country Sourdough",
            "Naturally leavened, 48 hour ferment",
            14.00,
            4.20,
            "Sourdough",
            48,
        ),
        (
            "Baguette",
            "Crisp crust, baked every morning",
            16.00,
            4.00,
            "French Breads",
            24,
        ),
        (
            "Cinnamon Rolls (6 pack)",
            "Cream cheese frosting included",
            18.00,
            6.50,
            "Pastries",
            24,
        ),
        (
            "Challah",
            "Braided egg bread, weekend bake",
            13.00,
            4.10,
            "Enriched Breads",
            72,
        ),
    ];

    for (name, desc, price, cost, category, lead_time) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, cost, category, lead_time_hours)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(cost)
        .bind(category)
        .bind(lead_time)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
