use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum_pos_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool},
    dto::{auth::LoginRequest, orders::SubmitOrderRequest, products::CreateProductRequest},
    entity::orders::{ActiveModel as OrderActive, Entity as Orders},
    error::AppError,
    middleware::auth::AuthUser,
    models::OrderItem,
    services::{auth_service, order_service, product_service, report_service},
    state::{AppState, AuthKeys},
};
use chrono::{DateTime, Utc};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, Set, Statement};
use std::time::Duration;
use uuid::Uuid;

// Integration flow: staff login -> catalog -> submissions under both pricing
// modes -> ledger reads with a deleted product -> report windows and ranking.
#[tokio::test]
async fn order_ledger_and_reporting_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    let state = setup_state(&database_url).await?;

    // Login is case-insensitive on the username and trims whitespace.
    let user_id = create_user(&state, "cashier1", "Cashier One", "cashier123").await?;
    let login = auth_service::login(
        &state,
        LoginRequest {
            username: " CASHIER1 ".into(),
            password: "cashier123".into(),
        },
    )
    .await?;
    assert!(login.success);
    assert_eq!(login.id, user_id);
    assert_eq!(login.name, "Cashier One");
    assert_eq!(login.role, "cashier");
    assert!(!login.token.is_empty());

    let wrong = auth_service::login(
        &state,
        LoginRequest {
            username: "cashier1".into(),
            password: "wrong".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::InvalidCredentials)));

    let auth_user = AuthUser {
        user_id,
        name: "Cashier One".into(),
        role: "cashier".into(),
    };

    let espresso = product_service::create_product(
        &state,
        &auth_user,
        CreateProductRequest {
            name: "Espresso".into(),
            category: "Beverages".into(),
            price: Some(350),
        },
    )
    .await?;
    let muffin = product_service::create_product(
        &state,
        &auth_user,
        CreateProductRequest {
            name: "Blueberry Muffin".into(),
            category: "Bakery".into(),
            price: Some(395),
        },
    )
    .await?;

    // Hardened pricing: exact client arithmetic is accepted and the server's
    // own figures are persisted. 2 x 350 = 700, 8.25% tax = 58.
    let order = order_service::submit_order(
        &state,
        Some(&auth_user),
        SubmitOrderRequest {
            customer_name: Some("Walk-in".into()),
            items: vec![OrderItem {
                product_id: espresso.id,
                quantity: 2,
            }],
            subtotal: Some(700),
            tax: Some(58),
            total: Some(758),
        },
    )
    .await?;
    assert_eq!(order.subtotal, 700);
    assert_eq!(order.tax, 58);
    assert_eq!(order.total, 758);
    assert_eq!(order.status, "Open");
    assert_eq!(order.customer_name.as_deref(), Some("Walk-in"));
    assert_eq!(order.items.len(), 1);

    // A client total within the tolerance is accepted, but what lands in the
    // ledger is still the recomputed total.
    let tolerated = order_service::submit_order(
        &state,
        Some(&auth_user),
        SubmitOrderRequest {
            customer_name: None,
            items: vec![OrderItem {
                product_id: espresso.id,
                quantity: 2,
            }],
            subtotal: Some(700),
            tax: Some(57),
            total: Some(757),
        },
    )
    .await?;
    assert_eq!(tolerated.total, 758);
    assert!(order.created_at <= tolerated.created_at);

    // Beyond the tolerance the submission is rejected outright.
    let mismatch = order_service::submit_order(
        &state,
        Some(&auth_user),
        SubmitOrderRequest {
            customer_name: None,
            items: vec![OrderItem {
                product_id: espresso.id,
                quantity: 2,
            }],
            subtotal: Some(9000),
            tax: Some(999),
            total: Some(9999),
        },
    )
    .await;
    match mismatch {
        Err(AppError::PriceMismatch {
            submitted,
            computed,
        }) => {
            assert_eq!(submitted, 9999);
            assert_eq!(computed, 758);
        }
        other => panic!("expected PriceMismatch, got {other:?}"),
    }

    // Totals at the integer extremes are still a mismatch, never a panic.
    // validate_submission lets them through: i64::MIN + 0 == i64::MIN.
    let extreme = order_service::submit_order(
        &state,
        None,
        SubmitOrderRequest {
            customer_name: None,
            items: vec![OrderItem {
                product_id: espresso.id,
                quantity: 1,
            }],
            subtotal: Some(i64::MIN),
            tax: Some(0),
            total: Some(i64::MIN),
        },
    )
    .await;
    match extreme {
        Err(AppError::PriceMismatch {
            submitted,
            computed,
        }) => {
            assert_eq!(submitted, i64::MIN);
            assert_eq!(computed, 379);
        }
        other => panic!("expected PriceMismatch, got {other:?}"),
    }

    // Hardened pricing refuses ids the catalog has never seen.
    let unknown = order_service::submit_order(
        &state,
        None,
        SubmitOrderRequest {
            customer_name: None,
            items: vec![OrderItem {
                product_id: Uuid::new_v4(),
                quantity: 1,
            }],
            subtotal: Some(100),
            tax: Some(8),
            total: Some(108),
        },
    )
    .await;
    assert!(matches!(unknown, Err(AppError::BadRequest(_))));

    // A rejected submission leaves no trace in the ledger.
    let before = Orders::find().count(&state.orm).await?;
    let rejected = order_service::submit_order(
        &state,
        None,
        SubmitOrderRequest {
            customer_name: None,
            items: vec![],
            subtotal: Some(0),
            tax: Some(0),
            total: Some(0),
        },
    )
    .await;
    assert!(matches!(rejected, Err(AppError::BadRequest(_))));
    assert_eq!(Orders::find().count(&state.orm).await?, before);

    // Compatibility mode stores client totals verbatim, no catalog lookup.
    let mut trusting_config = state.config.clone();
    trusting_config.trust_client_totals = true;
    let trusting = AppState {
        pool: state.pool.clone(),
        orm: state.orm.clone(),
        auth: state.auth.clone(),
        config: trusting_config,
    };
    let verbatim = order_service::submit_order(
        &trusting,
        Some(&auth_user),
        SubmitOrderRequest {
            customer_name: None,
            items: vec![OrderItem {
                product_id: espresso.id,
                quantity: 1,
            }],
            subtotal: Some(100),
            tax: Some(8),
            total: Some(108),
        },
    )
    .await?;
    assert_eq!(verbatim.subtotal, 100);
    assert_eq!(verbatim.tax, 8);
    assert_eq!(verbatim.total, 108);

    // 3 x 395 = 1185, tax 98, total 1283.
    let muffin_order = order_service::submit_order(
        &state,
        Some(&auth_user),
        SubmitOrderRequest {
            customer_name: None,
            items: vec![OrderItem {
                product_id: muffin.id,
                quantity: 3,
            }],
            subtotal: Some(1185),
            tax: Some(98),
            total: Some(1283),
        },
    )
    .await?;
    assert_eq!(muffin_order.total, 1283);

    // 350 + 2 x 395 = 1140, tax 94, total 1234.
    let mixed = order_service::submit_order(
        &state,
        Some(&auth_user),
        SubmitOrderRequest {
            customer_name: None,
            items: vec![
                OrderItem {
                    product_id: espresso.id,
                    quantity: 1,
                },
                OrderItem {
                    product_id: muffin.id,
                    quantity: 2,
                },
            ],
            subtotal: Some(1140),
            tax: Some(94),
            total: Some(1234),
        },
    )
    .await?;
    assert_eq!(mixed.total, 1234);

    // Rewrite the first item row in place; its physical tuple now sits behind
    // the second one, so reads must not depend on tuple order.
    state
        .orm
        .execute(Statement::from_string(
            state.orm.get_database_backend(),
            format!(
                "UPDATE order_items SET quantity = quantity WHERE order_id = '{}' AND position = 0",
                mixed.id
            ),
        ))
        .await?;

    // Deleting a product must not disturb the ledger.
    product_service::delete_product(&state, &auth_user, muffin.id).await?;

    let orders = order_service::list_orders(&state).await?;
    assert_eq!(orders.len(), 5);
    assert_eq!(orders[0].id, order.id);
    for pair in orders.windows(2) {
        assert!(pair[0].created_at <= pair[1].created_at);
    }

    let first = orders
        .iter()
        .find(|o| o.id == order.id)
        .expect("first order listed");
    assert_eq!(
        first.items[0].product.as_ref().map(|p| p.id),
        Some(espresso.id)
    );

    let dangling = orders
        .iter()
        .find(|o| o.id == muffin_order.id)
        .expect("muffin order listed");
    assert_eq!(dangling.items[0].quantity, 3);
    assert!(dangling.items[0].product.is_none());
    assert_eq!(dangling.total, 1283);

    // Line items read back in submission order, rewritten rows included.
    let two_line = orders
        .iter()
        .find(|o| o.id == mixed.id)
        .expect("two-line order listed");
    assert_eq!(two_line.items.len(), 2);
    assert_eq!(two_line.items[0].product_id, espresso.id);
    assert_eq!(two_line.items[0].quantity, 1);
    assert_eq!(two_line.items[1].product_id, muffin.id);
    assert_eq!(two_line.items[1].quantity, 2);

    // Ranking drops the deleted product but keeps counting live ones:
    // espresso sold 2 + 2 + 1 + 1 = 6 units.
    let ranked = report_service::top_products(&state).await?;
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].id, espresso.id);
    assert_eq!(ranked[0].sales, 6);

    // A product with no sales still shows up, ranked last.
    let drip = product_service::create_product(
        &state,
        &auth_user,
        CreateProductRequest {
            name: "Drip Coffee".into(),
            category: "Beverages".into(),
            price: Some(275),
        },
    )
    .await?;
    let ranked = report_service::top_products(&state).await?;
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].id, espresso.id);
    assert_eq!(ranked[1].id, drip.id);
    assert_eq!(ranked[1].sales, 0);

    // A recomputed total that does not fit an i64 is rejected, not wrapped.
    let gold_bar = product_service::create_product(
        &state,
        &auth_user,
        CreateProductRequest {
            name: "Gold Bar".into(),
            category: "Bullion".into(),
            price: Some(i64::MAX),
        },
    )
    .await?;
    let out_of_range = order_service::submit_order(
        &state,
        None,
        SubmitOrderRequest {
            customer_name: None,
            items: vec![OrderItem {
                product_id: gold_bar.id,
                quantity: 2,
            }],
            subtotal: Some(i64::MAX),
            tax: Some(0),
            total: Some(i64::MAX),
        },
    )
    .await;
    match out_of_range {
        Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Order total is out of range."),
        other => panic!("expected BadRequest, got {other:?}"),
    }

    // The audit trail recorded the successful writes, not the rejections.
    let submits: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM audit_logs WHERE action = 'order_submit'")
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(submits.0, 5);
    let logins: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_logs WHERE action = 'login'")
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(logins.0, 1);
    let deletes: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM audit_logs WHERE action = 'product_delete'")
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(deletes.0, 1);

    // Window boundaries against rows stamped directly into the ledger: the
    // lower bound counts, the upper bound is the next window's problem.
    let (day_start, day_end) = report_service::day_window("2024-03-15T12:00:00Z".parse()?)?;
    insert_order_at(&state, 100, day_start).await?;
    insert_order_at(&state, 400, day_end - chrono::Duration::seconds(1)).await?;
    insert_order_at(&state, 200, day_end).await?;
    assert_eq!(
        report_service::window_total(&state, day_start, day_end).await?,
        500
    );

    let (march_start, march_end) = report_service::month_window("2024-03-15T12:00:00Z".parse()?)?;
    assert_eq!(
        report_service::window_total(&state, march_start, march_end).await?,
        700
    );

    // The leap day lands in the February window, not in March.
    insert_order_at(&state, 800, "2024-02-29T12:00:00Z".parse()?).await?;
    let (feb_start, feb_end) = report_service::month_window("2024-02-10T00:00:00Z".parse()?)?;
    assert_eq!(
        report_service::window_total(&state, feb_start, feb_end).await?,
        800
    );
    assert_eq!(
        report_service::window_total(&state, march_start, march_end).await?,
        700
    );

    // Live reports only see the current window; the backdated rows stay out.
    // 758 + 758 + 108 + 1283 + 1234 = 4141.
    let today = report_service::sales_today(&state).await?;
    assert_eq!(today.total, 4141);
    let month = report_service::sales_this_month(&state).await?;
    assert_eq!(month.total, 4141);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let timeout = Duration::from_secs(5);
    let pool = create_pool(database_url, timeout).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let orm = create_orm_conn(database_url, timeout).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, audit_logs, products, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_owned(),
        jwt_secret: "test-secret".to_owned(),
        host: "127.0.0.1".to_owned(),
        port: 0,
        tax_rate_bps: 825,
        total_tolerance_cents: 1,
        trust_client_totals: false,
        open_reads: false,
        store_timeout: timeout,
    };
    let auth = AuthKeys::from_secret(&config.jwt_secret);

    Ok(AppState {
        pool,
        orm,
        auth,
        config,
    })
}

async fn create_user(
    state: &AppState,
    username: &str,
    name: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, username, name, password_hash, role) VALUES ($1, $2, $3, $4, 'cashier')",
    )
    .bind(id)
    .bind(username)
    .bind(name)
    .bind(&password_hash)
    .execute(&state.pool)
    .await?;
    Ok(id)
}

async fn insert_order_at(state: &AppState, total: i64, at: DateTime<Utc>) -> anyhow::Result<Uuid> {
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_name: Set(None),
        subtotal: Set(total),
        tax: Set(0),
        total: Set(total),
        status: Set("Open".into()),
        created_at: Set(at.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(order.id)
}
