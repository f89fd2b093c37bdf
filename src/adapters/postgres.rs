//! PostgreSQL storage adapter.
//!
//! One pool, four repository implementations. Every multi-statement
//! contract runs inside an explicit transaction; dropping an uncommitted
//! transaction rolls it back, so an early `?` return (or a panic) can
//! never leave a partial write behind.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;

use crate::domain::{BalanceSummary, Order, OrderStatus, User, Withdrawal};
use crate::error::{GophermartError, Result};
use crate::repository::{
    BalanceRepository, OrderRepository, UserRepository, WithdrawalRepository,
};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        login TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS orders (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id),
        number TEXT UNIQUE NOT NULL,
        status TEXT NOT NULL,
        accrual DOUBLE PRECISION,
        uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS balances (
        user_id BIGINT PRIMARY KEY REFERENCES users(id),
        current DOUBLE PRECISION NOT NULL DEFAULT 0,
        withdrawn DOUBLE PRECISION NOT NULL DEFAULT 0
    )"#,
    r#"CREATE TABLE IF NOT EXISTS withdrawals (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id),
        order_number TEXT NOT NULL,
        sum DOUBLE PRECISION NOT NULL,
        processed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id, uploaded_at DESC)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_withdrawals_user
       ON withdrawals(user_id, processed_at DESC)"#,
];

/// PostgreSQL-backed storage facade.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connects to the database and bootstraps the schema.
    pub async fn connect(database_uri: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_uri)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        info!("connected to PostgreSQL");
        Ok(store)
    }

    /// Creates a store from an existing connection pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn init_schema(&self) -> Result<()> {
        for stmt in SCHEMA {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Bounded connectivity probe, run by the composition root at startup.
    pub async fn health_check(&self) -> Result<()> {
        tokio::time::timeout(
            HEALTH_CHECK_TIMEOUT,
            sqlx::query("SELECT 1").execute(&self.pool),
        )
        .await
        .map_err(|_| GophermartError::Internal("database ping timed out".into()))??;
        Ok(())
    }

    /// Closes the pool. Called last in the shutdown sequence.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn order_from_row(row: &PgRow) -> Result<Order> {
    let status: String = row.get("status");
    Ok(Order {
        id: row.get("id"),
        user_id: row.get("user_id"),
        number: row.get("number"),
        status: OrderStatus::try_from(status.as_str())
            .map_err(GophermartError::Internal)?,
        accrual: row.get("accrual"),
        uploaded_at: row.get("uploaded_at"),
        updated_at: row.get("updated_at"),
    })
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        login: row.get("login"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl UserRepository for PostgresStore {
    async fn create(&self, login: &str, password_hash: &str) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (login, password_hash)
            VALUES ($1, $2)
            RETURNING id, login, password_hash, created_at
            "#,
        )
        .bind(login)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                GophermartError::AlreadyExists
            } else {
                e.into()
            }
        })?;

        Ok(user_from_row(&row))
    }

    async fn get_by_login(&self, login: &str) -> Result<User> {
        let row = sqlx::query(
            r#"SELECT id, login, password_hash, created_at FROM users WHERE login = $1"#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(GophermartError::NotFound)?;

        Ok(user_from_row(&row))
    }

    async fn get_by_id(&self, id: i64) -> Result<User> {
        let row = sqlx::query(
            r#"SELECT id, login, password_hash, created_at FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(GophermartError::NotFound)?;

        Ok(user_from_row(&row))
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn create(&self, user_id: i64, number: &str) -> Result<(Order, bool)> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (user_id, number, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (number) DO NOTHING
            RETURNING id, user_id, number, status, accrual, uploaded_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(number)
        .bind(OrderStatus::New.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok((order_from_row(&row)?, true));
        }

        // Conflict on the number: idempotent re-upload for the owner,
        // a hard conflict for anyone else.
        let existing = self.get_by_number(number).await?;
        if existing.user_id != user_id {
            return Err(GophermartError::AlreadyExists);
        }
        Ok((existing, false))
    }

    async fn get_by_number(&self, number: &str) -> Result<Order> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, number, status, accrual, uploaded_at, updated_at
            FROM orders WHERE number = $1
            "#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(GophermartError::NotFound)?;

        order_from_row(&row)
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, number, status, accrual, uploaded_at, updated_at
            FROM orders WHERE user_id = $1 ORDER BY uploaded_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(order_from_row).collect()
    }

    async fn select_batch_for_processing(&self, limit: i64) -> Result<Vec<Order>> {
        let mut tx = self.pool.begin().await?;

        // SKIP LOCKED keeps concurrent claimants on disjoint row sets.
        let rows = sqlx::query(
            r#"
            UPDATE orders SET status = 'PROCESSING', updated_at = NOW()
            WHERE id IN (
                SELECT id FROM orders
                WHERE status IN ('NEW', 'PROCESSING')
                ORDER BY uploaded_at
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, user_id, number, status, accrual, uploaded_at, updated_at
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        rows.iter().map(order_from_row).collect()
    }

    async fn update_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        accrual: Option<f64>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(r#"SELECT user_id, status FROM orders WHERE id = $1 FOR UPDATE"#)
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(GophermartError::NotFound)?;

        let user_id: i64 = row.get("user_id");
        let previous: String = row.get("status");
        let previous = OrderStatus::try_from(previous.as_str())
            .map_err(GophermartError::Internal)?;

        sqlx::query(
            r#"UPDATE orders SET status = $1, accrual = $2, updated_at = NOW() WHERE id = $3"#,
        )
        .bind(status.as_str())
        .bind(accrual)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        // Credit exactly once, on the first transition into PROCESSED.
        if status == OrderStatus::Processed && previous != OrderStatus::Processed {
            if let Some(sum) = accrual.filter(|sum| *sum > 0.0) {
                sqlx::query(
                    r#"
                    INSERT INTO balances (user_id, current, withdrawn)
                    VALUES ($1, $2, 0)
                    ON CONFLICT (user_id) DO UPDATE
                    SET current = balances.current + EXCLUDED.current
                    "#,
                )
                .bind(user_id)
                .bind(sum)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl BalanceRepository for PostgresStore {
    async fn get_summary(&self, user_id: i64) -> Result<BalanceSummary> {
        let row = sqlx::query(r#"SELECT current, withdrawn FROM balances WHERE user_id = $1"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row
            .map(|r| BalanceSummary {
                current: r.get("current"),
                withdrawn: r.get("withdrawn"),
            })
            .unwrap_or_default())
    }

    async fn withdraw(&self, user_id: i64, order_number: &str, sum: f64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes debits with concurrent accrual credits.
        let current: f64 = sqlx::query(
            r#"SELECT current FROM balances WHERE user_id = $1 FOR UPDATE"#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|r| r.get("current"))
        .unwrap_or(0.0);

        if current < sum {
            return Err(GophermartError::InsufficientBalance);
        }

        sqlx::query(
            r#"
            INSERT INTO balances (user_id, current, withdrawn)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET current = balances.current - $2,
                withdrawn = balances.withdrawn + $3
            "#,
        )
        .bind(user_id)
        .bind(sum)
        .bind(sum)
        .execute(&mut *tx)
        .await?;

        sqlx::query(r#"INSERT INTO withdrawals (user_id, order_number, sum) VALUES ($1, $2, $3)"#)
            .bind(user_id)
            .bind(order_number)
            .bind(sum)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl WithdrawalRepository for PostgresStore {
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Withdrawal>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, order_number, sum, processed_at
            FROM withdrawals WHERE user_id = $1 ORDER BY processed_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| Withdrawal {
                id: r.get("id"),
                user_id: r.get("user_id"),
                order_number: r.get("order_number"),
                sum: r.get("sum"),
                processed_at: r.get("processed_at"),
            })
            .collect())
    }
}
