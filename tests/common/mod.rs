//! Shared test fixtures: in-memory repositories behind the storage seam,
//! a scripted accrual provider, and a real listening server.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};

use gophermart::adapters::AccrualProvider;
use gophermart::api::{self, AppState};
use gophermart::auth::{PasswordHasher, TokenService};
use gophermart::domain::{
    AccrualResult, BalanceSummary, Order, OrderStatus, User, Withdrawal,
};
use gophermart::error::{GophermartError, Result};
use gophermart::repository::{
    BalanceRepository, OrderRepository, UserRepository, WithdrawalRepository,
};
use gophermart::usecase::{AuthUseCase, BalanceUseCase, OrderUseCase};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    orders: Vec<Order>,
    balances: HashMap<i64, BalanceSummary>,
    withdrawals: Vec<Withdrawal>,
}

/// In-memory stand-in for the PostgreSQL store. One mutex plays the role
/// of the row locks: every repository contract runs under it atomically.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_by_number(&self, number: &str) -> Option<Order> {
        self.inner
            .lock()
            .await
            .orders
            .iter()
            .find(|o| o.number == number)
            .cloned()
    }

    pub async fn balance_of(&self, user_id: i64) -> BalanceSummary {
        self.inner
            .lock()
            .await
            .balances
            .get(&user_id)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, login: &str, password_hash: &str) -> Result<User> {
        let mut inner = self.inner.lock().await;
        if inner.users.iter().any(|u| u.login == login) {
            return Err(GophermartError::AlreadyExists);
        }
        let user = User {
            id: inner.users.len() as i64 + 1,
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn get_by_login(&self, login: &str) -> Result<User> {
        self.inner
            .lock()
            .await
            .users
            .iter()
            .find(|u| u.login == login)
            .cloned()
            .ok_or(GophermartError::NotFound)
    }

    async fn get_by_id(&self, id: i64) -> Result<User> {
        self.inner
            .lock()
            .await
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(GophermartError::NotFound)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create(&self, user_id: i64, number: &str) -> Result<(Order, bool)> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner.orders.iter().find(|o| o.number == number) {
            if existing.user_id != user_id {
                return Err(GophermartError::AlreadyExists);
            }
            return Ok((existing.clone(), false));
        }
        let order = Order {
            id: inner.orders.len() as i64 + 1,
            user_id,
            number: number.to_string(),
            status: OrderStatus::New,
            accrual: None,
            uploaded_at: Utc::now(),
            updated_at: Utc::now(),
        };
        inner.orders.push(order.clone());
        Ok((order, true))
    }

    async fn get_by_number(&self, number: &str) -> Result<Order> {
        self.order_by_number(number)
            .await
            .ok_or(GophermartError::NotFound)
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Order>> {
        let inner = self.inner.lock().await;
        let mut result: Vec<Order> = inner
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(result)
    }

    async fn select_batch_for_processing(&self, limit: i64) -> Result<Vec<Order>> {
        let mut inner = self.inner.lock().await;
        let mut leased = Vec::new();
        let mut ids: Vec<i64> = inner
            .orders
            .iter()
            .filter(|o| !o.status.is_terminal())
            .map(|o| o.id)
            .collect();
        ids.truncate(limit as usize);
        for id in ids {
            let order = inner.orders.iter_mut().find(|o| o.id == id).unwrap();
            order.status = OrderStatus::Processing;
            order.updated_at = Utc::now();
            leased.push(order.clone());
        }
        Ok(leased)
    }

    async fn update_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        accrual: Option<f64>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let (user_id, previous) = {
            let order = inner
                .orders
                .iter_mut()
                .find(|o| o.id == order_id)
                .ok_or(GophermartError::NotFound)?;
            let previous = order.status;
            order.status = status;
            order.accrual = accrual;
            order.updated_at = Utc::now();
            (order.user_id, previous)
        };

        // Same guard as the production store: credit only on the first
        // transition into PROCESSED.
        if status == OrderStatus::Processed && previous != OrderStatus::Processed {
            if let Some(sum) = accrual.filter(|sum| *sum > 0.0) {
                let balance = inner.balances.entry(user_id).or_default();
                balance.current += sum;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BalanceRepository for MemoryStore {
    async fn get_summary(&self, user_id: i64) -> Result<BalanceSummary> {
        Ok(self.balance_of(user_id).await)
    }

    async fn withdraw(&self, user_id: i64, order_number: &str, sum: f64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let current = inner
            .balances
            .get(&user_id)
            .map(|b| b.current)
            .unwrap_or(0.0);
        if current < sum {
            return Err(GophermartError::InsufficientBalance);
        }

        let balance = inner.balances.entry(user_id).or_default();
        balance.current -= sum;
        balance.withdrawn += sum;

        let withdrawal = Withdrawal {
            id: inner.withdrawals.len() as i64 + 1,
            user_id,
            order_number: order_number.to_string(),
            sum,
            processed_at: Utc::now(),
        };
        inner.withdrawals.push(withdrawal);
        Ok(())
    }
}

#[async_trait]
impl WithdrawalRepository for MemoryStore {
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Withdrawal>> {
        let inner = self.inner.lock().await;
        let mut result: Vec<Withdrawal> = inner
            .withdrawals
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.processed_at.cmp(&a.processed_at));
        Ok(result)
    }
}

/// Accrual provider answering from a per-order script. An exhausted or
/// missing script reports `OrderNotRegistered`, like the real service
/// before the calculator picks an order up.
#[derive(Default)]
pub struct ScriptedAccrual {
    scripts: Mutex<HashMap<String, VecDeque<Result<AccrualResult>>>>,
}

impl ScriptedAccrual {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, number: &str, outcome: Result<AccrualResult>) {
        self.scripts
            .lock()
            .await
            .entry(number.to_string())
            .or_default()
            .push_back(outcome);
    }

    pub async fn push_processed(&self, number: &str, accrual: f64) {
        self.push(
            number,
            Ok(AccrualResult {
                order: number.to_string(),
                status: gophermart::domain::AccrualStatus::Processed,
                accrual: Some(accrual),
            }),
        )
        .await;
    }
}

#[async_trait]
impl AccrualProvider for ScriptedAccrual {
    async fn fetch(&self, number: &str) -> Result<AccrualResult> {
        self.scripts
            .lock()
            .await
            .get_mut(number)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Err(GophermartError::OrderNotRegistered))
    }
}

/// A gophermart instance listening on an OS-assigned port, backed by the
/// in-memory store.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub orders: Arc<OrderUseCase>,
    pub accruals: Arc<ScriptedAccrual>,
    shutdown: watch::Sender<bool>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        let accruals = Arc::new(ScriptedAccrual::new());

        let auth = Arc::new(AuthUseCase::new(
            store.clone(),
            PasswordHasher::new(4),
            TokenService::new("integration-test-secret", None),
        ));
        let orders = Arc::new(OrderUseCase::new(store.clone()));
        let balance = Arc::new(BalanceUseCase::new(store.clone(), store.clone()));

        let router = api::create_router(AppState::new(auth, orders.clone(), balance));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown, shutdown_rx) = watch::channel(false);
        tokio::spawn(api::server::serve(listener, router, shutdown_rx));

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            store,
            orders,
            accruals,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Registers a user and returns the bearer token from the response.
    pub async fn register(&self, login: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/user/register"))
            .json(&serde_json::json!({"login": login, "password": password}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        bearer_token(&response)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

/// Extracts the token from the `Authorization: Bearer <t>` response header.
pub fn bearer_token(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .expect("response carries a bearer token")
        .to_string()
}
