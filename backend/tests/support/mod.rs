//! Shared helpers for integration tests that need PostgreSQL.
//!
//! Each test provisions its own database on the embedded cluster and drives
//! the async adapters from a dedicated Tokio runtime. Cluster bootstrap is
//! synchronous and must run outside any runtime, so tests stay plain `#[test]`
//! functions and block on their async bodies.

pub mod cluster_skip;
pub mod embedded_postgres;

use std::future::Future;

use pg_embedded_setup_unpriv::TemporaryDatabase;
use recipe_backend::domain::ports::{NewUser, UserRepository};
use recipe_backend::domain::{EmailAddress, PasswordHash, User, UserId, UserName};
use recipe_backend::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
use tokio::runtime::Runtime;
use uuid::Uuid;

pub use cluster_skip::handle_cluster_setup_failure;
use embedded_postgres::{provision_database, shared_cluster};

/// A migrated database owned by one test, with a pool and runtime to drive it.
///
/// Fields drop in order: the pool closes its connections while the runtime is
/// still alive, then the database itself is dropped.
pub struct TestDatabase {
    pub pool: DbPool,
    runtime: Runtime,
    _database: TemporaryDatabase,
}

impl TestDatabase {
    fn setup() -> Result<Self, String> {
        let runtime = Runtime::new().map_err(|err| err.to_string())?;
        let cluster = shared_cluster()?;
        let database = provision_database(cluster)?;
        let config = PoolConfig::new(database.url())
            .with_max_size(2)
            .with_min_idle(Some(1));
        let pool = runtime
            .block_on(DbPool::new(config))
            .map_err(|err| err.to_string())?;
        Ok(Self {
            pool,
            runtime,
            _database: database,
        })
    }

    /// Run an async test body to completion.
    pub fn run<F: Future>(&self, body: F) -> F::Output {
        self.runtime.block_on(body)
    }
}

/// Database for one test, or `None` when `SKIP_TEST_CLUSTER` allows skipping
/// an unavailable cluster.
pub fn test_database() -> Option<TestDatabase> {
    match TestDatabase::setup() {
        Ok(database) => Some(database),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

/// Register a fresh account with a unique email so tests never collide.
pub async fn new_owner(pool: &DbPool) -> User {
    let users = DieselUserRepository::new(pool.clone());
    let email = format!("cook-{}@example.com", Uuid::new_v4().simple());
    users
        .insert(&NewUser {
            id: UserId::random(),
            email: EmailAddress::new(email).expect("valid email"),
            name: UserName::new("Integration Cook").expect("valid name"),
            password_hash: PasswordHash::from_stored("not-a-real-hash"),
        })
        .await
        .expect("owner inserted")
}
