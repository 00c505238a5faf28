//! Connection Pool for request/response services

use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::{debug, info};

use crate::{Result, StoreConfig, StoreError};

/// Pooled store connections
#[derive(Clone)]
pub struct StorePool {
    pool: Pool,
}

impl StorePool {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        info!(max_size = config.max_size, "Creating store connection pool");

        let pg_config = config.pg_config()?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = Manager::from_config(pg_config, NoTls, manager_config);

        let pool = Pool::builder(manager)
            .max_size(config.max_size)
            .runtime(Runtime::Tokio1)
            .create_timeout(config.connect_timeout)
            .wait_timeout(config.connect_timeout)
            .build()
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        debug!("Store pool created successfully");

        Ok(Self { pool })
    }

    pub async fn get(&self) -> Result<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }

    pub async fn is_healthy(&self) -> bool {
        match self.pool.get().await {
            Ok(conn) => conn.simple_query("SELECT 1").await.is_ok(),
            Err(_) => false,
        }
    }
}
