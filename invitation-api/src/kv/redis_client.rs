use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError};
use tokio::time::timeout;

use super::{Client, StoreError};

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else {
            StoreError::Unavailable(err.to_string())
        }
    }
}

/// Redis-backed store. The multiplexed connection is cheap to clone, so each
/// call takes its own handle.
pub struct RedisClient {
    connection: MultiplexedConnection,
    op_timeout: Duration,
}

impl RedisClient {
    pub async fn new(addr: String, op_timeout: Duration) -> Result<RedisClient, StoreError> {
        let client = redis::Client::open(addr)?;
        let connection = run_with_timeout(op_timeout, client.get_multiplexed_async_connection())
            .await?;

        Ok(RedisClient {
            connection,
            op_timeout,
        })
    }
}

async fn run_with_timeout<T, F>(op_timeout: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, RedisError>>,
{
    match timeout(op_timeout, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(StoreError::Timeout),
    }
}

#[async_trait]
impl Client for RedisClient {
    async fn get(&self, k: String) -> Result<String, StoreError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = run_with_timeout(self.op_timeout, conn.get(k)).await?;
        value.ok_or(StoreError::NotFound)
    }

    async fn set(&self, k: String, v: String) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        run_with_timeout(self.op_timeout, conn.set::<_, _, ()>(k, v)).await
    }

    async fn keys(&self, prefix: String) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection.clone();
        run_with_timeout(self.op_timeout, conn.keys(format!("{prefix}*"))).await
    }

    async fn incr(&self, k: String) -> Result<i64, StoreError> {
        let mut conn = self.connection.clone();
        run_with_timeout(self.op_timeout, conn.incr(k, 1)).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _pong: String = run_with_timeout(
            self.op_timeout,
            redis::cmd("PING").query_async(&mut conn),
        )
        .await?;
        Ok(())
    }
}
