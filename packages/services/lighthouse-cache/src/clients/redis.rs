use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::KeyValueBackend;
use crate::models::*;

/// Redis/Valkey backend. The connection is opened on first use and then shared by
/// every clone; reconnects are handled by the connection manager.
#[derive(Clone)]
pub struct RedisBackend {
    client: redis::Client,
    conn: Arc<OnceCell<ConnectionManager>>,
    connect_timeout: Duration,
}

impl RedisBackend {
    pub fn new(redis_url: &str, connect_timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| LighthouseError::Configuration(format!("Invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            conn: Arc::new(OnceCell::new()),
            connect_timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                match tokio::time::timeout(self.connect_timeout, self.client.get_connection_manager()).await {
                    Ok(Ok(conn)) => {
                        tracing::info!("Connected to key-value backend");
                        Ok(conn)
                    }
                    Ok(Err(e)) => Err(LighthouseError::Redis(e)),
                    Err(_) => Err(LighthouseError::BackendUnavailable(format!(
                        "connect timed out after {}ms",
                        self.connect_timeout.as_millis()
                    ))),
                }
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl KeyValueBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }
        cmd.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.connection().await?;
        // SET NX replies OK when the key was created and nil otherwise
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("DEL");
        for key in keys {
            cmd.arg(key);
        }
        cmd.query_async::<_, ()>(&mut conn).await?;
        tracing::debug!(key_count = keys.len(), "Deleted keys");
        Ok(())
    }
}
