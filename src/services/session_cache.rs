use crate::error::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;
use uuid::Uuid;

/// Maps a user id to the session token issued at login.
#[async_trait]
pub trait SessionCache: Send + Sync {
    async fn set(&self, user_id: Uuid, token: &str, ttl: Duration) -> Result<()>;
    async fn get(&self, user_id: Uuid) -> Result<Option<String>>;
    async fn delete(&self, user_id: Uuid) -> Result<()>;
}

#[derive(Clone)]
pub struct RedisSessionCache {
    redis: ConnectionManager,
}

impl RedisSessionCache {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

fn session_key(user_id: Uuid) -> String {
    format!("session:{}", user_id)
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    async fn set(&self, user_id: Uuid, token: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.redis.clone();
        redis::cmd("SET")
            .arg(session_key(user_id))
            .arg(token)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<String>> {
        let mut conn = self.redis.clone();
        let token = redis::cmd("GET")
            .arg(session_key(user_id))
            .query_async::<_, Option<String>>(&mut conn)
            .await?;
        Ok(token)
    }

    async fn delete(&self, user_id: Uuid) -> Result<()> {
        let mut conn = self.redis.clone();
        redis::cmd("DEL")
            .arg(session_key(user_id))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}
