use async_trait::async_trait;
use std::time::Duration;

/// Source of delays for the periodic tasks.
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    async fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    async fn sleep(&self, duration: Duration) {
        async_std::task::sleep(duration).await
    }
}
