//! Region bindings
//!
//! Small wrappers that tie one host region to a running engine. Each binding
//! owns its subscription and cancels it when detached or dropped.

use std::sync::Arc;

use contracts::{OffsetCallback, SharedRegion};

use crate::error::EngineError;
use crate::handle::{CancelHandle, EngineHandle};

/// Region that both leads and follows.
///
/// Offsets broadcast by other regions are written back to this region. The
/// host forwards its native scroll notifications through
/// [`on_scroll`](Self::on_scroll) and [`on_scroll_end`](Self::on_scroll_end).
pub struct ScrollSyncBinding {
    handle: EngineHandle,
    region: SharedRegion,
    cancel: CancelHandle,
}

impl ScrollSyncBinding {
    pub async fn attach(handle: &EngineHandle, region: SharedRegion) -> Result<Self, EngineError> {
        let cancel = handle
            .subscribe_continuous(Arc::clone(&region), writer(&region, 1.0))
            .await?;
        Ok(Self {
            handle: handle.clone(),
            region,
            cancel,
        })
    }

    /// Host reported a scroll event on this region.
    pub fn on_scroll(&self) -> Result<(), EngineError> {
        self.handle.publish(Arc::clone(&self.region))
    }

    /// Host reported the end of a scroll gesture on this region.
    pub fn on_scroll_end(&self) -> Result<(), EngineError> {
        self.handle.publish_settle(Arc::clone(&self.region))
    }

    pub fn region(&self) -> &SharedRegion {
        &self.region
    }

    /// Cancel the subscription now instead of on drop.
    pub fn detach(mut self) -> Result<(), EngineError> {
        self.cancel.cancel()
    }
}

impl Drop for ScrollSyncBinding {
    fn drop(&mut self) {
        let _ = self.cancel.cancel();
    }
}

/// Region that only follows, scaled by `scroll_speed`.
///
/// A speed of 0.5 makes a background layer move at half the leader's pace.
pub struct FollowerBinding {
    region: SharedRegion,
    scroll_speed: f64,
    cancel: CancelHandle,
}

impl FollowerBinding {
    pub const DEFAULT_SCROLL_SPEED: f64 = 1.0;

    pub async fn attach(
        handle: &EngineHandle,
        region: SharedRegion,
        scroll_speed: f64,
    ) -> Result<Self, EngineError> {
        let cancel = handle
            .subscribe_continuous(Arc::clone(&region), writer(&region, scroll_speed))
            .await?;
        Ok(Self {
            region,
            scroll_speed,
            cancel,
        })
    }

    pub fn region(&self) -> &SharedRegion {
        &self.region
    }

    pub fn scroll_speed(&self) -> f64 {
        self.scroll_speed
    }

    pub fn detach(mut self) -> Result<(), EngineError> {
        self.cancel.cancel()
    }
}

impl Drop for FollowerBinding {
    fn drop(&mut self) {
        let _ = self.cancel.cancel();
    }
}

/// Settle notification for one region.
///
/// `callback` fires once per gesture this region led, with its final offset.
#[derive(Debug)]
pub struct SettleBinding {
    cancel: CancelHandle,
}

impl SettleBinding {
    pub async fn attach(
        handle: &EngineHandle,
        region: SharedRegion,
        callback: impl FnMut(f64) + Send + 'static,
    ) -> Result<Self, EngineError> {
        let cancel = handle.subscribe_settle(region, Box::new(callback)).await?;
        Ok(Self { cancel })
    }

    pub fn detach(mut self) -> Result<(), EngineError> {
        self.cancel.cancel()
    }
}

impl Drop for SettleBinding {
    fn drop(&mut self) {
        let _ = self.cancel.cancel();
    }
}

fn writer(region: &SharedRegion, scroll_speed: f64) -> OffsetCallback {
    let target = Arc::clone(region);
    Box::new(move |offset| target.set_scroll_left(offset * scroll_speed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::EngineRuntime;
    use crate::mock::MockRegion;
    use contracts::{EngineConfig, ScrollRegion};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::sleep;

    fn config() -> EngineConfig {
        EngineConfig {
            frame_interval_ms: 2,
            settle_grace_ms: 10,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_bound_regions_follow_each_other() {
        let runtime = EngineRuntime::spawn(config());
        let handle = runtime.handle();
        let a = Arc::new(MockRegion::with_id("a"));
        let b = Arc::new(MockRegion::with_id("b"));
        let parallax = Arc::new(MockRegion::with_id("parallax"));

        let binding_a = ScrollSyncBinding::attach(&handle, a.clone()).await.unwrap();
        let _binding_b = ScrollSyncBinding::attach(&handle, b.clone()).await.unwrap();
        let _follower = FollowerBinding::attach(&handle, parallax.clone(), 0.5)
            .await
            .unwrap();

        a.scroll_to(200.0);
        binding_a.on_scroll().unwrap();
        binding_a.on_scroll_end().unwrap();
        sleep(Duration::from_millis(60)).await;

        assert_eq!(b.scroll_left(), 200.0);
        assert_eq!(parallax.scroll_left(), 100.0);
        // Leader is never written back
        assert_eq!(a.writes(), 0);

        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_drop_cancels_subscription() {
        let runtime = EngineRuntime::spawn(config());
        let handle = runtime.handle();
        let region = Arc::new(MockRegion::with_id("a"));

        let binding = ScrollSyncBinding::attach(&handle, region.clone()).await.unwrap();
        let settle = SettleBinding::attach(&handle, region.clone(), |_| {})
            .await
            .unwrap();
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.continuous_subscribers, 1);
        assert_eq!(snapshot.settle_subscribers, 1);

        drop(binding);
        settle.detach().unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.continuous_subscribers, 0);
        assert_eq!(snapshot.settle_subscribers, 0);

        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_settle_binding_receives_final_offset() {
        let runtime = EngineRuntime::spawn(config());
        let handle = runtime.handle();
        let region = Arc::new(MockRegion::with_id("a"));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let _settle = SettleBinding::attach(&handle, region.clone(), move |offset| {
            sink.lock().unwrap().push(offset)
        })
        .await
        .unwrap();

        region.scroll_to(42.0);
        handle.publish_settle(region.clone()).unwrap();
        sleep(Duration::from_millis(60)).await;

        assert_eq!(*seen.lock().unwrap(), vec![42.0]);

        runtime.shutdown().await.unwrap();
    }
}
