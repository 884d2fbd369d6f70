//! Host platform hooks (SDK readiness, leaderboard submission).
//!
//! The engine never sees these; a [`Session`](crate::session::Session) owns one
//! implementation chosen by the host at startup.

use log::{debug, info};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("platform sdk unavailable: {0}")]
    Unavailable(String),
}

pub trait PlatformCapabilities {
    fn name(&self) -> &str;

    /// One-time SDK setup. A failure is logged by the session and play continues.
    fn init(&mut self) -> Result<(), PlatformError> {
        Ok(())
    }

    /// Tell the host the game finished loading.
    fn signal_ready(&mut self) {}

    fn submit_score(&mut self, score: u64);
}

/// No SDK: logs calls and remembers submitted scores.
#[derive(Debug, Clone, Default)]
pub struct HeadlessPlatform {
    pub ready: bool,
    pub submitted: Vec<u64>,
}

impl PlatformCapabilities for HeadlessPlatform {
    fn name(&self) -> &str {
        "headless"
    }

    fn signal_ready(&mut self) {
        self.ready = true;
        debug!("headless platform ready");
    }

    fn submit_score(&mut self, score: u64) {
        info!("score submitted: {}", score);
        self.submitted.push(score);
    }
}
