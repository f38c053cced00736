// src/collect/mod.rs
pub mod extract;
pub mod portal;

use crate::announcement::AnnouncementRecord;
use crate::error::CollectorError;

pub use portal::PortalCollector;

/// Source of candidate announcements for one run.
///
/// An empty list means "nothing found" or "disabled by configuration"; the
/// tracker treats both the same.
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    async fn fetch(&self) -> Result<Vec<AnnouncementRecord>, CollectorError>;
    fn name(&self) -> &'static str;
}
