use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use courier_common::Repository;
use courier_delivery::CampaignProcessor;
use tokio::sync::Mutex;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Repository>,
    pub processor: Arc<CampaignProcessor>,
    /// Serialises read-modify-write updates of the recipient list
    pub(crate) recipients: Arc<Mutex<()>>,
    campaign_running: Arc<AtomicBool>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Repository>, processor: Arc<CampaignProcessor>) -> Self {
        Self {
            store,
            processor,
            recipients: Arc::new(Mutex::new(())),
            campaign_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Claim the single campaign slot, if it is free
    pub(crate) fn begin_campaign(&self) -> Option<CampaignGuard> {
        self.campaign_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CampaignGuard(Arc::clone(&self.campaign_running)))
    }
}

/// Releases the campaign slot when dropped
pub(crate) struct CampaignGuard(Arc<AtomicBool>);

impl Drop for CampaignGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
