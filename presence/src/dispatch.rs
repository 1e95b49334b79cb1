//! Fire-and-forget persona reactions

use presence_core::ReactionKind;
use std::sync::Weak;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::sync::{LoopInner, SyncLoop};

/// Routes reactions through the loop's adapter without waiting for them
///
/// Before the loop has finished initializing, and after it has been torn
/// down, dispatching is a silent no-op. Nothing is queued for later.
#[derive(Clone)]
pub struct ReactionDispatcher {
    target: Weak<LoopInner>,
}

impl ReactionDispatcher {
    pub fn new(sync: &SyncLoop) -> Self {
        Self {
            target: sync.downgrade(),
        }
    }

    /// Dispatch `kind`. Returns whether a call was actually issued.
    pub fn dispatch(&self, kind: ReactionKind) -> bool {
        let Some(inner) = self.target.upgrade() else {
            return false;
        };
        if !inner.ready() {
            debug!("Dropping {} reaction: persona sync not ready", kind);
            return false;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!("Dropping {} reaction: no async runtime", kind);
            return false;
        };

        runtime.spawn(async move {
            let outcome = inner.react(kind).await;
            debug!("Reaction {} settled: {:?}", kind, outcome);
        });
        true
    }
}
