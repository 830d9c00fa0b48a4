//! In-process focus arbitration.

use bridge_traits::{FocusArbiter, FocusChange, FocusGain, FocusListener, FocusRequest, FocusToken, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

struct Holder {
    id: u64,
    request: FocusRequest,
    listener: Arc<dyn FocusListener>,
}

impl Holder {
    /// A call in progress cannot be interrupted by other usages.
    fn blocks(&self, request: &FocusRequest) -> bool {
        self.request.usage.is_communication()
            && self.request.gain == FocusGain::Gain
            && !request.usage.is_communication()
    }
}

type Delivery = Vec<(Arc<dyn FocusListener>, FocusChange)>;

/// [`FocusArbiter`] for sessions sharing one process.
///
/// Holders form a stack. A permanent request evicts every holder; a
/// transient request suspends the top one, which regains focus when the
/// transient holder abandons.
pub struct LocalFocusArbiter {
    stack: Mutex<Vec<Holder>>,
    next_id: AtomicU64,
}

impl LocalFocusArbiter {
    pub fn new() -> Self {
        Self {
            stack: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn holder_count(&self) -> usize {
        self.stack.lock().len()
    }

    fn deliver(delivery: Delivery) {
        for (listener, change) in delivery {
            listener.on_focus_change(change);
        }
    }
}

impl Default for LocalFocusArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusArbiter for LocalFocusArbiter {
    fn request_focus(
        &self,
        request: &FocusRequest,
        listener: Arc<dyn FocusListener>,
    ) -> Result<Option<FocusToken>> {
        let mut delivery = Delivery::new();
        let id = {
            let mut stack = self.stack.lock();

            if let Some(top) = stack.last() {
                if top.blocks(request) {
                    info!(usage = %request.usage, holder = %top.request.usage, "focus denied");
                    return Ok(None);
                }
            }

            match request.gain {
                FocusGain::Gain => {
                    delivery.extend(
                        stack
                            .drain(..)
                            .map(|holder| (holder.listener, FocusChange::LostPermanent)),
                    );
                }
                FocusGain::GainTransient | FocusGain::GainTransientMayDuck => {
                    let change = if request.gain == FocusGain::GainTransientMayDuck {
                        FocusChange::LostTransientCanDuck
                    } else {
                        FocusChange::LostTransient
                    };
                    if let Some(top) = stack.last() {
                        delivery.push((Arc::clone(&top.listener), change));
                    }
                }
            }

            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            stack.push(Holder {
                id,
                request: request.clone(),
                listener,
            });
            id
        };

        debug!(token = id, usage = %request.usage, gain = ?request.gain, "focus granted");
        Self::deliver(delivery);
        Ok(Some(FocusToken::new(id)))
    }

    fn abandon_focus(&self, token: FocusToken) {
        let mut delivery = Delivery::new();
        {
            let mut stack = self.stack.lock();
            let Some(position) = stack.iter().position(|holder| holder.id == token.id()) else {
                debug!(token = token.id(), "abandon of unknown focus token");
                return;
            };

            let was_top = position + 1 == stack.len();
            stack.remove(position);
            if was_top {
                if let Some(next) = stack.last() {
                    delivery.push((Arc::clone(&next.listener), FocusChange::Gained));
                }
            }
        }

        debug!(token = token.id(), "focus abandoned");
        Self::deliver(delivery);
    }
}
