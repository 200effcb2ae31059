//! One ticker subsystem per document.

use hashbrown::HashMap;

use crate::config::TickerOptions;
use crate::dom::Document;
use crate::ids::ElementId;

use super::Ticker;

/// Holds the active [`Ticker`], if any. Activating twice reconfigures and
/// rebuilds the existing one instead of stacking a second loop on the same
/// containers.
#[derive(Debug, Default)]
pub struct TickerRegistry {
    current: Option<Ticker>,
    /// Original children kept across destroy/activate cycles so a
    /// container is never captured while it still holds a built strip.
    originals: HashMap<ElementId, Vec<ElementId>>,
}

impl TickerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&mut self, doc: &mut dyn Document, options: TickerOptions) -> &mut Ticker {
        let ticker = match self.current.take() {
            Some(mut ticker) => {
                ticker.update_options(options);
                ticker.refresh(doc);
                ticker
            }
            None => {
                let mut ticker = Ticker::with_originals(options, std::mem::take(&mut self.originals));
                ticker.init(doc);
                ticker
            }
        };
        self.current.insert(ticker)
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn get(&self) -> Option<&Ticker> {
        self.current.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut Ticker> {
        self.current.as_mut()
    }

    /// Destroys and unregisters the active ticker.
    pub fn destroy(&mut self, doc: &mut dyn Document, reset_visual_state: bool) {
        if let Some(mut ticker) = self.current.take() {
            ticker.destroy(doc, reset_visual_state);
            self.originals = ticker.take_originals();
        }
    }
}
