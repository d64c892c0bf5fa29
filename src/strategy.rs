//! Ordered label lookup strategies.
//!
//! Strategies run from most to least precise: an explicit `<label>` is
//! the most reliable association, placeholder/aria-label next, and free
//! text proximity last because it is prone to false positives.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::driver::Page;
use crate::types::LocatorQuery;
use crate::waiter::{WaitOutcome, Waiter, visible_match};

/// One way of turning a human label into an element query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `<label>` containing the text, then the next control in document order
    LabelFollows,
    /// Control whose placeholder or aria-label contains the text
    AttributeContains,
    /// Any element containing the text, then the next control in document order
    TextProximity,
}

impl Strategy {
    /// Every strategy in priority order
    pub const ALL: [Strategy; 3] = [
        Strategy::LabelFollows,
        Strategy::AttributeContains,
        Strategy::TextProximity,
    ];

    /// Precision tier, 1 being the most precise
    pub fn tier(self) -> u8 {
        match self {
            Strategy::LabelFollows => 1,
            Strategy::AttributeContains => 2,
            Strategy::TextProximity => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Strategy::LabelFollows => "label-follows",
            Strategy::AttributeContains => "attribute-contains",
            Strategy::TextProximity => "text-proximity-follows",
        }
    }

    pub fn query(self, label: &str) -> LocatorQuery {
        match self {
            Strategy::LabelFollows => LocatorQuery::label_follows(label),
            Strategy::AttributeContains => LocatorQuery::attribute_contains(label),
            Strategy::TextProximity => LocatorQuery::text_proximity(label),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A visible element together with the strategy that found it
#[derive(Debug)]
pub struct Resolved<E> {
    pub element: E,
    pub strategy: Strategy,
}

/// Fixed-order list of strategies tried until one yields a visible match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyChain {
    strategies: Vec<Strategy>,
}

impl Default for StrategyChain {
    fn default() -> Self {
        StrategyChain {
            strategies: Strategy::ALL.to_vec(),
        }
    }
}

impl StrategyChain {
    /// Chain over `strategies`, tried in the given order
    pub fn new(strategies: impl IntoIterator<Item = Strategy>) -> Self {
        StrategyChain {
            strategies: strategies.into_iter().collect(),
        }
    }

    /// Try each strategy through `waiter`, each with a full timeout of its
    /// own. Returns `None` once every strategy is exhausted.
    pub async fn resolve<P: Page>(
        &self,
        page: &P,
        waiter: &Waiter,
        label: &str,
    ) -> Option<Resolved<P::Element>> {
        for &strategy in &self.strategies {
            let query = strategy.query(label);
            debug!("Trying {} for '{}'", strategy, label);

            match waiter.wait_for(|| visible_match(page, &query)).await {
                WaitOutcome::Found(element) => {
                    return Some(Resolved { element, strategy });
                }
                WaitOutcome::TimedOut { elapsed } => {
                    debug!("{} found nothing for '{}' in {:?}", strategy, label, elapsed);
                }
                WaitOutcome::Failed(e) => {
                    debug!("{} failed for '{}': {}", strategy, label, e);
                }
            }
        }
        None
    }
}
