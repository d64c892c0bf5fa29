//! Radio button selection by token.
//!
//! Radios on generated forms rarely carry stable ids, so each candidate
//! is scored on the text around it and its attributes. Matching is purely
//! lexical: resolving `male` has to reject a `female` option explicitly
//! because one contains the other.

use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::{ConflictTable, RadioConfig};
use crate::driver::{DriverResult, Element, Page};
use crate::errors::{DriverError, ProbeError};
use crate::types::LocatorQuery;

/// Progress of one disambiguation call. A failure at any point is
/// reported as the corresponding [`ProbeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RadioPhase {
    Scanning,
    Scoring,
    Selected,
    Clicked,
    Verified,
}

/// Lowercased text evidence gathered around a radio control
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evidence {
    pub parent_text: String,
    pub id: String,
    pub name: String,
    pub value: String,
}

impl Evidence {
    pub fn new(parent_text: &str, id: &str, name: &str, value: &str) -> Self {
        Evidence {
            parent_text: parent_text.to_lowercase(),
            id: id.to_lowercase(),
            name: name.to_lowercase(),
            value: value.to_lowercase(),
        }
    }

    fn fields(&self) -> [&str; 4] {
        [
            self.parent_text.as_str(),
            self.id.as_str(),
            self.name.as_str(),
            self.value.as_str(),
        ]
    }

    /// Some field mentions `token` and no field mentions any of
    /// `conflicts`. Arguments must already be lowercase.
    pub fn matches(&self, token: &str, conflicts: &[String]) -> bool {
        let fields = self.fields();
        let mentions_token = fields.iter().any(|f| f.contains(token));
        let mentions_conflict = fields
            .iter()
            .any(|f| conflicts.iter().any(|c| f.contains(c.as_str())));
        mentions_token && !mentions_conflict
    }
}

/// A radio control paired with its evidence, alive only while scoring
#[derive(Debug)]
pub struct MatchCandidate<E> {
    pub element: E,
    /// Position in page enumeration order
    pub index: usize,
    pub evidence: Evidence,
}

/// Which element finally took the click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickTarget {
    /// The radio input itself
    Control,
    /// Its immediate parent, used when the input is covered by a styled wrapper
    Parent,
}

/// At most one retry, and only against the parent
const CLICK_TARGETS: [ClickTarget; 2] = [ClickTarget::Control, ClickTarget::Parent];

/// A verified radio selection
#[derive(Debug)]
pub struct RadioSelection<E> {
    pub element: E,
    pub index: usize,
    pub evidence: Evidence,
    pub clicked: ClickTarget,
}

pub struct RadioDisambiguator<'p, P: Page> {
    page: &'p P,
    config: RadioConfig,
}

impl<'p, P: Page> RadioDisambiguator<'p, P> {
    pub fn new(page: &'p P, config: RadioConfig) -> Self {
        RadioDisambiguator { page, config }
    }

    pub fn conflicts(&self) -> &ConflictTable {
        &self.config.conflicts
    }

    /// Select the radio associated with `token` and return its handle
    pub async fn select_radio_by_token(&self, token: &str) -> Result<P::Element, ProbeError> {
        self.select(token).await.map(|selection| selection.element)
    }

    /// Scan, score, click and verify the radio for `token`
    pub async fn select(&self, token: &str) -> Result<RadioSelection<P::Element>, ProbeError> {
        let token = token.to_lowercase();

        enter(&token, RadioPhase::Scanning);
        let radios = self.page.find_all(&LocatorQuery::radio_inputs()).await?;
        if radios.is_empty() {
            return Err(ProbeError::NoRadiosFound);
        }
        debug!("Found {} radio control(s)", radios.len());

        enter(&token, RadioPhase::Scoring);
        let mut candidates = Vec::with_capacity(radios.len());
        for (index, element) in radios.into_iter().enumerate() {
            match gather_evidence(&element).await {
                Ok(evidence) => candidates.push(MatchCandidate {
                    element,
                    index,
                    evidence,
                }),
                Err(e) => debug!("Skipping radio #{}: {}", index, e),
            }
        }

        let conflicts = self.config.conflicts.conflicts_for(&token);
        let Some(position) = candidates
            .iter()
            .position(|c| c.evidence.matches(&token, conflicts))
        else {
            return Err(ProbeError::AmbiguousOrNotFound { token });
        };
        let chosen = candidates.swap_remove(position);

        enter(&token, RadioPhase::Selected);
        debug!("Chose radio #{} {:?}", chosen.index, chosen.evidence);

        let clicked = click_with_retry(&chosen.element, &token).await?;
        enter(&token, RadioPhase::Clicked);

        self.verify(&chosen, &candidates, &token).await?;
        enter(&token, RadioPhase::Verified);
        info!("Selected radio '{}' (#{})", token, chosen.index);

        Ok(RadioSelection {
            element: chosen.element,
            index: chosen.index,
            evidence: chosen.evidence,
            clicked,
        })
    }

    /// After the settle delay the chosen radio must read selected and no
    /// other radio of its group may
    async fn verify(
        &self,
        chosen: &MatchCandidate<P::Element>,
        others: &[MatchCandidate<P::Element>],
        token: &str,
    ) -> Result<(), ProbeError> {
        sleep(self.config.settle_delay).await;

        if !chosen.element.is_selected().await? {
            return Err(ProbeError::VerificationFailed {
                subject: format!("radio '{}'", token),
                expected: "selected".to_string(),
                actual: "not selected".to_string(),
            });
        }

        let group = &chosen.evidence.name;
        if group.is_empty() {
            return Ok(());
        }
        for other in others.iter().filter(|o| &o.evidence.name == group) {
            match other.element.is_selected().await {
                Ok(true) => {
                    return Err(ProbeError::VerificationFailed {
                        subject: format!("radio group '{}'", group),
                        expected: format!("only '{}' selected", token),
                        actual: format!("radio #{} also selected", other.index),
                    });
                }
                Ok(false) => {}
                Err(e) if e.is_transient() => debug!("Skipping radio #{}: {}", other.index, e),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

fn enter(token: &str, phase: RadioPhase) {
    debug!("Radio '{}': {:?}", token, phase);
}

async fn gather_evidence<E: Element>(element: &E) -> DriverResult<Evidence> {
    let parent_text = element.parent().await?.text().await?;
    let attr = |name: &'static str| async move {
        element.attribute(name).await.map(Option::unwrap_or_default)
    };

    Ok(Evidence::new(
        &parent_text,
        &attr("id").await?,
        &attr("name").await?,
        &attr("value").await?,
    ))
}

/// Click the control; if something covers it, click its parent once
async fn click_with_retry<E: Element>(element: &E, token: &str) -> Result<ClickTarget, ProbeError> {
    for target in CLICK_TARGETS {
        let result = match target {
            ClickTarget::Control => element.click().await,
            ClickTarget::Parent => element.parent().await?.click().await,
        };
        match result {
            Ok(()) => {
                debug!("Clicked radio '{}' via {:?}", token, target);
                return Ok(target);
            }
            Err(DriverError::ClickIntercepted(msg)) => {
                debug!("Click on {:?} intercepted: {}", target, msg);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(ProbeError::ClickInterceptedRetryExhausted {
        token: token.to_string(),
    })
}

#[cfg(test)]
#[path = "radio_test.rs"]
mod radio_test;
