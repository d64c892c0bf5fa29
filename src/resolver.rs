use tracing::{debug, info};

use crate::driver::{Element, Page};
use crate::errors::ProbeError;
use crate::strategy::{Resolved, StrategyChain};
use crate::waiter::Waiter;

/// Locates form controls by their human-readable label
pub struct FieldResolver<'p, P: Page> {
    page: &'p P,
    chain: StrategyChain,
    waiter: Waiter,
}

impl<'p, P: Page> FieldResolver<'p, P> {
    pub fn new(page: &'p P, waiter: Waiter) -> Self {
        FieldResolver {
            page,
            chain: StrategyChain::default(),
            waiter,
        }
    }

    pub fn with_chain(mut self, chain: StrategyChain) -> Self {
        self.chain = chain;
        self
    }

    /// Resolve `label` to a visible control.
    ///
    /// Fails with [`ProbeError::FieldNotFound`] once every strategy has
    /// used up its timeout. Callers should not retry that error.
    pub async fn resolve(&self, label: &str) -> Result<P::Element, ProbeError> {
        self.resolve_with_strategy(label)
            .await
            .map(|resolved| resolved.element)
    }

    /// Like [`Self::resolve`], also reporting which strategy matched
    pub async fn resolve_with_strategy(
        &self,
        label: &str,
    ) -> Result<Resolved<P::Element>, ProbeError> {
        match self.chain.resolve(self.page, &self.waiter, label).await {
            Some(resolved) => {
                info!("Resolved '{}' via {}", label, resolved.strategy);
                Ok(resolved)
            }
            None => Err(ProbeError::FieldNotFound {
                label: label.to_string(),
            }),
        }
    }

    /// Resolve `label`, replace its contents with `text`, and check the
    /// control now holds exactly `text`
    pub async fn fill_field(&self, label: &str, text: &str) -> Result<P::Element, ProbeError> {
        let element = self.resolve(label).await?;

        element.clear().await?;
        element.send_keys(text).await?;

        let actual = read_value(&element).await?;
        debug!("Read back '{}' from '{}'", actual, label);
        if actual != text {
            return Err(ProbeError::VerificationFailed {
                subject: format!("field '{}'", label),
                expected: format!("'{}'", text),
                actual: format!("'{}'", actual),
            });
        }

        Ok(element)
    }
}

/// Current value of a form control
pub async fn read_value<E: Element>(element: &E) -> Result<String, ProbeError> {
    Ok(element.property("value").await?.unwrap_or_default())
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod resolver_test;
