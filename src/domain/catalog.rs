use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::errors::{DomainError, DomainResult};
use super::models::{Deal, DealDraft, Identity, Session};
use super::validation::validate_draft;

/// The deal collection shown by the storefront and edited by admins.
///
/// Deals live in a shared slice that is replaced, never mutated in place, so
/// each edit gives readers a new collection identity.
#[derive(Debug, Clone)]
pub struct Catalog {
    deals: Arc<[Deal]>,
}

impl Catalog {
    pub fn new(deals: Vec<Deal>) -> Self {
        Self {
            deals: deals.into(),
        }
    }

    pub fn deals(&self) -> &Arc<[Deal]> {
        &self.deals
    }

    pub fn len(&self) -> usize {
        self.deals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Deal> {
        self.deals.iter().find(|deal| deal.id == id)
    }

    /// Adds a new deal with a fresh id and no sales.
    pub fn create(&mut self, session: &Session, draft: DealDraft) -> DomainResult<Deal> {
        let actor = authorize(session)?;
        validate_draft(&draft)?;

        let deal = Deal::from_draft(Uuid::new_v4().to_string(), 0, draft);
        let mut deals = self.deals.to_vec();
        deals.push(deal.clone());
        self.deals = deals.into();

        info!(deal_id = %deal.id, admin = %actor.email, "created deal");
        Ok(deal)
    }

    /// Replaces a deal's content, keeping its id and sold count.
    pub fn update(&mut self, session: &Session, id: &str, draft: DealDraft) -> DomainResult<Deal> {
        let actor = authorize(session)?;
        validate_draft(&draft)?;

        let mut deals = self.deals.to_vec();
        let slot = deals
            .iter_mut()
            .find(|deal| deal.id == id)
            .ok_or_else(|| DomainError::DealNotFound(id.to_string()))?;
        *slot = Deal::from_draft(slot.id.clone(), slot.sold_count, draft);
        let updated = slot.clone();
        self.deals = deals.into();

        info!(deal_id = %id, admin = %actor.email, "updated deal");
        Ok(updated)
    }

    pub fn delete(&mut self, session: &Session, id: &str) -> DomainResult<Deal> {
        let actor = authorize(session)?;

        let mut deals = self.deals.to_vec();
        let index = deals
            .iter()
            .position(|deal| deal.id == id)
            .ok_or_else(|| DomainError::DealNotFound(id.to_string()))?;
        let removed = deals.remove(index);
        self.deals = deals.into();

        info!(deal_id = %id, admin = %actor.email, "deleted deal");
        Ok(removed)
    }
}

fn authorize(session: &Session) -> DomainResult<&Identity> {
    session
        .identity()
        .filter(|identity| identity.is_admin)
        .ok_or(DomainError::Unauthorized)
}
