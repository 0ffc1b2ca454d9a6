//! Plan storage port trait.

use crate::domain::disabled_rules::DisabledRules;
use crate::domain::error::BitageError;
use crate::domain::plan::{AccumulationPlan, Plan, PlanId, PlanKind, SingleEntryPlan};

/// Persistence for plan records. Ids are scoped per plan kind.
///
/// Rule-list fields are opaque strings to the store.
pub trait PlanStorePort {
    fn list_accumulation_plans(&self) -> Result<Vec<AccumulationPlan>, BitageError>;

    fn list_single_entry_plans(&self) -> Result<Vec<SingleEntryPlan>, BitageError>;

    /// Insert a plan without an id, or replace the stored plan with the same id.
    /// Returns the plan's id. Replacing a missing id is `PlanNotFound`.
    fn upsert_plan(&self, plan: &Plan) -> Result<PlanId, BitageError>;

    fn delete_plan(&self, kind: PlanKind, id: PlanId) -> Result<(), BitageError>;

    fn set_disabled_sell_indices(
        &self,
        kind: PlanKind,
        id: PlanId,
        indices: &DisabledRules,
    ) -> Result<(), BitageError>;

    fn find_accumulation_plan(&self, id: PlanId) -> Result<AccumulationPlan, BitageError> {
        self.list_accumulation_plans()?
            .into_iter()
            .find(|p| p.id == Some(id))
            .ok_or(BitageError::PlanNotFound {
                kind: PlanKind::Accumulation,
                id,
            })
    }

    fn find_single_entry_plan(&self, id: PlanId) -> Result<SingleEntryPlan, BitageError> {
        self.list_single_entry_plans()?
            .into_iter()
            .find(|p| p.id == Some(id))
            .ok_or(BitageError::PlanNotFound {
                kind: PlanKind::SingleEntry,
                id,
            })
    }

    fn find_plan(&self, kind: PlanKind, id: PlanId) -> Result<Plan, BitageError> {
        match kind {
            PlanKind::Accumulation => self.find_accumulation_plan(id).map(Plan::Accumulation),
            PlanKind::SingleEntry => self.find_single_entry_plan(id).map(Plan::SingleEntry),
        }
    }
}
