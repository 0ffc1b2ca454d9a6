#![allow(dead_code)]

use bitage::domain::disabled_rules::DisabledRules;
use bitage::domain::error::BitageError;
use bitage::domain::plan::{AccumulationPlan, Plan, PlanId, PlanKind, SingleEntryPlan};
use bitage::domain::snapshot::PriceSnapshot;
use bitage::ports::market_data_port::MarketDataPort;
use bitage::ports::plan_store_port::PlanStorePort;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MockPlanStore {
    pub accumulation: Mutex<Vec<AccumulationPlan>>,
    pub single_entry: Mutex<Vec<SingleEntryPlan>>,
    next_id: Mutex<HashMap<PlanKind, PlanId>>,
}

impl MockPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, kind: PlanKind) -> PlanId {
        let mut ids = self.next_id.lock().unwrap();
        let id = ids.entry(kind).or_insert(0);
        *id += 1;
        *id
    }
}

impl PlanStorePort for MockPlanStore {
    fn list_accumulation_plans(&self) -> Result<Vec<AccumulationPlan>, BitageError> {
        Ok(self.accumulation.lock().unwrap().clone())
    }

    fn list_single_entry_plans(&self) -> Result<Vec<SingleEntryPlan>, BitageError> {
        Ok(self.single_entry.lock().unwrap().clone())
    }

    fn upsert_plan(&self, plan: &Plan) -> Result<PlanId, BitageError> {
        match plan {
            Plan::Accumulation(p) => {
                let mut plans = self.accumulation.lock().unwrap();
                match p.id {
                    Some(id) => {
                        let slot = plans.iter_mut().find(|s| s.id == Some(id)).ok_or(
                            BitageError::PlanNotFound {
                                kind: PlanKind::Accumulation,
                                id,
                            },
                        )?;
                        *slot = p.clone();
                        Ok(id)
                    }
                    None => {
                        let id = self.next_id(PlanKind::Accumulation);
                        plans.push(AccumulationPlan {
                            id: Some(id),
                            ..p.clone()
                        });
                        Ok(id)
                    }
                }
            }
            Plan::SingleEntry(p) => {
                let mut plans = self.single_entry.lock().unwrap();
                match p.id {
                    Some(id) => {
                        let slot = plans.iter_mut().find(|s| s.id == Some(id)).ok_or(
                            BitageError::PlanNotFound {
                                kind: PlanKind::SingleEntry,
                                id,
                            },
                        )?;
                        *slot = p.clone();
                        Ok(id)
                    }
                    None => {
                        let id = self.next_id(PlanKind::SingleEntry);
                        plans.push(SingleEntryPlan {
                            id: Some(id),
                            ..p.clone()
                        });
                        Ok(id)
                    }
                }
            }
        }
    }

    fn delete_plan(&self, kind: PlanKind, id: PlanId) -> Result<(), BitageError> {
        let removed = match kind {
            PlanKind::Accumulation => {
                let mut plans = self.accumulation.lock().unwrap();
                let before = plans.len();
                plans.retain(|p| p.id != Some(id));
                before != plans.len()
            }
            PlanKind::SingleEntry => {
                let mut plans = self.single_entry.lock().unwrap();
                let before = plans.len();
                plans.retain(|p| p.id != Some(id));
                before != plans.len()
            }
        };
        if removed {
            Ok(())
        } else {
            Err(BitageError::PlanNotFound { kind, id })
        }
    }

    fn set_disabled_sell_indices(
        &self,
        kind: PlanKind,
        id: PlanId,
        indices: &DisabledRules,
    ) -> Result<(), BitageError> {
        let found = match kind {
            PlanKind::Accumulation => self
                .accumulation
                .lock()
                .unwrap()
                .iter_mut()
                .find(|p| p.id == Some(id))
                .map(|p| p.disabled_sell = indices.clone())
                .is_some(),
            PlanKind::SingleEntry => self
                .single_entry
                .lock()
                .unwrap()
                .iter_mut()
                .find(|p| p.id == Some(id))
                .map(|p| p.disabled_sell = indices.clone())
                .is_some(),
        };
        if found {
            Ok(())
        } else {
            Err(BitageError::PlanNotFound { kind, id })
        }
    }
}

pub struct MockMarketData {
    pub snapshots: HashMap<String, PriceSnapshot>,
    pub errors: HashMap<String, String>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            snapshots: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_snapshot(mut self, ticker: &str, snapshot: PriceSnapshot) -> Self {
        self.snapshots.insert(ticker.to_string(), snapshot);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockMarketData {
    fn fetch_snapshot(&self, ticker: &str) -> Result<Option<PriceSnapshot>, BitageError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(BitageError::MarketData {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.snapshots.get(ticker).copied())
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn snapshot(price: f64, ath_now: f64, low_since_ath: f64) -> PriceSnapshot {
    PriceSnapshot {
        price,
        ath_now,
        ath_date: date("2024-03-14"),
        low_since_ath,
    }
}

pub fn accumulation_plan(buy_rules: &str, sell_rules: &str) -> AccumulationPlan {
    AccumulationPlan {
        id: None,
        name: "Bitcoin DCA".to_string(),
        ticker: "BTC-USD".to_string(),
        ath_value: 100.0,
        ath_date: date("2021-11-10"),
        buy_rules: buy_rules.to_string(),
        sell_rules: sell_rules.to_string(),
        disabled_sell: DisabledRules::new(),
    }
}

pub fn single_entry_plan(purchase_price: f64, sell_rules: &str) -> SingleEntryPlan {
    SingleEntryPlan {
        id: None,
        name: "ETH swing".to_string(),
        ticker: "ETH-USD".to_string(),
        purchase_price,
        sell_rules: sell_rules.to_string(),
        disabled_sell: DisabledRules::new(),
    }
}
