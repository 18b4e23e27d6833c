//! Request Metrics
//!
//! Counts inbound requests per parameter set, independently of how the
//! cache served them.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;

use crate::fizzbuzz::FizzBuzzParams;

/// Labels of the request counter: the five request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestLabels {
    pub limit: u64,
    pub nb_one: u64,
    pub nb_two: u64,
    pub str_one: String,
    pub str_two: String,
}

impl From<&FizzBuzzParams> for RequestLabels {
    fn from(params: &FizzBuzzParams) -> Self {
        Self {
            limit: params.limit,
            nb_one: params.nb_one,
            nb_two: params.nb_two,
            str_one: params.str_one.clone(),
            str_two: params.str_two.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestCount {
    #[serde(flatten)]
    pub labels: RequestLabels,
    pub count: u64,
}

// == Request Counter ==
#[derive(Debug, Default)]
pub struct RequestCounter {
    counts: Mutex<HashMap<RequestLabels, u64>>,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one request for `params`.
    pub fn record(&self, params: &FizzBuzzParams) {
        let mut counts = self
            .counts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *counts.entry(RequestLabels::from(params)).or_insert(0) += 1;
    }

    /// Current count for `params`.
    pub fn get(&self, params: &FizzBuzzParams) -> u64 {
        let counts = self
            .counts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        counts.get(&RequestLabels::from(params)).copied().unwrap_or(0)
    }

    /// All counters, most requested first.
    pub fn snapshot(&self) -> Vec<RequestCount> {
        let counts = self
            .counts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut snapshot: Vec<RequestCount> = counts
            .iter()
            .map(|(labels, count)| RequestCount {
                labels: labels.clone(),
                count: *count,
            })
            .collect();
        snapshot.sort_by(|a, b| b.count.cmp(&a.count));
        snapshot
    }
}
