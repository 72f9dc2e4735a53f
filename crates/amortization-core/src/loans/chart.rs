use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::loans::schedule::ScheduleEntry;
use crate::types::*;
use crate::LoanResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub payment_number: u32,
    pub value: Money,
}

/// Principal and interest per period, for plotting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanChartData {
    pub principal_data: Vec<ChartPoint>,
    pub interest_data: Vec<ChartPoint>,
}

/// Series over the non-opening rows, ordered by payment number. Rows
/// without a value are left out of that series.
pub fn chart_data(entries: &[ScheduleEntry]) -> LoanChartData {
    let mut periods: Vec<&ScheduleEntry> =
        entries.iter().filter(|e| e.payment_number > 0).collect();
    periods.sort_by_key(|e| e.payment_number);

    let series = |pick: fn(&ScheduleEntry) -> Option<Money>| -> Vec<ChartPoint> {
        periods
            .iter()
            .filter_map(|e| {
                pick(e).map(|value| ChartPoint {
                    payment_number: e.payment_number,
                    value,
                })
            })
            .collect()
    };

    LoanChartData {
        principal_data: series(|e| e.principal),
        interest_data: series(|e| e.interest),
    }
}

pub fn build_chart(entries: &[ScheduleEntry]) -> LoanResult<ComputationOutput<LoanChartData>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if entries.iter().all(|e| e.payment_number == 0) {
        warnings.push("Schedule has no payment periods to chart".into());
    }

    let data = chart_data(entries);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Principal / interest split per period",
        &serde_json::json!({ "periods": data.principal_data.len() }),
        warnings,
        elapsed,
        data,
    ))
}
