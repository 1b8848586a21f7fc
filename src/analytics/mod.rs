// Spending analytics derived from the maintenance history
//
// Everything here is a pure function of the vehicles, the records and the
// reference time handed in by the caller.

use chrono::{DateTime, Datelike, Month, Utc};
use itertools::Itertools;
use serde::Serialize;

use crate::garage::{MaintenanceRecord, MaintenanceType, Vehicle};

/// Months of spending history kept by default
pub const DEFAULT_SPENDING_HISTORY_MONTHS: usize = 12;

/// Spending within one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySpending {
    pub year: i32,
    /// 1-based month number
    pub month: u32,
    pub amount: f64,
    pub count: usize,
}

impl MonthlySpending {
    /// "September 2024"
    pub fn label(&self) -> String {
        match u8::try_from(self.month).ok().and_then(|m| Month::try_from(m).ok()) {
            Some(month) => format!("{} {}", month.name(), self.year),
            None => format!("{:02}/{}", self.month, self.year),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceTypeData {
    pub maintenance_type: MaintenanceType,
    pub count: usize,
    pub total_cost: f64,
    pub average_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleCostData {
    pub vehicle_id: String,
    pub vehicle_name: String,
    pub total_cost: f64,
    pub maintenance_count: usize,
    /// 0 when the vehicle has no mileage
    pub cost_per_mile: f64,
}

/// This calendar month against the previous one
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendData {
    pub is_spending_increasing: bool,
    /// Percent change, 0 when nothing was spent last month
    pub month_over_month_change: f64,
    pub this_month_spending: f64,
    pub last_month_spending: f64,
    pub total_records_this_month: usize,
    pub total_records_last_month: usize,
}

/// Fleet-wide spending report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub total_maintenance_cost: f64,
    pub total_vehicles: usize,
    /// Oldest month first
    pub monthly_spending: Vec<MonthlySpending>,
    /// Highest total first
    pub maintenance_type_breakdown: Vec<MaintenanceTypeData>,
    /// Highest total first
    pub vehicle_cost_breakdown: Vec<VehicleCostData>,
    pub recent_trends: TrendData,
    pub average_cost_per_vehicle: f64,
    pub most_expensive_maintenance_type: Option<MaintenanceType>,
    /// Total cost over the summed odometer of all vehicles
    pub cost_per_mile: f64,
}

impl AnalyticsReport {
    /// Build the report.
    ///
    /// # Arguments
    /// * `vehicles` - Vehicles to report on
    /// * `records` - Their maintenance records
    /// * `now` - Reference time for the monthly trend
    /// * `history_months` - Number of most recent monthly buckets to keep
    pub fn calculate(
        vehicles: &[Vehicle],
        records: &[MaintenanceRecord],
        now: DateTime<Utc>,
        history_months: usize,
    ) -> Self {
        let total_maintenance_cost: f64 = records.iter().map(|r| r.cost).sum();
        let total_vehicles = vehicles.len();

        let maintenance_type_breakdown = maintenance_type_breakdown(records);
        let most_expensive_maintenance_type = maintenance_type_breakdown
            .first()
            .map(|data| data.maintenance_type);

        let average_cost_per_vehicle = if total_vehicles > 0 {
            total_maintenance_cost / total_vehicles as f64
        } else {
            0.0
        };
        let total_miles: u64 = vehicles.iter().map(|v| u64::from(v.current_mileage)).sum();
        let cost_per_mile = if total_miles > 0 {
            total_maintenance_cost / total_miles as f64
        } else {
            0.0
        };

        Self {
            total_maintenance_cost,
            total_vehicles,
            monthly_spending: monthly_spending(records, history_months),
            maintenance_type_breakdown,
            vehicle_cost_breakdown: vehicle_cost_breakdown(vehicles, records),
            recent_trends: trends(records, now),
            average_cost_per_vehicle,
            most_expensive_maintenance_type,
            cost_per_mile,
        }
    }
}

fn monthly_spending(records: &[MaintenanceRecord], history_months: usize) -> Vec<MonthlySpending> {
    let months: Vec<MonthlySpending> = records
        .iter()
        .into_group_map_by(|r| (r.service_date.year(), r.service_date.month()))
        .into_iter()
        .sorted_by_key(|(key, _)| *key)
        .map(|((year, month), group)| MonthlySpending {
            year,
            month,
            amount: group.iter().map(|r| r.cost).sum(),
            count: group.len(),
        })
        .collect();

    let skip = months.len().saturating_sub(history_months);
    months.into_iter().skip(skip).collect()
}

fn maintenance_type_breakdown(records: &[MaintenanceRecord]) -> Vec<MaintenanceTypeData> {
    records
        .iter()
        .into_group_map_by(|r| r.maintenance_type)
        .into_iter()
        .map(|(maintenance_type, group)| {
            let total_cost: f64 = group.iter().map(|r| r.cost).sum();
            MaintenanceTypeData {
                maintenance_type,
                count: group.len(),
                total_cost,
                average_cost: total_cost / group.len() as f64,
            }
        })
        .sorted_by(|a, b| {
            b.total_cost
                .total_cmp(&a.total_cost)
                .then(a.maintenance_type.cmp(&b.maintenance_type))
        })
        .collect()
}

fn vehicle_cost_breakdown(
    vehicles: &[Vehicle],
    records: &[MaintenanceRecord],
) -> Vec<VehicleCostData> {
    vehicles
        .iter()
        .map(|vehicle| {
            let (total_cost, maintenance_count) = records
                .iter()
                .filter(|r| r.vehicle_id == vehicle.id)
                .fold((0.0, 0), |(total, count), r| (total + r.cost, count + 1));
            let cost_per_mile = if vehicle.current_mileage > 0 {
                total_cost / f64::from(vehicle.current_mileage)
            } else {
                0.0
            };
            VehicleCostData {
                vehicle_id: vehicle.id.clone(),
                vehicle_name: vehicle.display_name(),
                total_cost,
                maintenance_count,
                cost_per_mile,
            }
        })
        // stable: equal totals keep the vehicle order
        .sorted_by(|a, b| b.total_cost.total_cmp(&a.total_cost))
        .collect()
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

fn trends(records: &[MaintenanceRecord], now: DateTime<Utc>) -> TrendData {
    let this_month = (now.year(), now.month());
    let last_month = previous_month(now.year(), now.month());

    let spending_in = |(year, month): (i32, u32)| {
        records
            .iter()
            .filter(|r| r.service_date.year() == year && r.service_date.month() == month)
            .fold((0.0, 0), |(total, count), r| (total + r.cost, count + 1))
    };
    let (this_month_spending, total_records_this_month) = spending_in(this_month);
    let (last_month_spending, total_records_last_month) = spending_in(last_month);

    let month_over_month_change = if last_month_spending > 0.0 {
        (this_month_spending - last_month_spending) / last_month_spending * 100.0
    } else {
        0.0
    };

    TrendData {
        is_spending_increasing: this_month_spending > last_month_spending,
        month_over_month_change,
        this_month_spending,
        last_month_spending,
        total_records_this_month,
        total_records_last_month,
    }
}

/// Sum of every record cost for a vehicle
pub fn total_cost_for_vehicle(records: &[MaintenanceRecord], vehicle_id: &str) -> f64 {
    records
        .iter()
        .filter(|r| r.vehicle_id == vehicle_id)
        .map(|r| r.cost)
        .sum()
}

/// Cost of a vehicle's services dated within `[start, end]`
pub fn cost_in_period(
    records: &[MaintenanceRecord],
    vehicle_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> f64 {
    records
        .iter()
        .filter(|r| r.vehicle_id == vehicle_id && r.service_date >= start && r.service_date <= end)
        .map(|r| r.cost)
        .sum()
}
