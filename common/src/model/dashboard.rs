use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Headline figures shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub employees: u64,
    pub active_projects: u64,
    pub hours_this_month: Decimal,
    pub unvalidated_entries: u64,
    pub pending_invoices: u64,
    pub pending_invoices_ttc: Decimal,
    pub open_expense_reports: u64,
}
