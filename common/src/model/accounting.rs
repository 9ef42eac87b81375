//! Read models for the accounting screens.
//!
//! These are projections: rows are owned by the accounting tables and only
//! ever read by the API.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Pending,
    Validated,
    Paid,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseReportStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
    Reimbursed,
}

macro_rules! status_text {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($ty), other)),
                }
            }
        }
    };
}

status_text!(InvoiceStatus {
    Draft => "draft",
    Pending => "pending",
    Validated => "validated",
    Paid => "paid",
    Cancelled => "cancelled",
});

status_text!(ExpenseReportStatus {
    Draft => "draft",
    Submitted => "submitted",
    Approved => "approved",
    Rejected => "rejected",
    Reimbursed => "reimbursed",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierSummary {
    pub id: Uuid,
    pub name: String,
    pub siret: Option<String>,
    pub email: Option<String>,
    pub invoice_count: u32,
    pub total_ttc: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseInvoiceSummary {
    pub id: Uuid,
    pub supplier_name: String,
    pub number: String,
    pub issue_date: NaiveDate,
    pub total_ht: Decimal,
    pub vat_amount: Decimal,
    pub total_ttc: Decimal,
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseReportSummary {
    pub id: Uuid,
    pub employee_name: String,
    /// Reporting month, `YYYY-MM`.
    pub period: String,
    pub total_ht: Decimal,
    pub vat_amount: Decimal,
    pub total_ttc: Decimal,
    pub status: ExpenseReportStatus,
}
