//! Revenue report over a selectable look-back window.

use crate::dashboard::{first_of_month, month_key, month_label};
use chrono::{DateTime, Months, NaiveDate, Utc};
use reseller_core::types::{
    Account, Customer, FinancialRecord, PaymentStatus, Platform, RecordType, UnknownVariant,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use uuid::Uuid;

const TOP_N: usize = 10;
const DEFAULT_CHART_COLOR: &str = "#8884d8";
const UNCATEGORIZED: &str = "Uncategorized";
const UNKNOWN_PLATFORM: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportRange {
    #[serde(rename = "3months")]
    ThreeMonths,
    #[serde(rename = "6months")]
    SixMonths,
    #[default]
    #[serde(rename = "12months")]
    TwelveMonths,
    #[serde(rename = "2years")]
    TwoYears,
}

impl ReportRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportRange::ThreeMonths => "3months",
            ReportRange::SixMonths => "6months",
            ReportRange::TwelveMonths => "12months",
            ReportRange::TwoYears => "2years",
        }
    }

    fn months(&self) -> u32 {
        match self {
            ReportRange::ThreeMonths => 3,
            ReportRange::SixMonths => 6,
            ReportRange::TwelveMonths => 12,
            ReportRange::TwoYears => 24,
        }
    }

    /// First day covered by the report when it ends on `today`.
    pub fn start(&self, today: NaiveDate) -> NaiveDate {
        today.checked_sub_months(Months::new(self.months())).unwrap_or(today)
    }
}

impl FromStr for ReportRange {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3months" => Ok(ReportRange::ThreeMonths),
            "6months" => Ok(ReportRange::SixMonths),
            "12months" => Ok(ReportRange::TwelveMonths),
            "2years" => Ok(ReportRange::TwoYears),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub label: String,
    pub income: f64,
    pub expenses: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRevenue {
    pub platform_id: Uuid,
    pub name: String,
    pub revenue: f64,
    pub customers: u64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSlice {
    pub name: String,
    pub value: u64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAmount {
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopAccount {
    pub account_id: Uuid,
    pub email: String,
    pub revenue: f64,
    pub customers: u64,
    pub platform: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub month: String,
    pub label: String,
    pub growth: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_revenue: f64,
    pub total_customers: u64,
    pub total_accounts: u64,
    pub avg_revenue_per_customer: f64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub range: ReportRange,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub summary: ReportSummary,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub platform_breakdown: Vec<PlatformRevenue>,
    pub payment_status: Vec<StatusSlice>,
    pub revenue_by_category: Vec<CategoryAmount>,
    pub top_accounts: Vec<TopAccount>,
    pub monthly_growth: Vec<GrowthPoint>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub accounts: &'a [Account],
    pub customers: &'a [Customer],
    pub records: &'a [FinancialRecord],
    pub platforms: &'a [Platform],
}

pub fn build_report(input: ReportInput<'_>, range: ReportRange, now: DateTime<Utc>) -> Report {
    let end_date = now.date_naive();
    let start_date = range.start(end_date);

    let in_range: Vec<&FinancialRecord> = input
        .records
        .iter()
        .filter(|r| r.date >= start_date && r.date <= end_date)
        .collect();

    tracing::debug!(
        range = range.as_str(),
        %start_date,
        records = in_range.len(),
        "building revenue report"
    );
    let monthly_revenue = monthly_revenue(&in_range, start_date, end_date);
    let monthly_growth = monthly_growth(&monthly_revenue);

    let total_revenue: f64 = input.customers.iter().map(|c| c.amount_paid).sum();
    let total_customers = input.customers.len() as u64;
    let summary = ReportSummary {
        total_revenue,
        total_customers,
        total_accounts: input.accounts.len() as u64,
        avg_revenue_per_customer: if total_customers > 0 {
            total_revenue / total_customers as f64
        } else {
            0.0
        },
        growth_rate: if monthly_growth.len() > 1 {
            monthly_growth.last().map_or(0.0, |g| g.growth)
        } else {
            0.0
        },
    };

    Report {
        range,
        start_date,
        end_date,
        summary,
        platform_breakdown: platform_breakdown(input.accounts, input.customers, input.platforms),
        payment_status: payment_status_distribution(input.customers),
        revenue_by_category: revenue_by_category(&in_range),
        top_accounts: top_accounts(input.accounts, input.customers, input.platforms),
        monthly_revenue,
        monthly_growth,
        generated_at: now,
    }
}

/// Income, expenses and profit per calendar month from `start` to `end`.
/// Records dated outside those months are ignored.
pub fn monthly_revenue(records: &[&FinancialRecord], start: NaiveDate, end: NaiveDate) -> Vec<MonthlyRevenue> {
    let mut months: Vec<MonthlyRevenue> = Vec::new();
    let mut cursor = first_of_month(start);
    let last = first_of_month(end);
    while cursor <= last {
        months.push(MonthlyRevenue {
            month: month_key(cursor),
            label: month_label(cursor),
            income: 0.0,
            expenses: 0.0,
            profit: 0.0,
        });
        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }

    let index: HashMap<String, usize> = months
        .iter()
        .enumerate()
        .map(|(i, m)| (m.month.clone(), i))
        .collect();
    for record in records {
        if let Some(&i) = index.get(&month_key(record.date)) {
            match record.record_type {
                RecordType::Income => months[i].income += record.amount,
                RecordType::Expense => months[i].expenses += record.amount,
            }
        }
    }
    for month in &mut months {
        month.profit = month.income - month.expenses;
    }
    months
}

/// Month-over-month income change in percent; zero for the first month and
/// whenever the previous month had no income.
pub fn monthly_growth(months: &[MonthlyRevenue]) -> Vec<GrowthPoint> {
    months
        .iter()
        .enumerate()
        .map(|(i, current)| {
            let growth = match i.checked_sub(1).and_then(|p| months.get(p)) {
                Some(previous) if previous.income > 0.0 => {
                    (current.income - previous.income) / previous.income * 100.0
                }
                _ => 0.0,
            };
            GrowthPoint {
                month: current.month.clone(),
                label: current.label.clone(),
                growth,
            }
        })
        .collect()
}

/// Customer revenue and head count per active platform. Platforms without
/// any revenue or customers are left out.
pub fn platform_breakdown(accounts: &[Account], customers: &[Customer], platforms: &[Platform]) -> Vec<PlatformRevenue> {
    let account_platform: HashMap<Uuid, Uuid> = accounts
        .iter()
        .filter_map(|a| a.platform_id.map(|p| (a.id, p)))
        .collect();

    let mut totals: HashMap<Uuid, (f64, u64)> = HashMap::new();
    for customer in customers {
        if let Some(platform_id) = account_platform.get(&customer.account_id) {
            let entry = totals.entry(*platform_id).or_insert((0.0, 0));
            entry.0 += customer.amount_paid;
            entry.1 += 1;
        }
    }

    platforms
        .iter()
        .filter(|p| p.is_active)
        .map(|p| {
            let (revenue, count) = totals.get(&p.id).copied().unwrap_or((0.0, 0));
            PlatformRevenue {
                platform_id: p.id,
                name: p.name.clone(),
                revenue,
                customers: count,
                color: if p.color.is_empty() {
                    DEFAULT_CHART_COLOR.to_string()
                } else {
                    p.color.clone()
                },
            }
        })
        .filter(|p| p.revenue > 0.0 || p.customers > 0)
        .collect()
}

fn status_color(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Paid => "#22c55e",
        PaymentStatus::Due => "#eab308",
        PaymentStatus::Partial => "#f97316",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Customer count per payment status, statuses with no customers omitted.
pub fn payment_status_distribution(customers: &[Customer]) -> Vec<StatusSlice> {
    [PaymentStatus::Paid, PaymentStatus::Due, PaymentStatus::Partial]
        .into_iter()
        .filter_map(|status| {
            let count = customers.iter().filter(|c| c.payment_status == status).count() as u64;
            (count > 0).then(|| StatusSlice {
                name: capitalize(status.as_str()),
                value: count,
                color: status_color(status).to_string(),
            })
        })
        .collect()
}

/// Income grouped by category, largest first, at most ten entries.
pub fn revenue_by_category(records: &[&FinancialRecord]) -> Vec<CategoryAmount> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records.iter().filter(|r| r.record_type == RecordType::Income) {
        let category = record
            .category
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED);
        *totals.entry(category).or_insert(0.0) += record.amount;
    }

    let mut categories: Vec<CategoryAmount> = totals
        .into_iter()
        .map(|(category, amount)| CategoryAmount {
            category: category.to_string(),
            amount,
        })
        .collect();
    categories.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    categories.truncate(TOP_N);
    categories
}

/// Accounts ranked by what their customers paid, at most ten entries.
pub fn top_accounts(accounts: &[Account], customers: &[Customer], platforms: &[Platform]) -> Vec<TopAccount> {
    let platform_names: HashMap<Uuid, &str> = platforms.iter().map(|p| (p.id, p.name.as_str())).collect();
    let mut totals: HashMap<Uuid, (f64, u64)> = HashMap::new();
    for customer in customers {
        let entry = totals.entry(customer.account_id).or_insert((0.0, 0));
        entry.0 += customer.amount_paid;
        entry.1 += 1;
    }

    let mut ranked: Vec<TopAccount> = accounts
        .iter()
        .map(|account| {
            let (revenue, count) = totals.get(&account.id).copied().unwrap_or((0.0, 0));
            TopAccount {
                account_id: account.id,
                email: account.email.clone(),
                revenue,
                customers: count,
                platform: account
                    .platform_id
                    .and_then(|id| platform_names.get(&id))
                    .map_or_else(|| UNKNOWN_PLATFORM.to_string(), |n| n.to_string()),
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    ranked.truncate(TOP_N);
    ranked
}
