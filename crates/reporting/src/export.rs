//! CSV rendering of a [`Report`]: a summary block followed by the monthly table.

use crate::report::Report;
use chrono::NaiveDate;

fn cell(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn export_csv(report: &Report, generated_on: NaiveDate) -> String {
    let summary = &report.summary;
    let mut lines: Vec<String> = vec![
        format!("Report Generated:,{}", generated_on.format("%Y-%m-%d")),
        format!("Date Range:,{}", report.range.as_str()),
        String::new(),
        "Summary".to_string(),
        format!("Total Revenue,{:.2}", summary.total_revenue),
        format!("Total Customers,{}", summary.total_customers),
        format!("Total Accounts,{}", summary.total_accounts),
        format!("Avg Revenue per Customer,{:.2}", summary.avg_revenue_per_customer),
        String::new(),
        "Monthly Revenue".to_string(),
        "Month,Income,Expenses,Profit".to_string(),
    ];
    lines.extend(report.monthly_revenue.iter().map(|m| {
        format!(
            "{},{:.2},{:.2},{:.2}",
            cell(&m.label),
            m.income,
            m.expenses,
            m.profit
        )
    }));

    let mut csv = lines.join("\n");
    csv.push('\n');
    csv
}

/// File name offered for download, e.g. `account-manager-report-2024-06-10.csv`.
pub fn export_file_name(generated_on: NaiveDate) -> String {
    format!("account-manager-report-{}.csv", generated_on.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use crate::report::{build_report, ReportInput, ReportRange};
    use chrono::{TimeZone, Utc};
    use reseller_core::types::{AccountType, PaymentStatus, RecordType};

    #[test]
    fn csv_has_summary_then_monthly_rows() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let acc = account(AccountType::Shared, 500.0, date(2024, 12, 1));
        let customers = vec![customer(acc.id, 1, PaymentStatus::Paid, 125.5)];
        let records = vec![
            record(acc.id, RecordType::Income, 200.0, date(2024, 5, 3), None),
            record(acc.id, RecordType::Expense, 50.0, date(2024, 5, 9), None),
        ];
        let report = build_report(
            ReportInput {
                accounts: &[acc],
                customers: &customers,
                records: &records,
                platforms: &[],
            },
            ReportRange::ThreeMonths,
            now,
        );

        let csv = export_csv(&report, date(2024, 6, 10));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Report Generated:,2024-06-10");
        assert_eq!(lines[1], "Date Range:,3months");
        assert_eq!(lines[2], "");
        assert_eq!(lines[4], "Total Revenue,125.50");
        assert_eq!(lines[5], "Total Customers,1");
        assert_eq!(lines[7], "Avg Revenue per Customer,125.50");
        assert_eq!(lines[10], "Month,Income,Expenses,Profit");
        assert_eq!(lines.len(), 11 + 4);
        assert_eq!(lines[13], "May 24,200.00,50.00,150.00");
    }

    #[test]
    fn cells_with_commas_are_quoted() {
        assert_eq!(cell("plain"), "plain");
        assert_eq!(cell("a,b"), "\"a,b\"");
        assert_eq!(cell("say \"hi\", ok"), "\"say \"\"hi\"\", ok\"");
        assert_eq!(export_file_name(date(2024, 1, 2)), "account-manager-report-2024-01-02.csv");
    }
}
