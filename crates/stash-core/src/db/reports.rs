//! Report generation and storage
//!
//! Reports are generated from the ledger at request time and stored with
//! their JSON payload, so a report remains a snapshot of the ledger as it
//! was when generated.

use chrono::{Duration, NaiveDate};
use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{MonthlySummaryData, Report, ReportType};

fn map_report(row: &rusqlite::Row<'_>) -> rusqlite::Result<Report> {
    let type_str: String = row.get(3)?;
    let start_str: String = row.get(4)?;
    let end_str: String = row.get(5)?;
    let generated_at: String = row.get(6)?;
    let data_str: String = row.get(7)?;

    Ok(Report {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        report_type: type_str.parse().unwrap_or(ReportType::MonthlySummary),
        start_date: NaiveDate::parse_from_str(&start_str, "%Y-%m-%d")
            .unwrap_or_else(|_| chrono::Utc::now().date_naive()),
        end_date: NaiveDate::parse_from_str(&end_str, "%Y-%m-%d")
            .unwrap_or_else(|_| chrono::Utc::now().date_naive()),
        generated_at: parse_datetime(&generated_at),
        data: serde_json::from_str(&data_str).unwrap_or(serde_json::Value::Null),
    })
}

const REPORT_COLUMNS: &str =
    "id, user_id, name, report_type, start_date, end_date, generated_at, data";

fn pct_change(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

impl Database {
    /// Generate a report over a date range and store it
    pub fn generate_report(
        &self,
        user_id: i64,
        name: &str,
        report_type: ReportType,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Report> {
        if end_date < start_date {
            return Err(Error::Validation(
                "Report end date must not precede start date".to_string(),
            ));
        }

        let data = match report_type {
            ReportType::MonthlySummary => {
                let current = self.transaction_summary(user_id, start_date, end_date)?;

                // Preceding period of equal length, ending the day before
                let span = end_date - start_date;
                let prev_end = start_date - Duration::days(1);
                let prev_start = prev_end - span;
                let previous = self.transaction_summary(user_id, prev_start, prev_end)?;

                serde_json::to_value(MonthlySummaryData {
                    income: current.income,
                    expenses: current.expenses,
                    net: current.net,
                    previous_income: previous.income,
                    previous_expenses: previous.expenses,
                    income_change_pct: pct_change(current.income, previous.income),
                    expense_change_pct: pct_change(current.expenses, previous.expenses),
                })?
            }
            ReportType::SpendingByCategory => {
                let summary = self.transaction_summary(user_id, start_date, end_date)?;
                serde_json::json!({
                    "total_expenses": summary.expenses,
                    "by_category": summary.by_category,
                })
            }
        };

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO reports (user_id, name, report_type, start_date, end_date, data)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                name,
                report_type.as_str(),
                start_date.to_string(),
                end_date.to_string(),
                serde_json::to_string(&data)?,
            ],
        )?;

        self.get_report(user_id, conn.last_insert_rowid())
    }

    /// Get a report by id, scoped to its owner
    pub fn get_report(&self, user_id: i64, id: i64) -> Result<Report> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ? AND user_id = ?"),
            params![id, user_id],
            map_report,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(format!("Report {}", id)),
            e => e.into(),
        })
    }

    /// List the user's reports, newest first
    pub fn list_reports(&self, user_id: i64) -> Result<Vec<Report>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE user_id = ? ORDER BY generated_at DESC"
        ))?;

        let reports = stmt
            .query_map(params![user_id], map_report)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(reports)
    }

    /// Delete a stored report
    pub fn delete_report(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM reports WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("Report {}", id)));
        }
        Ok(())
    }
}
