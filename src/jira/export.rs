//! Issue rows, CSV export and the field-definition dump.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::clock::format_timestamp;
use crate::error::Result;

/// Shown when an issue has no assignee or reporter.
pub const UNASSIGNED: &str = "未分配";

/// Shown when an issue has no priority.
pub const NO_PRIORITY: &str = "无";

/// Custom field holding the issue severity.
pub const SEVERITY_FIELD: &str = "customfield_10041";

/// Custom field holding the reproduce rate.
pub const REPRODUCE_RATE_FIELD: &str = "customfield_10030";

/// Column headers of the export, in order.
pub const CSV_HEADERS: [&str; 11] = [
    "事务类型",
    "密钥",
    "摘要",
    "经办人",
    "报告人",
    "状态",
    "已创建",
    "已更新",
    "优先级",
    "Issue Severity(严重程度)",
    "Reproduce rate(复现概率)",
];

const BOM: &str = "\u{feff}";
const DUMP_SEPARATOR_WIDTH: usize = 50;

/// One exported issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRow {
    pub issue_type: String,
    pub key: String,
    pub summary: String,
    pub assignee: String,
    pub reporter: String,
    pub status: String,
    pub created: String,
    pub updated: String,
    pub priority: String,
    pub severity: String,
    pub reproduce_rate: String,
}

impl IssueRow {
    /// Extract the exported columns from an issue as returned by search.
    pub fn from_issue(issue: &Value) -> Self {
        let fields = &issue["fields"];
        let person = |name: &str| {
            fields[name]["displayName"]
                .as_str()
                .map_or_else(|| UNASSIGNED.to_owned(), str::to_owned)
        };

        Self {
            issue_type: render_field(&fields["issuetype"]),
            key: render_field(&issue["key"]),
            summary: render_field(&fields["summary"]),
            assignee: person("assignee"),
            reporter: person("reporter"),
            status: render_field(&fields["status"]),
            created: render_field(&fields["created"]),
            updated: render_field(&fields["updated"]),
            priority: fields["priority"]["name"]
                .as_str()
                .map_or_else(|| NO_PRIORITY.to_owned(), str::to_owned),
            severity: render_field(&fields[SEVERITY_FIELD]),
            reproduce_rate: render_field(&fields[REPRODUCE_RATE_FIELD]),
        }
    }

    fn columns(&self, browse_prefix: &str) -> [String; 11] {
        [
            self.issue_type.clone(),
            hyperlink_formula(browse_prefix, &self.key),
            self.summary.clone(),
            self.assignee.clone(),
            self.reporter.clone(),
            self.status.clone(),
            self.created.clone(),
            self.updated.clone(),
            self.priority.clone(),
            self.severity.clone(),
            self.reproduce_rate.clone(),
        ]
    }
}

/// Render a free-form field value as cell text.
///
/// Strings as-is, objects by their `value` or `name`, arrays comma-joined,
/// scalars by their display form and `null` as empty.
pub fn render_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(render_field)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .get("value")
            .or_else(|| map.get("name"))
            .or_else(|| map.get("displayName"))
            .map(render_field)
            .unwrap_or_default(),
    }
}

/// Spreadsheet formula linking `key` to its browse page.
pub fn hyperlink_formula(browse_prefix: &str, key: &str) -> String {
    let url = format!("{browse_prefix}{key}").replace('"', "\"\"");
    let label = key.replace('"', "\"\"");
    format!("=HYPERLINK(\"{url}\",\"{label}\")")
}

fn csv_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_owned()
    }
}

fn csv_line(cells: &[impl AsRef<str>]) -> String {
    let mut line = cells
        .iter()
        .map(|c| csv_cell(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str("\r\n");
    line
}

/// Render rows as CSV text (BOM, header row, CRLF line endings).
pub fn render_issues_csv(rows: &[IssueRow], browse_prefix: &str) -> String {
    let mut out = String::from(BOM);
    out.push_str(&csv_line(&CSV_HEADERS));
    for row in rows {
        out.push_str(&csv_line(&row.columns(browse_prefix)));
    }
    out
}

/// Write rows to `path` as CSV. Returns the number of issue rows written.
pub fn export_issues_csv(rows: &[IssueRow], browse_prefix: &str, path: &Path) -> Result<usize> {
    std::fs::write(path, render_issues_csv(rows, browse_prefix))?;
    tracing::info!("{} issues exported to {}", rows.len(), path.display());
    Ok(rows.len())
}

/// Write the field definitions to `path` between a header and a footer.
pub fn write_fields_dump(path: &Path, fields: &[Value], now: &DateTime<FixedOffset>) -> Result<()> {
    let separator = "=".repeat(DUMP_SEPARATOR_WIDTH);
    let json = serde_json::to_string_pretty(fields)?;

    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    writeln!(file, "fields字段")?;
    writeln!(file, "生成时间: {}", format_timestamp(now))?;
    write!(file, "{separator}\n\n")?;
    file.write_all(json.as_bytes())?;
    write!(file, "\n\n{separator}")?;
    write!(file, "\nfields字段结束")?;
    file.flush()?;

    tracing::info!("field definitions written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn full_issue() -> Value {
        json!({
            "key": "FERA-2119",
            "fields": {
                "issuetype": {"name": "Bug"},
                "summary": "Crash on boot, sometimes",
                "assignee": {"displayName": "Han Meimei"},
                "reporter": {"displayName": "Li Lei"},
                "status": {"name": "Open"},
                "created": "2024-06-01T10:00:00.000+0800",
                "updated": "2024-06-02T10:00:00.000+0800",
                "priority": {"name": "High"},
                "customfield_10041": {"value": "Critical"},
                "customfield_10030": [{"value": "Always"}, {"value": "Cold boot"}]
            }
        })
    }

    #[test]
    fn row_extracts_all_columns() {
        let row = IssueRow::from_issue(&full_issue());
        assert_eq!(row.issue_type, "Bug");
        assert_eq!(row.key, "FERA-2119");
        assert_eq!(row.assignee, "Han Meimei");
        assert_eq!(row.status, "Open");
        assert_eq!(row.priority, "High");
        assert_eq!(row.severity, "Critical");
        assert_eq!(row.reproduce_rate, "Always, Cold boot");
    }

    #[test]
    fn missing_people_and_priority_use_placeholders() {
        let issue = json!({
            "key": "P-1",
            "fields": {"summary": "s", "assignee": null, "status": {"name": "Done"}}
        });
        let row = IssueRow::from_issue(&issue);
        assert_eq!(row.assignee, UNASSIGNED);
        assert_eq!(row.reporter, UNASSIGNED);
        assert_eq!(row.priority, NO_PRIORITY);
        assert_eq!(row.severity, "");
        assert_eq!(row.reproduce_rate, "");
    }

    #[test]
    fn render_field_is_deterministic() {
        assert_eq!(render_field(&json!(null)), "");
        assert_eq!(render_field(&json!("x")), "x");
        assert_eq!(render_field(&json!(3)), "3");
        assert_eq!(render_field(&json!(true)), "true");
        assert_eq!(render_field(&json!({"value": "v", "name": "n"})), "v");
        assert_eq!(render_field(&json!({"name": "n"})), "n");
        assert_eq!(render_field(&json!({"id": "1"})), "");
        assert_eq!(render_field(&json!(["a", null, {"name": "b"}])), "a, b");
    }

    #[test]
    fn csv_has_bom_header_and_hyperlinked_key() {
        let row = IssueRow::from_issue(&full_issue());
        let csv = render_issues_csv(&[row], "https://jira.example.com/browse/");

        assert!(csv.starts_with('\u{feff}'));
        let mut lines = csv.trim_start_matches('\u{feff}').split("\r\n");
        assert_eq!(lines.next().unwrap(), CSV_HEADERS.join(","));

        let data = lines.next().unwrap();
        assert!(data.starts_with(
            "Bug,\"=HYPERLINK(\"\"https://jira.example.com/browse/FERA-2119\"\",\"\"FERA-2119\"\")\","
        ));
        assert!(data.contains(",\"Crash on boot, sometimes\","));
        assert!(data.ends_with(",\"Always, Cold boot\""));
    }

    #[test]
    fn export_writes_file_and_counts_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jira_issues.csv");
        let rows = vec![IssueRow::from_issue(&full_issue()); 3];

        assert_eq!(export_issues_csv(&rows, "p/", &path).unwrap(), 3);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.matches("\r\n").count(), 4);
    }

    #[test]
    fn fields_dump_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        let now = crate::clock::china_offset()
            .with_ymd_and_hms(2024, 6, 14, 9, 30, 0)
            .single()
            .unwrap();

        write_fields_dump(&path, &[json!({"id": "summary", "name": "摘要"})], &now).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let sep = "=".repeat(50);
        assert!(text.starts_with(&format!("fields字段\n生成时间: 2024-06-14 09:30:00\n{sep}\n\n[")));
        assert!(text.contains("\"name\": \"摘要\""));
        assert!(text.ends_with(&format!("]\n\n{sep}\nfields字段结束")));
    }
}
