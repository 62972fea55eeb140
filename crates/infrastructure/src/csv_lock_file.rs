use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use lockdesk_core::{AppError, AppResult};
use lockdesk_domain::{CandidateRow, LockOutcome};
use serde::Serialize;

const USERID_COLUMN: &str = "userid";
const COMMENT_COLUMN: &str = "comment";

/// File name offered for the downloadable report.
pub const REPORT_FILE_NAME: &str = "lock_outcome_result.csv";

#[derive(Debug, Serialize)]
struct ReportRecord<'a> {
    userid: &'a str,
    success: &'static str,
    status_code: Option<u16>,
    msg: &'a str,
    duration_seconds: String,
}

/// Parses an uploaded lock file into candidate rows.
///
/// Rows are not validated here: a missing `userid` column or cell yields a
/// candidate without identifier, which the batch sets aside.
pub fn read_lock_rows(contents: &[u8]) -> AppResult<Vec<CandidateRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(contents);

    let headers = reader
        .headers()
        .map_err(|error| AppError::Validation(format!("uploaded file is not valid CSV: {error}")))?
        .clone();
    if headers.iter().all(|header| header.trim().is_empty()) {
        return Err(AppError::Validation(
            "uploaded file has no header row".to_owned(),
        ));
    }

    let userid_index = column_index(&headers, USERID_COLUMN);
    let comment_index = column_index(&headers, COMMENT_COLUMN);

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let line = index + 1;
        let record = record.map_err(|error| {
            AppError::Validation(format!("uploaded file has an invalid row {line}: {error}"))
        })?;

        rows.push(CandidateRow {
            line,
            userid: cell(&record, userid_index),
            comment: cell(&record, comment_index),
            raw: record.iter().collect::<Vec<_>>().join(","),
        });
    }

    Ok(rows)
}

/// Serializes outcomes into the downloadable CSV report.
pub fn write_lock_report(outcomes: &[LockOutcome]) -> AppResult<Vec<u8>> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());

    for outcome in outcomes {
        writer
            .serialize(ReportRecord {
                userid: outcome.userid.as_str(),
                success: if outcome.success { "True" } else { "False" },
                status_code: outcome.status_code,
                msg: outcome.message.as_str(),
                duration_seconds: format!("{:.3}", outcome.duration_seconds()),
            })
            .map_err(|error| {
                AppError::Internal(format!("failed to write report row: {error}"))
            })?;
    }

    if outcomes.is_empty() {
        writer
            .write_record(["userid", "success", "status_code", "msg", "duration_seconds"])
            .map_err(|error| AppError::Internal(format!("failed to write report header: {error}")))?;
    }

    writer
        .into_inner()
        .map_err(|error| AppError::Internal(format!("failed to finish report: {error}")))
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim_start_matches('\u{feff}').trim() == name)
}

fn cell(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|index| record.get(index))
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use lockdesk_domain::LockOutcome;

    use super::{read_lock_rows, write_lock_report};

    #[test]
    fn rows_are_read_by_header_name() {
        let rows = read_lock_rows(b"comment,userid\nfraud, 123 \n,456\n")
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 1);
        assert_eq!(rows[0].userid.as_deref(), Some("123"));
        assert_eq!(rows[0].comment.as_deref(), Some("fraud"));
        assert_eq!(rows[1].userid.as_deref(), Some("456"));
        assert_eq!(rows[1].comment, None);
    }

    #[test]
    fn blank_and_missing_cells_have_no_userid() {
        let rows = read_lock_rows(b"userid,comment\n,fraud\n789\n")
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].userid, None);
        assert_eq!(rows[0].raw, ",fraud");
        assert_eq!(rows[1].userid.as_deref(), Some("789"));
        assert_eq!(rows[1].comment, None);
    }

    #[test]
    fn file_without_userid_column_yields_rows_without_identifier() {
        let rows = read_lock_rows(b"id,comment\n1,a\n2,b\n").unwrap_or_else(|_| unreachable!());

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.userid.is_none()));
    }

    #[test]
    fn byte_order_mark_does_not_hide_userid_column() {
        let rows = read_lock_rows("\u{feff}userid\n12\n".as_bytes())
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(rows[0].userid.as_deref(), Some("12"));
    }

    #[test]
    fn long_numeric_identifier_is_kept_verbatim() {
        let rows = read_lock_rows(b"userid\n12345678901234567890\n")
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(rows[0].userid.as_deref(), Some("12345678901234567890"));
    }

    #[test]
    fn empty_upload_is_rejected() {
        assert!(read_lock_rows(b"").is_err());
    }

    #[test]
    fn non_utf8_upload_is_rejected() {
        assert!(read_lock_rows(b"userid\n\xff\xfe\n").is_err());
    }

    #[test]
    fn report_has_expected_columns_and_spelling() {
        let outcomes = vec![
            LockOutcome {
                userid: "123".to_owned(),
                success: true,
                status_code: Some(200),
                message: "{\"ok\":true}".to_owned(),
                duration: Duration::from_millis(1234),
            },
            LockOutcome {
                userid: "456".to_owned(),
                success: false,
                status_code: None,
                message: "versionInfo not found".to_owned(),
                duration: Duration::from_millis(5),
            },
        ];

        let report = write_lock_report(&outcomes).unwrap_or_else(|_| unreachable!());
        let report = String::from_utf8(report).unwrap_or_else(|_| unreachable!());

        assert_eq!(
            report,
            "userid,success,status_code,msg,duration_seconds\n\
             123,True,200,\"{\"\"ok\"\":true}\",1.234\n\
             456,False,,versionInfo not found,0.005\n"
        );
    }

    #[test]
    fn empty_report_still_has_header() {
        let report = write_lock_report(&[]).unwrap_or_else(|_| unreachable!());

        assert_eq!(
            String::from_utf8(report).unwrap_or_else(|_| unreachable!()),
            "userid,success,status_code,msg,duration_seconds\n"
        );
    }
}
