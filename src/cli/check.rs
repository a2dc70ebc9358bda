//! `sift check`: compile a filter and print its canonical form.

use std::io::Write;

use super::CliError;
use crate::error::FilterError;
use crate::filter::compile;

/// Compile `source` and write the canonical text to `out`.
pub fn handle_check_command(source: &str, out: &mut impl Write) -> Result<(), CliError> {
    let expr = compile(source).map_err(|err| CliError::Filter {
        report: render_filter_error(source, &err),
        source: err,
    })?;
    writeln!(out, "{}", expr)?;
    Ok(())
}

/// Error message with the offending line and a caret under the column.
pub fn render_filter_error(source: &str, err: &FilterError) -> String {
    let mut report = format!("error[{}]: {}", err.error_code(), err.user_message());
    let Some(pos) = err.position().filter(|pos| pos.is_known()) else {
        return report;
    };
    if let Some(line) = source.lines().nth(pos.line as usize - 1) {
        let pad = line
            .chars()
            .take(pos.column as usize - 1)
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect::<String>();
        report.push_str(&format!("\n  {}\n  {}^", line, pad));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prints_canonical_form() {
        let mut out = Vec::new();
        handle_check_command("NAME=='x'  AND age>1", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "NAME == 'x' and age > 1\n");
    }

    #[test]
    fn test_reports_error_with_caret() {
        let mut out = Vec::new();
        let err = handle_check_command("age > 'x'", &mut out).unwrap_err();
        assert!(out.is_empty());
        assert_eq!(
            err.to_string(),
            "error[E_FILTER_TYPE]: Operator '>' needs a number value but got string at 1:7.\n  age > 'x'\n        ^"
        );
    }

    #[test]
    fn test_report_on_second_line() {
        let err = compile("a == 1 and\n  b >").unwrap_err();
        let report = render_filter_error("a == 1 and\n  b >", &err);
        assert!(report.starts_with("error[E_FILTER_PRIMARY]"));
        assert!(report.ends_with("\n    b >\n       ^"));
    }
}
