//! Teradata BTEQ script → Spark SQL.
//!
//! The exception job ran for years as a BTEQ script (see
//! `sql/exception_job.bteq`). This converter keeps that script portable:
//! it strips the BTEQ session shell, rewrites Teradata-only syntax and
//! folds volatile tables into a single leading `WITH` clause.
//!
//! The rewrite is textual. String literals are not parsed, so a `--`
//! inside a quoted value is treated as a comment.

use crate::error::LedgerResult;
use regex::Regex;
use std::path::Path;

/// BTEQ dot-commands that never reach the SQL engine.
const DOT_COMMANDS: &str = r"(?im)^\s*\.(LOGON|LOGOFF|SESSION|SET|QUIT|LABEL|GOTO|LOG)\b.*$";

/// Transaction and session keywords that have no Spark counterpart.
const SESSION_KEYWORDS: &str = r"(?im)^\s*(BT|ET|DATABASE|LOGON|LOGOFF|LABEL|GOTO)\b.*$";

const VOLATILE_TABLE: &str = r"(?is)CREATE\s+(?:MULTISET\s+|SET\s+)?VOLATILE\s+TABLE\s+(\w+)\s+AS\s*\((.*?)\)\s*WITH\s+DATA\s+(?:PRIMARY\s+INDEX\s*\([^)]*\)\s*)?ON\s+COMMIT\s+PRESERVE\s+ROWS\s*;";

pub struct BteqConverter {
    dot_commands: Regex,
    line_comment: Regex,
    block_comment: Regex,
    session_keywords: Regex,
    volatile_table: Regex,
    volatile_drop: Regex,
    /// Applied in order. Date arithmetic must precede the bare
    /// `CURRENT_DATE` rewrite or it would never match.
    rewrites: Vec<(Regex, &'static str)>,
}

impl BteqConverter {
    pub fn new() -> LedgerResult<Self> {
        let rules: &[(&str, &'static str)] = &[
            (
                r"(?i)\bCURRENT_DATE\s*([+-])\s*(\d+)\b",
                "current_date() ${1} INTERVAL ${2} DAYS",
            ),
            (
                r"(?i)\b(\d+)\s+(DAY|MONTH|YEAR)\(S\)\s+FROM\s+CURRENT_DATE\b",
                "INTERVAL ${1} ${2}S",
            ),
            (r"(?i)\bCURRENT_DATE\b(\s*\(\s*\))?", "current_date()"),
            (r"(?i)\bTRIM\(\s*BOTH\s+' '\s+FROM\s+(.*?)\)", "TRIM(${1})"),
            (
                r"(?i)\bSUBSTRING\((.*?)\s+FROM\s+(.*?)\s+FOR\s+(.*?)\)",
                "SUBSTRING(${1}, ${2}, ${3})",
            ),
            (r"(?i)\bPOSITION\((.*?)\s+IN\s+(.*?)\)", "INSTR(${2}, ${1})"),
            (r"(?i)\bCHARACTER_LENGTH\(", "LENGTH("),
            (r"(?i)\bINNER\s+JOIN\b", "JOIN"),
            (r"(?i)\bLEFT\s+OUTER\s+JOIN\b", "LEFT JOIN"),
            (r"(?i)\bRIGHT\s+OUTER\s+JOIN\b", "RIGHT JOIN"),
            (r"(?i)\bFULL\s+OUTER\s+JOIN\b", "FULL JOIN"),
            (
                r"(?i)WITH\s+DATA\s*\n\s*ON\s+COMMIT\s+PRESERVE\s+ROWS",
                "WITH DATA ON COMMIT PRESERVE ROWS",
            ),
        ];
        let rewrites = rules
            .iter()
            .map(|(pattern, replacement)| Ok((Regex::new(pattern)?, *replacement)))
            .collect::<LedgerResult<Vec<_>>>()?;

        Ok(Self {
            dot_commands: Regex::new(DOT_COMMANDS)?,
            line_comment: Regex::new(r"(?m)--.*$")?,
            block_comment: Regex::new(r"(?s)/\*.*?\*/")?,
            session_keywords: Regex::new(SESSION_KEYWORDS)?,
            volatile_table: Regex::new(VOLATILE_TABLE)?,
            volatile_drop: Regex::new(r"(?i)DROP\s+TABLE\s+volatile_\w+\s*;")?,
            rewrites,
        })
    }

    /// Strip dot-commands, comments and blank lines.
    pub fn extract_sql(&self, script: &str) -> String {
        let sql = self.dot_commands.replace_all(script, "");
        let sql = self.line_comment.replace_all(&sql, "");
        let sql = self.block_comment.replace_all(&sql, "");
        drop_blank_lines(&sql)
    }

    /// Rewrite extracted BTEQ SQL into Spark SQL.
    pub fn to_spark_sql(&self, sql: &str) -> LedgerResult<String> {
        let mut sql = self.session_keywords.replace_all(sql, "").into_owned();
        for (pattern, replacement) in &self.rewrites {
            sql = pattern.replace_all(&sql, *replacement).into_owned();
        }

        let (sql, ctes) = self.volatile_to_ctes(&sql);
        let mut sql = self.volatile_drop.replace_all(&sql, "").into_owned();
        for name in ctes.iter().map(|(name, _)| name) {
            let drop = Regex::new(&format!(r"(?i)DROP\s+TABLE\s+{}\s*;", regex::escape(name)))?;
            sql = drop.replace_all(&sql, "").into_owned();
        }

        let body = drop_blank_lines(&sql);
        if ctes.is_empty() {
            return Ok(body);
        }
        let with = ctes
            .iter()
            .map(|(name, query)| format!("{name} AS (\n    {query}\n)"))
            .collect::<Vec<_>>()
            .join(",\n");
        Ok(format!("WITH {with}\n{body}").trim().to_string())
    }

    /// Full pipeline: extract, then rewrite.
    pub fn convert(&self, script: &str) -> LedgerResult<String> {
        self.to_spark_sql(&self.extract_sql(script))
    }

    /// Remove each volatile table definition, returning `(name, query)`
    /// pairs in script order.
    fn volatile_to_ctes(&self, sql: &str) -> (String, Vec<(String, String)>) {
        let ctes = self
            .volatile_table
            .captures_iter(sql)
            .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
            .collect();
        let rest = self.volatile_table.replace_all(sql, "").into_owned();
        (rest, ctes)
    }
}

/// Convert the BTEQ script at `input` and write Spark SQL to `output`.
pub fn convert_file(input: &Path, output: &Path) -> LedgerResult<()> {
    let script = std::fs::read_to_string(input)?;
    let spark = BteqConverter::new()?.convert(&script)?;
    std::fs::write(output, spark)?;
    log::info!("Converted {} -> {}", input.display(), output.display());
    Ok(())
}

fn drop_blank_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> BteqConverter {
        BteqConverter::new().unwrap()
    }

    #[test]
    fn extract_strips_shell_and_comments() {
        let script = ".LOGON tdprod/etl,secret;\n\
                      -- nightly run\n\
                      /* multi\n line */\n\
                      SELECT 1;\n\n\
                      .LOGOFF;\n";
        assert_eq!(converter().extract_sql(script), "SELECT 1;");
    }

    #[test]
    fn session_keywords_only_removed_at_line_start() {
        let sql = "BT;\nSELECT database_name FROM t;\nET;";
        assert_eq!(
            converter().to_spark_sql(sql).unwrap(),
            "SELECT database_name FROM t;"
        );
    }

    #[test]
    fn date_arithmetic_is_rewritten_before_bare_current_date() {
        let out = converter()
            .to_spark_sql("SELECT CURRENT_DATE - 7, CURRENT_DATE;")
            .unwrap();
        assert_eq!(out, "SELECT current_date() - INTERVAL 7 DAYS, current_date();");
    }

    #[test]
    fn string_functions_are_rewritten() {
        let out = converter()
            .to_spark_sql(
                "SELECT TRIM(BOTH ' ' FROM name), SUBSTRING(phone FROM 1 FOR 3), \
                 POSITION('@' IN email), CHARACTER_LENGTH(address) FROM customer_info;",
            )
            .unwrap();
        assert_eq!(
            out,
            "SELECT TRIM(name), SUBSTRING(phone, 1, 3), INSTR(email, '@'), LENGTH(address) FROM customer_info;"
        );
    }

    #[test]
    fn outer_joins_are_normalised() {
        let out = converter()
            .to_spark_sql("SELECT * FROM a LEFT OUTER JOIN b ON a.k = b.k INNER JOIN c ON c.k = a.k;")
            .unwrap();
        assert_eq!(out, "SELECT * FROM a LEFT JOIN b ON a.k = b.k JOIN c ON c.k = a.k;");
    }

    #[test]
    fn volatile_tables_become_one_with_clause_and_drops_vanish() {
        let sql = "CREATE MULTISET VOLATILE TABLE stg_a AS (\n  SELECT * FROM a WHERE s = 'x'\n) WITH DATA\nON COMMIT PRESERVE ROWS;\n\
                   CREATE VOLATILE TABLE volatile_b AS (SELECT * FROM b) WITH DATA PRIMARY INDEX (k) ON COMMIT PRESERVE ROWS;\n\
                   INSERT INTO out SELECT * FROM stg_a UNION ALL SELECT * FROM volatile_b;\n\
                   DROP TABLE stg_a;\n\
                   DROP TABLE volatile_b;";
        let out = converter().to_spark_sql(sql).unwrap();
        assert_eq!(
            out,
            "WITH stg_a AS (\n    SELECT * FROM a WHERE s = 'x'\n),\n\
             volatile_b AS (\n    SELECT * FROM b\n)\n\
             INSERT INTO out SELECT * FROM stg_a UNION ALL SELECT * FROM volatile_b;"
        );
    }

    #[test]
    fn script_without_volatile_tables_has_no_with_clause() {
        let out = converter().convert("DELETE FROM t WHERE d < CURRENT_DATE;").unwrap();
        assert_eq!(out, "DELETE FROM t WHERE d < current_date();");
    }
}
