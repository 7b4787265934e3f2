use std::collections::BTreeMap;

use super::result::Scalar;
use crate::error::ReportError;

/// Named bind values for a query template.
pub type Params = BTreeMap<String, Scalar>;

/// Rewrite `:name` placeholders to positional `?` markers.
///
/// Returns the rewritten SQL and the values in marker order. A name used
/// twice is bound twice. `::type` casts, SQL comments and anything inside
/// single or double quotes are copied through untouched.
pub fn bind_named(
    query: &str,
    sql: &str,
    params: &Params,
) -> Result<(String, Vec<Scalar>), ReportError> {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut binds = Vec::new();
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                out.push(c);
                i += 1;
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                let end = chars[i..]
                    .iter()
                    .position(|&n| n == '\n')
                    .map_or(chars.len(), |p| i + p);
                out.extend(&chars[i..end]);
                i = end;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let end = chars[i + 2..]
                    .windows(2)
                    .position(|w| w[0] == '*' && w[1] == '/')
                    .map_or(chars.len(), |p| i + 2 + p + 2);
                out.extend(&chars[i..end]);
                i = end;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                out.push_str("::");
                i += 2;
            }
            ':' if chars
                .get(i + 1)
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') =>
            {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_')
                {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                let value = params
                    .get(&name)
                    .ok_or_else(|| ReportError::MissingParam {
                        name: query.to_string(),
                        param: name.clone(),
                    })?;
                binds.push(value.clone());
                out.push('?');
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok((out, binds))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, Scalar)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_rewrites_in_order() {
        let p = params(&[("t", "orders".into()), ("s", "main".into())]);
        let (sql, binds) = bind_named(
            "describe",
            "SELECT * FROM x WHERE s = :s AND t = :t",
            &p,
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM x WHERE s = ? AND t = ?");
        assert_eq!(binds, vec![Scalar::from("main"), Scalar::from("orders")]);
    }

    #[test]
    fn test_casts_and_literals_untouched() {
        let sql = "SELECT DATE_TRUNC('month', d)::date, ':not_a_param' FROM t WHERE id = :id";
        let p = params(&[("id", Scalar::Int(7))]);
        let (out, binds) = bind_named("q", sql, &p).unwrap();
        assert_eq!(
            out,
            "SELECT DATE_TRUNC('month', d)::date, ':not_a_param' FROM t WHERE id = ?"
        );
        assert_eq!(binds, vec![Scalar::Int(7)]);
    }

    #[test]
    fn test_comments_untouched() {
        let sql = "-- filter by :id\nSELECT /* :skip */ * FROM t WHERE id = :id /* :tail";
        let p = params(&[("id", Scalar::Int(3))]);
        let (out, binds) = bind_named("q", sql, &p).unwrap();
        assert_eq!(
            out,
            "-- filter by :id\nSELECT /* :skip */ * FROM t WHERE id = ? /* :tail"
        );
        assert_eq!(binds, vec![Scalar::Int(3)]);
    }

    #[test]
    fn test_repeated_name_binds_twice() {
        let p = params(&[("x", Scalar::Int(1))]);
        let (out, binds) = bind_named("q", "SELECT :x + :x", &p).unwrap();
        assert_eq!(out, "SELECT ? + ?");
        assert_eq!(binds.len(), 2);
    }

    #[test]
    fn test_missing_param() {
        let err = bind_named("describe_table", "SELECT :table", &Params::new()).unwrap_err();
        match err {
            ReportError::MissingParam { name, param } => {
                assert_eq!(name, "describe_table");
                assert_eq!(param, "table");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_params_is_identity() {
        let sql = "SELECT 1 AS one";
        let (out, binds) = bind_named("q", sql, &Params::new()).unwrap();
        assert_eq!(out, sql);
        assert!(binds.is_empty());
    }
}
