use tracing::warn;

use super::{isolate, Outcome};
use crate::catalog;
use crate::source::{DataSource, ResultSet};

/// Rows printed per query.
pub const PREVIEW_ROWS: usize = 20;

pub type QueryOutcome = Outcome<ResultSet>;

/// Run each named catalog query, printing a preview of its rows.
///
/// A failing query is logged and recorded; the rest still run.
pub fn run_queries<S: AsRef<str>>(ds: &DataSource, names: &[S]) -> Vec<QueryOutcome> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            println!("\n=== {} ===", name);
            let outcome = isolate(name, || ds.fetch(&catalog::get(name)?));
            match &outcome.result {
                Ok(rs) if rs.is_empty() => println!("(no rows)"),
                Ok(rs) => {
                    rs.preview(PREVIEW_ROWS).printstd();
                }
                Err(e) => warn!(query = %name, "skipped: {:#}", e),
            }
            outcome
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::fixture;
    use crate::report::failures;
    use crate::source::Scalar;

    #[test]
    fn test_exploratory_batch_runs() {
        let ds = fixture::shop();
        let outcomes = run_queries(&ds, catalog::EXPLORATORY);
        assert_eq!(outcomes.len(), catalog::EXPLORATORY.len());
        assert_eq!(failures(&outcomes), 0);

        let ratings = outcomes
            .iter()
            .find(|o| o.name == "product_ratings")
            .unwrap()
            .result
            .as_ref()
            .unwrap();
        // only the laptop has more than five reviews
        assert_eq!(ratings.row_count(), 1);
        assert_eq!(ratings.value(0, 0), Some(&Scalar::from("Laptop")));
    }

    #[test]
    fn test_failure_is_isolated_per_query() {
        let ds = fixture::shop();
        ds.execute_batch("DROP TABLE payment;").unwrap();
        let names = vec![
            "sample_orders".to_string(),
            "payment_methods".to_string(),
            "no_such_query".to_string(),
            "shipment_speed".to_string(),
        ];
        let outcomes = run_queries(&ds, &names);

        assert!(outcomes[0].is_ok());
        assert!(matches!(
            outcomes[1].result.as_ref().unwrap_err().downcast_ref::<ReportError>(),
            Some(ReportError::Query { .. })
        ));
        assert!(matches!(
            outcomes[2].result.as_ref().unwrap_err().downcast_ref::<ReportError>(),
            Some(ReportError::UnknownReport(_))
        ));
        let speed = outcomes[3].result.as_ref().unwrap();
        // DHL has one delivered shipment (3 days), UPS one (2 days)
        assert_eq!(speed.row_count(), 2);
    }
}
