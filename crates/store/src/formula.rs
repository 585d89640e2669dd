//! Airtable `filterByFormula` builders.

use chrono::NaiveDate;

/// Quote a string literal for use inside a formula.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// `{field} = 'value'`
pub fn field_equals(field: &str, value: &str) -> String {
    format!("{{{field}}} = {}", quote(value))
}

/// True when the date field falls on `date`.
pub fn same_day(field: &str, date: NaiveDate) -> String {
    format!("IS_SAME({{{field}}}, '{}', 'day')", date.format("%Y-%m-%d"))
}

pub fn and(clauses: &[String]) -> String {
    format!("AND({})", clauses.join(", "))
}

pub fn or(clauses: &[String]) -> String {
    format!("OR({})", clauses.join(", "))
}

/// Matches any of the given record ids.
pub fn record_id_in<S: AsRef<str>>(ids: &[S]) -> String {
    let clauses: Vec<String> = ids
        .iter()
        .map(|id| format!("RECORD_ID() = {}", quote(id.as_ref())))
        .collect();
    or(&clauses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "'plain'");
        assert_eq!(quote("O'Brien"), r"'O\'Brien'");
        assert_eq!(quote(r"a\b"), r"'a\\b'");
    }

    #[test]
    fn test_field_equals() {
        assert_eq!(
            field_equals("Status", "Bulk Delivery Confirmed"),
            "{Status} = 'Bulk Delivery Confirmed'"
        );
    }

    #[test]
    fn test_route_by_name_formula() {
        let date = NaiveDate::from_ymd_opt(2020, 5, 2).unwrap();
        let formula = and(&[
            same_day("Delivery Date", date),
            field_equals("Name", "Route 3"),
        ]);
        assert_eq!(
            formula,
            "AND(IS_SAME({Delivery Date}, '2020-05-02', 'day'), {Name} = 'Route 3')"
        );
    }

    #[test]
    fn test_record_id_in() {
        assert_eq!(
            record_id_in(&["rec1", "rec2"]),
            "OR(RECORD_ID() = 'rec1', RECORD_ID() = 'rec2')"
        );
    }
}
