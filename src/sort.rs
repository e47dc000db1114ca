use std::cmp::Ordering;

use crate::infer::ColumnType;
use crate::stats::parse_float;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Per-grid sort state: at most one column is sorted at a time.
///
/// Toggling the active column cycles ascending -> descending -> unsorted;
/// selecting a different column resets it to ascending.
#[derive(Debug, Default)]
pub struct SortPolicy {
    active: Option<(usize, SortOrder)>,
}

impl SortPolicy {
    pub fn active(&self) -> Option<(usize, SortOrder)> {
        self.active
    }

    pub fn order_for(&self, column: usize) -> Option<SortOrder> {
        match self.active {
            Some((c, order)) if c == column => Some(order),
            _ => None,
        }
    }

    /// Advance the state machine for a sort gesture on `column` and return
    /// the new order (None = back to the original load order).
    pub fn toggle(&mut self, column: usize) -> Option<SortOrder> {
        self.active = match self.active {
            Some((c, SortOrder::Ascending)) if c == column => {
                Some((column, SortOrder::Descending))
            }
            Some((c, SortOrder::Descending)) if c == column => None,
            _ => Some((column, SortOrder::Ascending)),
        };
        self.order_for(column)
    }

    /// Forget the active sort, e.g. when a new dataset replaces the grid.
    pub fn reset(&mut self) {
        self.active = None;
    }
}

/// Comparator for two raw cells of a column with the given inferred type.
///
/// Number columns parse both operands as floats first; a null or unparseable
/// cell becomes NaN. `sort_by` requires a total order, so NaN cells sort
/// after every valid number and compare equal among themselves, which keeps
/// them clustered while the stable sort preserves their relative order. Date
/// and Text columns compare the raw values, with null ordering before any
/// value.
pub fn compare_cells(ty: ColumnType, a: Option<&str>, b: Option<&str>) -> Ordering {
    match ty {
        ColumnType::Number => {
            let fa = a.map(parse_float).unwrap_or(f64::NAN);
            let fb = b.map(parse_float).unwrap_or(f64::NAN);
            match fa.partial_cmp(&fb) {
                Some(ord) => ord,
                None if fa.is_nan() && fb.is_nan() => Ordering::Equal,
                None if fa.is_nan() => Ordering::Greater,
                None => Ordering::Less,
            }
        }
        ColumnType::Date | ColumnType::Text => a.cmp(&b),
    }
}

/// Stable sort of a row-index mapping by the given column values. Equal keys
/// keep their current relative order.
pub fn sort_rows(
    rows: &mut [usize],
    values: &[Option<String>],
    ty: ColumnType,
    order: SortOrder,
) {
    rows.sort_by(|&ia, &ib| {
        let ord = compare_cells(ty, values[ia].as_deref(), values[ib].as_deref());
        match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn toggle_cycles_through_the_three_states() {
        let mut policy = SortPolicy::default();
        assert_eq!(policy.toggle(0), Some(SortOrder::Ascending));
        assert_eq!(policy.toggle(0), Some(SortOrder::Descending));
        assert_eq!(policy.toggle(0), None);
        assert_eq!(policy.toggle(0), Some(SortOrder::Ascending));
    }

    #[test]
    fn selecting_another_column_resets_to_ascending() {
        let mut policy = SortPolicy::default();
        policy.toggle(0);
        policy.toggle(0); // column 0 descending
        assert_eq!(policy.toggle(2), Some(SortOrder::Ascending));
        assert_eq!(policy.order_for(0), None);
        assert_eq!(policy.active(), Some((2, SortOrder::Ascending)));
    }

    #[test]
    fn numeric_comparison_parses_before_comparing() {
        // Lexicographically "10" < "9"; numerically it is not.
        let ord = compare_cells(ColumnType::Number, Some("10"), Some("9"));
        assert_eq!(ord, Ordering::Greater);
    }

    #[test]
    fn unparseable_numeric_cells_sort_after_numbers() {
        assert_eq!(
            compare_cells(ColumnType::Number, Some("oops"), Some("1")),
            Ordering::Greater
        );
        assert_eq!(
            compare_cells(ColumnType::Number, Some("1"), None),
            Ordering::Less
        );
        assert_eq!(
            compare_cells(ColumnType::Number, None, Some("oops")),
            Ordering::Equal
        );
    }

    #[test]
    fn text_nulls_order_first() {
        assert_eq!(
            compare_cells(ColumnType::Text, None, Some("a")),
            Ordering::Less
        );
    }

    #[test]
    fn ascending_then_descending_reverses_without_ties() {
        let values = col(&[Some("3"), Some("1"), Some("2")]);
        let mut rows: Vec<usize> = (0..3).collect();
        sort_rows(&mut rows, &values, ColumnType::Number, SortOrder::Ascending);
        assert_eq!(rows, vec![1, 2, 0]);
        let mut reversed: Vec<usize> = (0..3).collect();
        sort_rows(
            &mut reversed,
            &values,
            ColumnType::Number,
            SortOrder::Descending,
        );
        assert_eq!(reversed, vec![0, 2, 1]);
        rows.reverse();
        assert_eq!(rows, reversed);
    }

    #[test]
    fn ties_keep_their_original_relative_order() {
        let values = col(&[Some("b"), Some("a"), Some("b"), Some("a")]);
        let mut rows: Vec<usize> = (0..4).collect();
        sort_rows(&mut rows, &values, ColumnType::Text, SortOrder::Ascending);
        assert_eq!(rows, vec![1, 3, 0, 2]);
    }

    #[test]
    fn unparseable_cells_cluster_after_valid_numbers() {
        let values = col(&[Some("2"), Some("x"), Some("1"), Some("y")]);
        let mut rows: Vec<usize> = (0..4).collect();
        sort_rows(&mut rows, &values, ColumnType::Number, SortOrder::Ascending);
        // NaN cells cluster at the end, keeping their relative order.
        assert_eq!(rows, vec![2, 0, 1, 3]);
    }

    #[test]
    fn date_columns_sort_lexicographically() {
        let values = col(&[Some("2022-01-01"), Some("2021-12-31"), Some("2021-01-01")]);
        let mut rows: Vec<usize> = (0..3).collect();
        sort_rows(&mut rows, &values, ColumnType::Date, SortOrder::Ascending);
        assert_eq!(rows, vec![2, 1, 0]);
    }
}
