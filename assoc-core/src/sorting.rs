use std::cmp::Ordering;
use crate::{Comparator, Lookup, Scalar, SortOrder};

/// Compares two cells with missing values after present ones in either
/// direction. Two missing values tie. A numeric column treats cells that are
/// not numbers, such as "NA", as missing.
pub fn compare_null_last(a: &Scalar, b: &Scalar, comparator: Comparator, order: SortOrder) -> Ordering {
    match (!comparator.ranks(a), !comparator.ranks(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = comparator.compare(a, b);
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        }
    }
}

/// Stable sort of `rows` by the value at `sort_key`.
pub fn sort_rows<T: Lookup>(rows: Vec<T>, sort_key: &str, comparator: Comparator, order: SortOrder) -> Vec<T> {
    let mut keyed: Vec<(Scalar, T)> = rows.into_iter()
        .map(|row| (row.lookup(sort_key), row))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| compare_null_last(a, b, comparator, order));
    keyed.into_iter().map(|(_, row)| row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[derive(Debug, Clone, PartialEq)]
    struct Cell(&'static str, Scalar);

    impl Lookup for Cell {
        fn lookup(&self, path: &str) -> Scalar {
            match path {
                "value" => self.1.clone(),
                _ => Scalar::Null,
            }
        }
    }

    fn cells() -> Vec<Cell> {
        vec![
            Cell("a", Scalar::Int(3)),
            Cell("b", Scalar::Null),
            Cell("c", Scalar::Int(1)),
            Cell("d", Scalar::Text(String::new())),
            Cell("e", Scalar::Int(2)),
            Cell("f", Scalar::Int(1)),
        ]
    }

    fn names(rows: &[Cell]) -> Vec<&'static str> {
        rows.iter().map(|c| c.0).collect()
    }

    #[rstest]
    #[case(SortOrder::Ascending, vec!["c", "f", "e", "a", "b", "d"])]
    #[case(SortOrder::Descending, vec!["a", "e", "c", "f", "b", "d"])]
    fn test_missing_values_sort_last(#[case] order: SortOrder, #[case] expected: Vec<&str>) {
        let sorted = sort_rows(cells(), "value", Comparator::Numeric, order);
        assert_eq!(names(&sorted), expected);
    }

    #[test]
    fn test_sort_keeps_membership() {
        let sorted = sort_rows(cells(), "value", Comparator::Numeric, SortOrder::Descending);
        let mut sorted_names = names(&sorted);
        sorted_names.sort();
        assert_eq!(sorted_names, names(&cells()));
    }

    #[rstest]
    #[case(SortOrder::Ascending)]
    #[case(SortOrder::Descending)]
    fn test_mixed_numeric_and_text_column(#[case] order: SortOrder) {
        let rows: Vec<Cell> = (0..80i64)
            .map(|i| if i % 4 == 0 {
                Cell("na", Scalar::from("NA"))
            } else {
                Cell("n", Scalar::Int(i * 37 % 101))
            })
            .collect();
        let sorted = sort_rows(rows, "value", Comparator::Numeric, order);
        assert_eq!(sorted.len(), 80);

        let numbers: Vec<f64> = sorted.iter().filter_map(|cell| cell.1.as_f64()).collect();
        assert_eq!(numbers.len(), 60);
        let mut expected = numbers.clone();
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        if order == SortOrder::Descending {
            expected.reverse();
        }
        assert_eq!(numbers, expected);
        assert!(sorted[..60].iter().all(|cell| cell.0 == "n"));
        assert!(sorted[60..].iter().all(|cell| cell.0 == "na"));
    }

    #[test]
    fn test_text_sort() {
        let rows = vec![Cell("x", Scalar::from("b")), Cell("y", Scalar::from("A")), Cell("z", Scalar::Null)];
        let sorted = sort_rows(rows, "value", Comparator::Text, SortOrder::Ascending);
        assert_eq!(names(&sorted), vec!["y", "x", "z"]);
    }
}
