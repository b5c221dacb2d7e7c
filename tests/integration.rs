use std::collections::HashSet;

use groupby_engine::{
    processor::{
        AggregateOp, ProcessorError, Value,
        aggregate::Rounding,
        categorize::CategoryThresholds,
        grouped::{Group, GroupKey},
        loader::load_csv,
        table::{SortKey, Table},
    },
    sales::{self, CATEGORY_COLUMN, MONTH, PCT_COLUMN, PRODUCT, REGION, SALES, example_data},
};

fn row_where(table: &Table, region: &str, month: &str) -> usize {
    (0..table.row_count())
        .find(|&i| {
            table.value(i, REGION).unwrap() == Value::from(region)
                && table.value(i, MONTH).unwrap() == Value::from(month)
        })
        .unwrap()
}

#[test]
fn test_east_a_total_is_480() {
    let table = example_data().unwrap();
    let agg = sales::example_agg(&table).unwrap();
    assert_eq!(agg.value(0, "Sales_sum").unwrap(), Value::Int(480));

    let view = table.group_by(&[REGION, PRODUCT]).unwrap();
    let east_a = view.get(&GroupKey::from(vec!["East", "A"])).unwrap();
    assert_eq!(east_a.aggregate(SALES, AggregateOp::Sum).unwrap(), Value::Int(480));
}

#[test]
fn test_regional_categories() {
    let table = example_data().unwrap();
    let result =
        sales::regional_sales_category(&table, &CategoryThresholds::sales(SALES)).unwrap();

    let cases = [("East", "High"), ("North", "Medium"), ("West", "Low")];
    for (region, expected) in cases {
        for i in 0..result.row_count() {
            if result.value(i, REGION).unwrap() == Value::from(region) {
                assert_eq!(
                    result.value(i, CATEGORY_COLUMN).unwrap(),
                    Value::from(expected),
                    "region {region}"
                );
            }
        }
    }
}

#[test]
fn test_injected_labeler() {
    let table = example_data().unwrap();
    let labeler = |group: &Group<'_>| {
        let max = group.aggregate(SALES, AggregateOp::Max)?;
        Ok::<_, ProcessorError>(Value::from(format!("peak {max}")))
    };
    let result = sales::regional_sales_category(&table, &labeler).unwrap();

    let east = row_where(&result, "East", "Jan");
    assert_eq!(
        result.value(east, CATEGORY_COLUMN).unwrap(),
        Value::from("peak 280")
    );
    let north = row_where(&result, "North", "Jan");
    assert_eq!(
        result.value(north, CATEGORY_COLUMN).unwrap(),
        Value::from("peak 220")
    );
}

#[test]
fn test_percent_of_region_total() {
    let table = example_data().unwrap();
    let result = sales::example_transform(&table, Rounding::HalfEven).unwrap();

    let expected = [
        ("North", "Jan", 21.28),
        ("North", "Mar", 46.81),
        ("East", "Jan", 27.40),
        ("East", "Mar", 38.36),
        ("West", "Feb", 40.0),
    ];
    for (region, month, pct) in expected {
        let row = row_where(&result, region, month);
        let got = result.value(row, PCT_COLUMN).unwrap().as_f64().unwrap();
        assert!((got - pct).abs() < 1e-9, "{region} {month}: {got}");
    }
}

#[test]
fn test_multiindex_lookup_and_reset() {
    let table = example_data().unwrap();
    let totals = sales::multiindex_groupby_aggregation(&table).unwrap();

    assert_eq!(totals.index_names(), &[REGION, PRODUCT]);
    assert_eq!(
        totals
            .loc(&GroupKey::from(vec!["East", "A"]), SALES)
            .unwrap(),
        Value::Int(480)
    );
    assert_eq!(
        totals
            .loc(&GroupKey::from(vec!["North", "B"]), SALES)
            .unwrap(),
        Value::Int(370)
    );

    let flat = totals.reset_index();
    assert_eq!(flat.headers(), &[REGION, PRODUCT, SALES]);
    let row = (0..flat.row_count())
        .find(|&i| {
            flat.value(i, REGION).unwrap() == Value::from("West")
                && flat.value(i, PRODUCT).unwrap() == Value::from("A")
        })
        .unwrap();
    assert_eq!(flat.value(row, SALES).unwrap(), Value::Int(270));
}

#[test]
fn test_top_products_by_region() {
    let table = example_data().unwrap();
    let top = sales::top_products_by_region(&table, 150.0).unwrap();

    assert_eq!(top.row_count(), 2);
    assert_eq!(
        top.values(REGION).unwrap(),
        vec![Value::from("East"), Value::from("North")]
    );
    assert_eq!(
        top.values(PRODUCT).unwrap(),
        vec![Value::from("A"), Value::from("B")]
    );
    assert_eq!(
        top.values(SALES).unwrap(),
        vec![Value::Int(480), Value::Int(370)]
    );
}

#[test]
fn test_groups_partition_the_rows() {
    let table = example_data().unwrap();
    let view = table.group_by(&[REGION, PRODUCT]).unwrap();

    let mut seen = HashSet::new();
    let mut total = 0;
    for group in view.groups() {
        assert!(!group.is_empty());
        for &row in group.rows() {
            assert!(seen.insert(row), "row {row} in two groups");
        }
        total += group.len();
    }
    assert_eq!(total, table.row_count());
}

#[test]
fn test_aggregation_ignores_row_order() {
    let table = example_data().unwrap();
    let shuffled = table.take_rows(&[8, 3, 0, 5, 7, 1, 6, 2, 4]);

    let a = sales::example_agg(&table).unwrap();
    let b = sales::example_agg(&shuffled).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_transform_aligns_with_rows() {
    let table = example_data().unwrap();
    let shuffled = table.take_rows(&[4, 2, 7, 0, 8, 1, 3, 6, 5]);

    let means = shuffled
        .group_by(&[REGION])
        .unwrap()
        .transform(SALES, |values| {
            let sum: f64 = values.iter().map(|v| v.as_f64()).sum::<Result<f64, _>>()?;
            Ok(vec![Value::Float(sum / values.len() as f64); values.len()])
        })
        .unwrap();

    assert_eq!(means.len(), shuffled.row_count());
    for (i, mean) in means.iter().enumerate() {
        let expected = match shuffled.value(i, REGION).unwrap().as_str() {
            Some("East") => 730.0 / 3.0,
            Some("North") => 470.0 / 3.0,
            _ => 150.0,
        };
        assert!((mean.as_f64().unwrap() - expected).abs() < 1e-9);
    }
}

#[test]
fn test_group_filter_is_all_or_nothing() {
    let table = example_data().unwrap();
    let kept = sales::example_filter(&table).unwrap();

    let east_rows = table
        .values(REGION)
        .unwrap()
        .iter()
        .filter(|r| **r == Value::from("East"))
        .count();
    assert_eq!(kept.row_count(), east_rows);
    assert_eq!(
        kept.values(SALES).unwrap(),
        vec![Value::Int(200), Value::Int(280), Value::Int(250)]
    );
}

#[test]
fn test_csv_matches_builtin_data() {
    use std::io::Write;
    use tempfile::NamedTempFile;

    let table = example_data().unwrap();
    let mut tmp = NamedTempFile::new().unwrap();
    writeln!(tmp, "{REGION},{PRODUCT},{MONTH},{SALES}").unwrap();
    for i in 0..table.row_count() {
        let cells: Vec<String> = table
            .headers()
            .iter()
            .map(|h| table.value(i, h).unwrap().to_string())
            .collect();
        writeln!(tmp, "{}", cells.join(",")).unwrap();
    }

    let loaded = load_csv(tmp.path()).unwrap();
    assert_eq!(loaded, table);

    let sorted = loaded
        .sort_by(&[SortKey::desc(SALES)])
        .unwrap()
        .head(1);
    assert_eq!(sorted.value(0, SALES).unwrap(), Value::Int(280));
}

#[test]
fn test_schema_errors_surface() {
    let table = example_data().unwrap();
    assert!(table.group_by(&["Nope"]).unwrap_err().is_schema_error());
    assert!(
        table
            .group_by(&[REGION])
            .unwrap()
            .aggregate(PRODUCT, &[AggregateOp::Sum])
            .unwrap_err()
            .is_schema_error()
    );
}
