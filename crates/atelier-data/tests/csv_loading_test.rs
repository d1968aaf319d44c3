//! Integration tests for loading CSV exports.

use atelier_data::{DataError, TransactionTable};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

fn write_fixture(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("atelier-data-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_csv_export() {
    let path = write_fixture(
        "sales.csv",
        "document_date,store_id,product_id,product_family,size,signed_quantity,subtotal,list_price,unit_cost,season_label\n\
         01/09/2024,MADRID01,ACT1,VESTIDOS,S,3,89.85,29.95,11.20,I25\n\
         15/12/2024,MADRID01,ACT1,VESTIDOS,M,1,29.95,29.95,11.20,I25\n\
         20/01/2025,ONLINE,ACT2,,L,-1,-39.95,39.95,14.00,I25\n",
    );

    let table = TransactionTable::from_csv_path(&path).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(
        table.date_range(),
        Some((
            NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
        ))
    );
    assert_eq!(table.stores().len(), 2);
    assert!(table.families().contains("Sin Familia"));

    let summary = table.summary();
    assert_eq!(summary.gross_units, 4.0);
    assert_eq!(summary.returned_units, 1.0);
}

#[test]
fn test_csv_without_optional_product_id() {
    let path = write_fixture(
        "no_product.csv",
        "document_date,store_id,product_family,size,signed_quantity,subtotal,list_price,unit_cost,season_label\n\
         2024-03-02,BCN02,CAMISAS,XS,2,40,20,8,V24\n",
    );

    let table = TransactionTable::from_csv_path(&path).unwrap();
    assert_eq!(table.as_slice()[0].product_id, "");
}

#[test]
fn test_csv_missing_required_column() {
    let path = write_fixture(
        "broken.csv",
        "fecha,store_id,product_family,size,signed_quantity,subtotal,list_price,unit_cost,season_label\n\
         2024-03-02,BCN02,CAMISAS,XS,2,40,20,8,V24\n",
    );

    let err = TransactionTable::from_csv_path(&path).unwrap_err();
    match err {
        DataError::MissingColumn { column } => assert_eq!(column, "document_date"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_csv_bad_date() {
    let path = write_fixture(
        "bad_date.csv",
        "document_date,store_id,product_family,size,signed_quantity,subtotal,list_price,unit_cost,season_label\n\
         2024-03-02,BCN02,CAMISAS,XS,2,40,20,8,V24\n\
         ayer,BCN02,CAMISAS,XS,2,40,20,8,V24\n",
    );

    let err = TransactionTable::from_csv_path(&path).unwrap_err();
    assert!(matches!(err, DataError::UnparseableDate { row: 1, .. }));
}
