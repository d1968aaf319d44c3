//! File export of panel and forecast data.

use atelier_data::{Transaction, TransactionTable};
use atelier_features::{Month, MonthlyPanel, PanelBuilder, Target};
use atelier_output::{PanelRecord, export_forecast_csv, export_panel_csv, export_panel_json};
use chrono::NaiveDate;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("atelier-output-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn panel() -> MonthlyPanel {
    let start = Month::new(2024, 9).unwrap();
    let table: TransactionTable = (0..6)
        .map(|i| {
            let month = start.add_months(i);
            Transaction {
                document_date: NaiveDate::from_ymd_opt(month.year(), month.month(), 20).unwrap(),
                store_id: "T07".to_string(),
                product_id: "ABR-010".to_string(),
                product_family: "Abrigos".to_string(),
                size: "L".to_string(),
                signed_quantity: f64::from(i + 2),
                subtotal: f64::from(i + 2) * 90.0,
                list_price: 90.0,
                unit_cost: 38.0,
                season_label: "I25".to_string(),
            }
        })
        .collect();
    PanelBuilder::default().build(&table, 3).unwrap()
}

#[test]
fn test_panel_files() {
    let dir = scratch_dir("panel");
    let panel = panel();

    let csv_path = dir.join("panel.csv");
    export_panel_csv(&panel, &csv_path).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 1 + 9);

    let json_path = dir.join("panel.json");
    export_panel_json(&panel, &json_path).unwrap();
    let records: Vec<PanelRecord> =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(records.len(), 9);
    assert_eq!(records.iter().filter(|r| r.is_future).count(), 3);
    assert_eq!(records[5].qty_in_season, Some(7.0));
    assert_eq!(records[6].qty_in_season, None);
}

#[test]
fn test_forecast_file() {
    let dir = scratch_dir("forecast");
    let mut panel = panel();
    let entity = panel.entities()[0].clone();
    for (i, month) in panel.future_months().into_iter().enumerate() {
        panel.set_prediction(&entity, month, Target::InSeason, 3.0 + i as f64);
        panel.set_prediction(&entity, month, Target::OutOfSeason, 1.0);
    }

    let path = dir.join("forecast.csv");
    export_forecast_csv(&panel, &path).unwrap();
    let csv = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(
        lines[0],
        "store,family,size,month,pred_qty_in_season,pred_qty_out_of_season,pred_qty_total"
    );
    assert_eq!(lines[1], "T07,Abrigos,L,2025-03,3.0,1.0,4.0");
    assert_eq!(lines.len(), 4);
}
