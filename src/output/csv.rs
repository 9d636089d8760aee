use anyhow::Result;

use crate::grid::{Classification, RateGrid};

pub fn rates_to_csv(grid: &RateGrid) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["date", "hotel", "rate", "classification"])?;
    for row in grid.rows() {
        for (hotel, cell) in grid.columns().iter().zip(&row.cells) {
            writer.write_record([
                row.date.format("%Y-%m-%d").to_string(),
                hotel.clone(),
                cell.value.map(|v| v.to_string()).unwrap_or_default(),
                classification_label(cell.classification).to_string(),
            ])?;
        }
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

fn classification_label(classification: Classification) -> &'static str {
    match classification {
        Classification::Unset => "",
        Classification::Baseline => "baseline",
        Classification::BelowBaseline => "below_baseline",
        Classification::TopK => "top_k",
        Classification::Normal => "normal",
    }
}
