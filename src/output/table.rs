use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::grid::{Classification, RateCell, RateGrid};

pub fn render_rates_table(grid: &RateGrid) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    let mut header = vec!["Date".to_string()];
    header.extend(grid.columns().iter().cloned());
    table.set_header(header);

    for row in grid.rows() {
        let mut cells = vec![Cell::new(row.date.format("%m/%d").to_string())];
        cells.extend(row.cells.iter().map(rate_cell));
        table.add_row(Row::from(cells));
    }
    table.to_string()
}

fn rate_cell(cell: &RateCell) -> Cell {
    let label = cell
        .value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let cell_out = Cell::new(label);
    match cell.classification {
        Classification::Baseline => cell_out.fg(Color::Green),
        Classification::BelowBaseline => cell_out.fg(Color::Red),
        Classification::TopK => cell_out.fg(Color::Yellow),
        Classification::Normal | Classification::Unset => cell_out,
    }
}
