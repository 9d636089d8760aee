use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::grid::{Classification, RateCell, RateGrid};

const MISSING: &str = "N/A";
const FONT_SIZE: f64 = 14.0;
const ROW_HEIGHT: f64 = 21.0;
const HEADER_HEIGHT: f64 = 42.0;
const DATE_WIDTH: f64 = 9.0;
const AVAILABILITY_WIDTH: f64 = 14.0;
const RATE_WIDTH: f64 = 15.0;
const LAST_RATE_WIDTH: f64 = 16.0;

const GREEN: u32 = 0x92D050;
const RED: u32 = 0xFF7C80;
const YELLOW: u32 = 0xFFFF00;

#[derive(Debug, Clone)]
pub struct SheetWriter {
    pub sheet_name: String,
    pub availability_column: bool,
}

impl Default for SheetWriter {
    fn default() -> Self {
        Self {
            sheet_name: "Rates".to_string(),
            availability_column: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CellValue {
    Rate(f64),
    Text(&'static str),
}

fn cell_value(cell: &RateCell) -> CellValue {
    match cell.value {
        Some(rate) => CellValue::Rate(rate as f64),
        None => CellValue::Text(MISSING),
    }
}

struct SheetFormats {
    header: Format,
    date: Format,
    blank: Format,
    baseline: Format,
    below_baseline: Format,
    top_k: Format,
    plain: Format,
}

impl SheetFormats {
    fn new() -> Self {
        let base = Format::new()
            .set_font_size(FONT_SIZE)
            .set_border(FormatBorder::Thin);
        let rate = base.clone().set_align(FormatAlign::Center);
        Self {
            header: base
                .clone()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap(),
            date: base.clone().set_bold(),
            blank: base,
            baseline: rate.clone().set_background_color(GREEN),
            below_baseline: rate.clone().set_background_color(RED),
            top_k: rate.clone().set_background_color(YELLOW),
            plain: rate,
        }
    }

    fn for_cell(&self, cell: &RateCell) -> &Format {
        match cell.classification {
            Classification::Baseline => &self.baseline,
            Classification::BelowBaseline => &self.below_baseline,
            Classification::TopK => &self.top_k,
            Classification::Normal | Classification::Unset => &self.plain,
        }
    }
}

impl SheetWriter {
    pub fn new(availability_column: bool) -> Self {
        Self {
            availability_column,
            ..Self::default()
        }
    }

    pub fn save(&self, grid: &RateGrid, path: &Path) -> Result<()> {
        let mut workbook = self.build(grid)?;
        workbook
            .save(path)
            .with_context(|| format!("failed writing workbook: {}", path.display()))
    }

    pub fn render_to_bytes(&self, grid: &RateGrid) -> Result<Vec<u8>> {
        let mut workbook = self.build(grid)?;
        workbook
            .save_to_buffer()
            .context("failed serializing workbook")
    }

    fn first_rate_column(&self) -> u16 {
        if self.availability_column {
            2
        } else {
            1
        }
    }

    fn build(&self, grid: &RateGrid) -> Result<Workbook> {
        let formats = SheetFormats::new();
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.sheet_name)?;

        self.write_header(sheet, grid, &formats)?;
        self.write_rows(sheet, grid, &formats)?;
        self.apply_layout(sheet, grid)?;
        Ok(workbook)
    }

    fn write_header(
        &self,
        sheet: &mut Worksheet,
        grid: &RateGrid,
        formats: &SheetFormats,
    ) -> Result<()> {
        sheet.write_with_format(0, 0, "Date", &formats.header)?;
        if self.availability_column {
            sheet.write_with_format(0, 1, "Availability", &formats.header)?;
        }
        let first = self.first_rate_column();
        for (idx, name) in grid.columns().iter().enumerate() {
            sheet.write_with_format(0, first + idx as u16, name.as_str(), &formats.header)?;
        }
        Ok(())
    }

    fn write_rows(
        &self,
        sheet: &mut Worksheet,
        grid: &RateGrid,
        formats: &SheetFormats,
    ) -> Result<()> {
        let first = self.first_rate_column();
        for (idx, row) in grid.rows().iter().enumerate() {
            let r = idx as u32 + 1;
            let date = row.date.format("%m/%d").to_string();
            sheet.write_with_format(r, 0, date.as_str(), &formats.date)?;
            if self.availability_column {
                sheet.write_blank(r, 1, &formats.blank)?;
            }
            for (col, cell) in row.cells.iter().enumerate() {
                let c = first + col as u16;
                let format = formats.for_cell(cell);
                match cell_value(cell) {
                    CellValue::Rate(rate) => sheet.write_with_format(r, c, rate, format)?,
                    CellValue::Text(text) => sheet.write_with_format(r, c, text, format)?,
                };
            }
        }
        Ok(())
    }

    fn apply_layout(&self, sheet: &mut Worksheet, grid: &RateGrid) -> Result<()> {
        sheet.set_column_width(0, DATE_WIDTH)?;
        if self.availability_column {
            sheet.set_column_width(1, AVAILABILITY_WIDTH)?;
        }
        let first = self.first_rate_column();
        let width = grid.width();
        for col in 0..width {
            let w = if col + 1 == width {
                LAST_RATE_WIDTH
            } else {
                RATE_WIDTH
            };
            sheet.set_column_width(first + col as u16, w)?;
        }

        sheet.set_row_height(0, HEADER_HEIGHT)?;
        for idx in 0..grid.rows().len() {
            sheet.set_row_height(idx as u32 + 1, ROW_HEIGHT)?;
        }
        sheet.set_margins(0.25, 0.25, 0.75, 0.75, 0.3, 0.3);
        Ok(())
    }
}
