//! Fixtures shared by the integration tests

#![allow(dead_code)]

use rust_xlsxwriter::Workbook;

#[path = "../../src/pdf/test_support.rs"]
mod pdf_fixtures;

pub(crate) use pdf_fixtures::{labeled_pdf, page_labels};

/// Reference workbook: header row, then one row per (consecutive, record)
pub fn reference_workbook(rows: &[(u32, &str)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    sheet.write_string(0, 0, "consecutivo").unwrap();
    sheet.write_string(0, 1, "factura").unwrap();

    for (i, (id, record)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_number(row, 0, *id as f64).unwrap();
        sheet.write_string(row, 1, *record).unwrap();
    }

    workbook.save_to_buffer().unwrap()
}
