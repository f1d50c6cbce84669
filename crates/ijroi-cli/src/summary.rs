use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use ijroi_format::{Roi, RoiArchive};

use crate::commands::CopyResult;

pub fn print_archives(archives: &[RoiArchive]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Archive"),
        header_cell("Group"),
        header_cell("Index"),
        header_cell("Kind"),
        header_cell("Points"),
        header_cell("Bounds"),
        header_cell("Subpixel"),
        header_cell("C/Z/T"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 6, CellAlignment::Center);
    let mut total = 0usize;
    for archive in archives {
        for (group, index, roi) in archive.iter() {
            total += 1;
            table.add_row(vec![
                Cell::new(&archive.name),
                Cell::new(group),
                dim_if_empty(index),
                Cell::new(roi.kind()).fg(Color::Cyan),
                Cell::new(roi.n_coordinates()),
                Cell::new(bounds_text(roi)),
                flag_cell(roi.is_subpixel()),
                Cell::new(position_text(roi)),
            ]);
        }
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        Cell::new(total).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    println!("{table}");
    print_skipped(archives);
}

fn print_skipped(archives: &[RoiArchive]) {
    let rows: Vec<_> = archives
        .iter()
        .flat_map(|archive| {
            archive
                .report
                .skipped
                .iter()
                .map(move |skipped| (archive.name.as_str(), skipped))
        })
        .collect();
    if rows.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Archive"),
        header_cell("Entry"),
        header_cell("Reason"),
    ]);
    apply_table_style(&mut table);
    for (archive, skipped) in rows {
        table.add_row(vec![
            Cell::new(archive),
            Cell::new(&skipped.entry),
            Cell::new(&skipped.reason).fg(Color::Yellow),
        ]);
    }
    println!();
    println!("Skipped records:");
    println!("{table}");
}

pub fn print_copy_result(result: &CopyResult) {
    println!("Written: {}", result.written);
    if result.unreadable > 0 {
        eprintln!("Unreadable records: {}", result.unreadable);
    }
    if !result.skipped.is_empty() {
        eprintln!("Skipped:");
        for (name, reason) in &result.skipped {
            eprintln!("- {name}: {reason}");
        }
    }
}

fn bounds_text(roi: &Roi) -> String {
    let rect = roi.bounding_rect();
    format!(
        "{},{} {}x{}",
        rect.left(),
        rect.top(),
        rect.width(),
        rect.height()
    )
}

fn position_text(roi: &Roi) -> String {
    let (c, z, t) = roi.position();
    format!("{c}/{z}/{t}")
}

fn flag_cell(value: bool) -> Cell {
    if value {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell("-")
    }
}

fn dim_if_empty(value: &str) -> Cell {
    if value.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(value)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).add_attribute(Attribute::Dim)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}
