use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use registry_model::{SiteCode, TumorGroups};
use registry_report::CaseTabulation;

use crate::types::{CommandResult, StageSummary};

pub fn print_summary(result: &CommandResult) {
    println!("Command: {}", result.command);
    for input in &result.inputs {
        println!("Input: {}", input.display());
    }
    if !result.stages.is_empty() {
        println!("{}", stage_table(&result.stages));
    }
    if let Some(tabulation) = &result.tabulation {
        println!("{}", tabulation_table(tabulation));
    }
    if let Some(curves) = &result.curves {
        println!(
            "Curves: {} in {} figures, {} empty partitions",
            curves.curves,
            curves.figures,
            curves.empty_partitions.len()
        );
    }
    if let Some(path) = &result.manifest {
        println!("Run manifest: {}", path.display());
    }
    if !result.artifacts.is_empty() {
        println!("Artifacts: {}", result.artifacts.len());
        for path in &result.artifacts {
            println!("  {}", path.display());
        }
    }
    if !result.skipped_files.is_empty() {
        eprintln!("Skipped inputs:");
        for skipped in &result.skipped_files {
            eprintln!("- {}: {}", skipped.path.display(), skipped.reason);
        }
    }
    if !result.errors.is_empty() {
        eprintln!("Errors:");
        for error in &result.errors {
            eprintln!("- {error}");
        }
    }
}

pub fn stage_table(stages: &[StageSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("In"),
        header_cell("Out"),
        header_cell("Notes"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for stage in stages {
        let out = if stage.output < stage.input {
            Cell::new(stage.output).fg(Color::Yellow)
        } else {
            Cell::new(stage.output)
        };
        table.add_row(vec![
            Cell::new(&stage.stage)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(stage.input),
            out,
            note_cell(&stage.note),
        ]);
    }
    table
}

pub fn tabulation_table(tabulation: &CaseTabulation) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Region"),
        header_cell("Sex"),
        header_cell("Tumor group"),
        header_cell("Cases"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    for row in &tabulation.rows {
        table.add_row(vec![
            Cell::new(&row.region),
            Cell::new(&row.sex),
            Cell::new(&row.group),
            Cell::new(row.cases),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        Cell::new(tabulation.total).add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn groups_table(groups: &TumorGroups) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Tumor group"), header_cell("Site codes")]);
    apply_table_style(&mut table);
    for group in groups.iter() {
        let codes: Vec<&str> = group.site_codes.iter().map(SiteCode::as_str).collect();
        table.add_row(vec![
            Cell::new(&group.name).add_attribute(Attribute::Bold),
            Cell::new(codes.join(", ")),
        ]);
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn note_cell(note: &str) -> Cell {
    if note.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(note)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
