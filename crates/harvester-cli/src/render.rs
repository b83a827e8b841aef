use std::io::{self, Write};

use harvester_core::{BusinessRecord, SearchResults};

const COLUMNS: [&str; 6] = ["Name", "Category", "Owner", "Email", "Phone", "Address"];

fn cells(record: &BusinessRecord) -> [&str; 6] {
    [
        record.name.as_str(),
        record.category.label(),
        cell(&record.owner),
        cell(&record.email),
        cell(&record.phone),
        cell(&record.address),
    ]
}

fn cell(field: &Option<String>) -> &str {
    match field.as_deref() {
        Some(v) if !v.trim().is_empty() => v,
        _ => "-",
    }
}

/// Writes an aligned plain text table
pub fn table<'a, W, I>(out: &mut W, records: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a BusinessRecord>,
{
    let rows: Vec<[&str; 6]> = records.into_iter().map(cells).collect();

    let mut widths = COLUMNS.map(|c| c.chars().count());
    for row in &rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    write_row(out, &COLUMNS, &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", rule.join("-+-"))?;
    for row in &rows {
        write_row(out, row, &widths)?;
    }
    Ok(())
}

fn write_row<W: Write>(out: &mut W, row: &[&str; 6], widths: &[usize; 6]) -> io::Result<()> {
    let padded: Vec<String> = row
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let pad = width.saturating_sub(value.chars().count());
            format!("{value}{}", " ".repeat(pad))
        })
        .collect();
    writeln!(out, "{}", padded.join(" | ").trim_end())
}

/// Per postal code counts followed by each group's table
pub fn breakdown<W: Write>(out: &mut W, results: &SearchResults) -> io::Result<()> {
    for group in &results.postal_code_breakdown {
        writeln!(
            out,
            "\n{} ({} businesses)",
            group.postal_code,
            group.businesses.len()
        )?;
        if !group.businesses.is_empty() {
            table(out, &group.businesses)?;
        }
    }
    Ok(())
}
