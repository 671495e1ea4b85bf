use serde::Serialize;
use std::error::Error;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Export `rows` to a CSV file and print a markdown preview of the first
/// `max_rows`, followed by a note pointing at the full export.
pub fn export_with_preview<T>(path: &str, rows: &[T], max_rows: usize) -> Result<(), Box<dyn Error>>
where
    T: Serialize + Tabled + Clone,
{
    write_csv(path, rows)?;
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
    } else {
        let table_str = Table::new(slice).with(Style::markdown()).to_string();
        println!("{}\n", table_str);
    }
    println!("(Full table exported to {})\n", path);
    Ok(())
}
