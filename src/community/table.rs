//! Tabular growth-rate results.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use super::growth::GrowthRateRecord;

/// Column names of a growth-rate table, in order.
pub const GROWTH_RATE_COLUMNS: [&str; 10] = [
    "A_ID",
    "B_ID",
    "TYPE",
    "TOGETHER",
    "A_TOGETHER",
    "B_TOGETHER",
    "A_ALONE",
    "B_ALONE",
    "A_CHANGE",
    "B_CHANGE",
];

/// Growth-rate results, one row per community model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrowthRateTable {
    rows: Vec<GrowthRateRecord>,
}

impl GrowthRateTable {
    /// An empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Append a row.
    pub fn push(&mut self, row: GrowthRateRecord) {
        self.rows.push(row);
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows, in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[GrowthRateRecord] {
        &self.rows
    }

    /// Row at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&GrowthRateRecord> {
        self.rows.get(index)
    }

    /// Row for the community of `a_id` and `b_id`, in either order.
    #[must_use]
    pub fn find(&self, a_id: &str, b_id: &str) -> Option<&GrowthRateRecord> {
        self.rows.iter().find(|row| {
            (row.a_id == a_id && row.b_id == b_id) || (row.a_id == b_id && row.b_id == a_id)
        })
    }

    /// Iterate over rows.
    pub fn iter(&self) -> std::slice::Iter<'_, GrowthRateRecord> {
        self.rows.iter()
    }

    /// Write the table as CSV with a header row.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{}", GROWTH_RATE_COLUMNS.join(","))?;
        for row in &self.rows {
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{}",
                csv_field(&row.a_id),
                csv_field(&row.b_id),
                row.interaction,
                row.together,
                row.a_together,
                row.b_together,
                row.a_alone,
                row.b_alone,
                row.a_change,
                row.b_change,
            )?;
        }
        out.flush()
    }

    /// The table as a CSV string.
    #[must_use]
    pub fn to_csv_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail.
        let _ = self.write_csv(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl FromIterator<GrowthRateRecord> for GrowthRateTable {
    fn from_iter<I: IntoIterator<Item = GrowthRateRecord>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for GrowthRateTable {
    type Item = GrowthRateRecord;
    type IntoIter = std::vec::IntoIter<GrowthRateRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a GrowthRateTable {
    type Item = &'a GrowthRateRecord;
    type IntoIter = std::slice::Iter<'a, GrowthRateRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
