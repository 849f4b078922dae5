//! Tabular export of run results.
//!
//! Columns are `SEC,ID,X,Y`, the layout existing tooling consumes. `SEC` is
//! written with 3 decimals, `X`/`Y` with 1. `ID` is empty for the unassigned
//! bucket.

use serde_derive::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

use crate::detection::Identity;
use crate::error::Error;
use crate::pipeline::RunResult;

pub const SEC_DECIMALS: i32 = 3;
pub const COORD_DECIMALS: i32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
struct CsvRecord {
    #[serde(rename = "SEC")]
    sec: f64,
    #[serde(rename = "ID")]
    id: Option<u32>,
    #[serde(rename = "X")]
    x: f32,
    #[serde(rename = "Y")]
    y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRow {
    pub timestamp: f64,
    pub identity: Identity,
    pub x: f32,
    pub y: f32,
}

impl From<CsvRecord> for ExportRow {
    fn from(r: CsvRecord) -> Self {
        Self {
            timestamp: r.sec,
            identity: Identity::from(r.id),
            x: r.x,
            y: r.y,
        }
    }
}

impl From<&ExportRow> for CsvRecord {
    fn from(r: &ExportRow) -> Self {
        Self {
            sec: round(r.timestamp, SEC_DECIMALS),
            id: r.identity.id(),
            x: round(r.x as f64, COORD_DECIMALS) as f32,
            y: round(r.y as f64, COORD_DECIMALS) as f32,
        }
    }
}

#[inline]
pub fn round(v: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);

    (v * scale).round() / scale
}

/// Rows ordered by timestamp, then identity (unassigned last).
pub fn rows(run: &RunResult) -> Vec<ExportRow> {
    let mut rows: Vec<_> = run
        .points()
        .map(|(timestamp, identity, p)| ExportRow {
            timestamp,
            identity,
            x: p.x,
            y: p.y,
        })
        .collect();

    rows.sort_by(|a, b| {
        a.timestamp
            .total_cmp(&b.timestamp)
            .then(a.identity.cmp(&b.identity))
    });

    rows
}

pub fn write_csv<W: Write>(run: &RunResult, out: W) -> Result<(), Error> {
    let mut writer = csv::Writer::from_writer(out);
    let rows = rows(run);

    for row in rows.iter() {
        writer.serialize(CsvRecord::from(row))?;
    }

    // header still goes out when no row was written
    if rows.is_empty() {
        writer.write_record(["SEC", "ID", "X", "Y"])?;
    }

    writer.flush()?;

    Ok(())
}

pub fn write_csv_file<P: AsRef<Path>>(run: &RunResult, path: P) -> Result<(), Error> {
    let file = std::fs::File::create(path)?;

    write_csv(run, std::io::BufWriter::new(file))
}

pub fn read_csv<R: Read>(input: R) -> Result<Vec<ExportRow>, Error> {
    let mut reader = csv::Reader::from_reader(input);

    reader
        .deserialize::<CsvRecord>()
        .map(|record| -> Result<ExportRow, Error> { Ok(record?.into()) })
        .collect()
}

pub fn read_csv_file<P: AsRef<Path>>(path: P) -> Result<Vec<ExportRow>, Error> {
    let file = std::fs::File::open(path)?;

    read_csv(std::io::BufReader::new(file))
}
