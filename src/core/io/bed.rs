use std::io::BufRead;
use std::ops::Range;
use std::path::Path;

use bio_types::genome::{AbstractInterval, Interval, Position};
use derive_getters::Dissolve;

use crate::core::error::{PileupError, Result};
use crate::core::io::utils::read_compressed;

#[derive(Eq, PartialEq, Debug, Dissolve)]
pub struct BedRecord {
    pub name: String,
    pub interval: Interval,
}

impl AbstractInterval for BedRecord {
    fn contig(&self) -> &str {
        self.interval.contig()
    }

    fn range(&self) -> Range<Position> {
        self.interval.range()
    }
}

fn is_header(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("track") || line.starts_with("browser")
}

fn _parse<T: BufRead>(mut reader: T) -> Result<Vec<BedRecord>> {
    let mut records = Vec::new();

    let mut buf = String::new();
    let mut lineno = 0;
    while reader.read_line(&mut buf)? != 0 {
        lineno += 1;
        let line = buf.trim();
        if line.is_empty() || is_header(line) {
            buf.clear();
            continue;
        }
        let split: Vec<&str> = line.split('\t').take(4).collect();
        if split.len() < 3 {
            return Err(PileupError::config(format!("BED line {} has less than 3 columns: {}", lineno, line)));
        }

        let coordinate = |x: &str| -> Result<Position> {
            x.parse()
                .map_err(|_| PileupError::config(format!("BED line {}: failed to parse coordinate {}", lineno, x)))
        };
        let (start, end) = (coordinate(split[1])?, coordinate(split[2])?);
        if start >= end {
            return Err(PileupError::config(format!("BED line {}: empty interval {}-{}", lineno, start, end)));
        }
        let interval = Interval::new(split[0].to_owned(), Range { start, end });

        let name = match split.get(3) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{}:{}-{}", split[0], start + 1, end),
        };

        records.push(BedRecord { name, interval });
        buf.clear();
    }
    Ok(records)
}

/// Plain or gzipped BED file.
pub fn parse(bed: impl AsRef<Path>) -> Result<Vec<BedRecord>> {
    let bed = bed.as_ref();
    read_compressed!(bed, _parse)
}
