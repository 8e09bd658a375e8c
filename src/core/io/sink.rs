use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::error::Result;

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum Table {
    Pileup,
    Intervals,
    Genotypes,
    Signatures,
}

/// Every table exists in two flavours: built from all reads, or with duplicates excluded.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum Channel {
    All,
    Unique,
}

pub trait OutputSink {
    /// `row` is a complete tab-separated line without the trailing newline.
    fn write(&mut self, table: Table, channel: Channel, row: &str) -> Result<()>;
}

/// In-memory sink, replayed into another sink once the region is done.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct RowBuffer {
    rows: Vec<(Table, Channel, String)>,
}

impl RowBuffer {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self, table: Table, channel: Channel) -> impl Iterator<Item = &str> {
        self.rows.iter().filter(move |x| x.0 == table && x.1 == channel).map(|x| x.2.as_str())
    }

    pub fn replay(&mut self, sink: &mut impl OutputSink) -> Result<()> {
        for (table, channel, row) in self.rows.drain(..) {
            sink.write(table, channel, &row)?;
        }
        Ok(())
    }
}

impl OutputSink for RowBuffer {
    fn write(&mut self, table: Table, channel: Channel, row: &str) -> Result<()> {
        self.rows.push((table, channel, row.to_owned()));
        Ok(())
    }
}

/// Writes each (table, channel) pair into its own `<prefix>-<suffix>` file.
pub struct FileSink {
    files: HashMap<(Table, Channel), BufWriter<File>>,
}

impl FileSink {
    fn new(prefix: &Path, tables: &[(Table, Channel, &str, Option<&str>)]) -> Result<Self> {
        let mut files = HashMap::with_capacity(tables.len());
        for (table, channel, suffix, header) in tables {
            let mut file = BufWriter::new(File::create(FileSink::path(prefix, suffix))?);
            if let Some(header) = header {
                writeln!(file, "{}", header)?;
            }
            files.insert((*table, *channel), file);
        }
        Ok(Self { files })
    }

    fn path(prefix: &Path, suffix: &str) -> PathBuf {
        let mut name = prefix.as_os_str().to_owned();
        name.push("-");
        name.push(suffix);
        PathBuf::from(name)
    }

    pub fn metrics(prefix: &Path) -> Result<Self> {
        FileSink::new(
            prefix,
            &[
                (Table::Pileup, Channel::All, "pileup.txt", None),
                (Table::Pileup, Channel::Unique, "pileup-without-duplicates.txt", None),
                (Table::Intervals, Channel::All, "intervals.txt", None),
                (Table::Intervals, Channel::Unique, "intervals-without-duplicates.txt", None),
            ],
        )
    }

    pub fn genotypes(prefix: &Path, header: &str) -> Result<Self> {
        FileSink::new(prefix, &[(Table::Genotypes, Channel::All, "genotypes.maf", Some(header))])
    }

    pub fn signatures(prefix: &Path) -> Result<Self> {
        FileSink::new(prefix, &[(Table::Signatures, Channel::All, "signature-intervals.txt", None)])
    }

    pub fn flush(&mut self) -> Result<()> {
        for file in self.files.values_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

impl OutputSink for FileSink {
    fn write(&mut self, table: Table, channel: Channel, row: &str) -> Result<()> {
        // Tables the current module doesn't produce are silently dropped
        if let Some(file) = self.files.get_mut(&(table, channel)) {
            writeln!(file, "{}", row)?;
        }
        Ok(())
    }
}
