use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

use derive_getters::Getters;

use crate::core::error::{PileupError, Result};
use crate::core::io::fasta::FastaReader;
use crate::core::io::utils::read_compressed;
use crate::core::variant::VariantID;

const CHROMOSOME: &str = "Chromosome";
const START: &str = "Start_Position";
const END: &str = "End_Position";
const REFERENCE: &str = "Reference_Allele";
const ALTERNATIVE: &str = "Tumor_Seq_Allele2";
const VARIANT_TYPE: &str = "Variant_Type";
const GENE: &str = "Hugo_Symbol";
const PROTEIN_CHANGE: &str = "HGVSp_Short";

/// Per-sample columns. Meaningless for the re-genotyped sample, so they are cleared in the output.
const SAMPLE_COLUMNS: [&str; 8] = [
    "Tumor_Sample_Barcode",
    "Matched_Norm_Sample_Barcode",
    "t_depth",
    "t_ref_count",
    "t_alt_count",
    "n_depth",
    "n_ref_count",
    "n_alt_count",
];

pub const COUNT_COLUMNS: [&str; 4] = ["total_depth", "total_alt_count", "unique_depth", "unique_alt_count"];

#[derive(Clone, Eq, PartialEq, Debug, Getters)]
pub struct Candidate {
    id: VariantID,
    name: String,
    // One value per header column
    fields: Vec<String>,
}

/// Candidate variants in input order, together with the layout of the source table.
#[derive(Clone, Debug, Getters)]
pub struct CandidateTable {
    header: Vec<String>,
    candidates: Vec<Candidate>,
    #[getter(skip)]
    sample_columns: Vec<usize>,
    #[getter(skip)]
    type_column: usize,
}

impl CandidateTable {
    fn column(header: &[String], name: &str) -> Option<usize> {
        header.iter().position(|x| x == name)
    }

    pub fn output_header(&self) -> String {
        self.header.iter().map(String::as_str).chain(COUNT_COLUMNS).collect::<Vec<_>>().join("\t")
    }

    /// Source columns of a single candidate with the sample-specific ones cleared.
    pub fn fields(&self, candidate: &Candidate) -> Vec<String> {
        let mut fields = candidate.fields.clone();
        for ind in &self.sample_columns {
            fields[*ind].clear();
        }
        fields
    }

    /// Columns for a set of co-occurring candidates spanning [start, end].
    pub fn composite(&self, members: &[&Candidate], start: u64, end: u64) -> Vec<String> {
        let mut fields = vec![String::new(); self.header.len()];
        let name = members.iter().map(|x| x.name.as_str()).collect::<Vec<_>>().join("+");
        fields[self.type_column] = format!("COMPOSITE:{}", name);

        let contig = members.first().map(|x| x.id.contig().clone()).unwrap_or_default();
        for (column, value) in [(CHROMOSOME, contig), (START, start.to_string()), (END, end.to_string())] {
            if let Some(ind) = CandidateTable::column(&self.header, column) {
                fields[ind] = value;
            }
        }
        fields
    }
}

fn name(fields: &[String], header: &[String], id: &VariantID) -> String {
    let get = |column| CandidateTable::column(header, column).map(|x| fields[x].as_str()).filter(|x| !x.is_empty());
    match (get(GENE), get(PROTEIN_CHANGE)) {
        (Some(gene), Some(change)) => format!("{}.{}", gene, change.strip_prefix("p.").unwrap_or(change)),
        _ => id.to_string(),
    }
}

struct Columns {
    contig: usize,
    position: usize,
    refallele: usize,
    altallele: usize,
    etype: usize,
}

fn variant(fields: &[String], columns: &Columns, line: usize, reference: &mut impl FastaReader) -> Result<VariantID> {
    let contig = fields[columns.contig].as_str();
    let position: u64 = fields[columns.position]
        .trim()
        .parse()
        .map_err(|_| PileupError::unsupported(line, format!("unparsable position {}", fields[columns.position])))?;
    if position == 0 {
        return Err(PileupError::unsupported(line, "position must be 1-based"));
    }
    let refallele = fields[columns.refallele].trim().to_ascii_uppercase();
    let altallele = fields[columns.altallele].trim().to_ascii_uppercase();
    let etype = fields[columns.etype].trim();

    let mut anchor = |pos: u64| -> Result<u8> {
        reference
            .fetch(contig, (pos - 1)..pos)
            .map_err(|_| PileupError::unsupported(line, format!("no reference sequence for {}:{}", contig, pos)))?;
        Ok(reference.result()[0])
    };
    let mismatch = || PileupError::unsupported(line, format!("alleles {}>{} don't match type {}", refallele, altallele, etype));

    match etype {
        "SNP" => {
            if refallele.len() != 1 || altallele.len() != 1 {
                return Err(mismatch());
            }
            Ok(VariantID::snv(contig, position, refallele.as_bytes()[0], altallele.as_bytes()[0]))
        }
        "DNP" | "TNP" | "MNP" | "MNV" | "ONP" => {
            if refallele.len() < 2 || refallele.len() != altallele.len() {
                return Err(mismatch());
            }
            Ok(VariantID::substitution(contig, position, refallele.as_bytes(), altallele.as_bytes()))
        }
        "INS" | "DEL" if refallele != "-" && altallele != "-" => {
            Err(PileupError::unsupported(line, format!("complex event {}>{}", refallele, altallele)))
        }
        "INS" => {
            if altallele == "-" || altallele.is_empty() {
                return Err(mismatch());
            }
            let base = anchor(position)?;
            Ok(VariantID::insertion(contig, position, base, altallele.as_bytes()))
        }
        "DEL" => {
            if refallele == "-" || refallele.is_empty() || position < 2 {
                return Err(mismatch());
            }
            let mut refbases = vec![anchor(position - 1)?];
            refbases.extend_from_slice(refallele.as_bytes());
            Ok(VariantID::deletion(contig, position - 1, &refbases))
        }
        _ => Err(PileupError::unsupported(line, format!("variant type {}", etype))),
    }
}

fn _parse<T: BufRead>(reader: T, reference: &mut impl FastaReader) -> Result<CandidateTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let required = |column: &str| {
        CandidateTable::column(&header, column)
            .ok_or_else(|| PileupError::config(format!("Candidates table has no {} column", column)))
    };
    let columns = Columns {
        contig: required(CHROMOSOME)?,
        position: required(START)?,
        refallele: required(REFERENCE)?,
        altallele: required(ALTERNATIVE)?,
        etype: required(VARIANT_TYPE)?,
    };
    let sample_columns = SAMPLE_COLUMNS.iter().filter_map(|x| CandidateTable::column(&header, x)).collect();

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for (ind, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map(|x| x.line() as usize).unwrap_or(ind + 2);

        let mut fields: Vec<String> = record.iter().take(header.len()).map(String::from).collect();
        fields.resize(header.len(), String::new());

        let id = match variant(&fields, &columns, line, reference) {
            Ok(id) => id,
            Err(e) if e.is_recoverable() => {
                tracing::warn!("Skipping candidate: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        };
        if !seen.insert(id.clone()) {
            tracing::debug!("Duplicated candidate {} at line {}", id, line);
            continue;
        }
        let name = name(&fields, &header, &id);
        candidates.push(Candidate { id, name, fields });
    }

    let type_column = columns.etype;
    Ok(CandidateTable { header, candidates, sample_columns, type_column })
}

/// Plain or gzipped MAF-like table. Indels are re-anchored using the reference.
pub fn parse(maf: impl AsRef<Path>, reference: &mut impl FastaReader) -> Result<CandidateTable> {
    let maf = maf.as_ref();
    read_compressed!(maf, _parse, reference)
}
