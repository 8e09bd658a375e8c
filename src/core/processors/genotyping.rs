use std::collections::HashSet;
use std::sync::Arc;

use derive_getters::Getters;
use itertools::Itertools;

use crate::core::error::{PileupError, Result};
use crate::core::io::maf::{Candidate, CandidateTable};
use crate::core::io::sink::{Channel, OutputSink, RowBuffer, Table};
use crate::core::rpileup::pileup::RegionPileupView;
use crate::core::variant::VariantID;

use super::PileupProcessor;

/// Max number of supported candidates combined into composites.
pub const MAX_COMPOSITE_MEMBERS: usize = 5;

/// Fragment counts for a single candidate or a composite.
#[derive(Clone, Copy, Default, Eq, PartialEq, Debug, Getters)]
pub struct Genotype {
    total_depth: usize,
    total_alt_count: usize,
    unique_depth: usize,
    unique_alt_count: usize,
}

#[derive(Clone)]
pub struct GenotypingProcessor {
    candidates: Arc<CandidateTable>,
    buffer: RowBuffer,
}

impl GenotypingProcessor {
    pub fn new(candidates: Arc<CandidateTable>) -> Self {
        Self { candidates, buffer: RowBuffer::default() }
    }

    /// Declared reference alleles must agree with the pileup, otherwise coordinates went wrong somewhere.
    fn check_reference(view: &RegionPileupView, id: &VariantID) -> Result<()> {
        let observed = view
            .index(id.contig(), *id.position())
            .and_then(|start| view.reference().get(start..start + id.refbases().len()));
        match observed {
            Some(observed) if observed.eq_ignore_ascii_case(id.refbases()) => Ok(()),
            _ => Err(PileupError::ReferenceMismatch {
                variant: id.to_string(),
                region: view.interval().to_string(),
                expected: String::from_utf8_lossy(id.refbases()).into_owned(),
                observed: String::from_utf8_lossy(observed.unwrap_or_default()).into_owned(),
            }),
        }
    }

    /// Members of each subset in candidate order: every singleton, then all co-occurring combinations of
    /// (at most [MAX_COMPOSITE_MEMBERS]) best supported candidates.
    fn subsets(support: &[HashSet<&str>]) -> Vec<Vec<usize>> {
        let mut supported = (0..support.len()).filter(|x| !support[*x].is_empty()).collect_vec();
        if supported.len() > MAX_COMPOSITE_MEMBERS {
            // Stable sort keeps the encounter order for ties
            supported.sort_by_key(|x| std::cmp::Reverse(support[*x].len()));
            supported.truncate(MAX_COMPOSITE_MEMBERS);
            supported.sort_unstable();
        }

        (0..support.len())
            .map(|x| vec![x])
            .chain(supported.into_iter().powerset().filter(|x| x.len() >= 2))
            .collect()
    }

    fn genotype(view: &RegionPileupView, members: &[&Candidate], support: &[&HashSet<&str>]) -> Result<Genotype> {
        let first = members[0].id();
        let (mut start, mut end) = (*first.position(), *first.end());
        for m in &members[1..] {
            if m.id().contig() != first.contig() {
                return Err(PileupError::ContigMismatch {
                    name: members.iter().map(|x| x.name().as_str()).join("+"),
                    first: first.contig().clone(),
                    second: m.id().contig().clone(),
                });
            }
            start = start.min(*m.id().position());
            end = end.max(*m.id().end());
        }

        let supporting: HashSet<&str> = match support.split_first() {
            Some((head, tail)) if support.iter().all(|x| !x.is_empty()) => {
                head.iter().filter(|x| tail.iter().all(|s| s.contains(*x))).copied().collect()
            }
            _ => HashSet::new(),
        };
        let (total_depth, unique_depth) = view.spanning(first.contig(), start, end);

        Ok(Genotype {
            total_depth,
            total_alt_count: supporting.len(),
            unique_depth,
            unique_alt_count: view.unique(&supporting),
        })
    }

    fn row(fields: Vec<String>, genotype: &Genotype) -> String {
        let counts = [
            genotype.total_depth,
            genotype.total_alt_count,
            genotype.unique_depth,
            genotype.unique_alt_count,
        ];
        fields.into_iter().chain(counts.iter().map(|x| x.to_string())).join("\t")
    }
}

impl PileupProcessor for GenotypingProcessor {
    fn receive(&mut self, view: &RegionPileupView) -> Result<()> {
        let candidates = self.candidates.candidates().iter().filter(|x| view.contains(x.id())).collect_vec();
        if candidates.is_empty() {
            return Ok(());
        }

        for c in &candidates {
            GenotypingProcessor::check_reference(view, c.id())?;
        }
        let support = candidates.iter().map(|x| view.supporting(x.id())).collect_vec();

        for subset in GenotypingProcessor::subsets(&support) {
            let members = subset.iter().map(|x| candidates[*x]).collect_vec();
            let msupport = subset.iter().map(|x| &support[*x]).collect_vec();
            let genotype = GenotypingProcessor::genotype(view, &members, &msupport)?;

            let fields = match members.as_slice() {
                [single] => self.candidates.fields(single),
                _ => {
                    let start = members.iter().map(|x| *x.id().position()).min().unwrap_or_default();
                    let end = members.iter().map(|x| *x.id().end()).max().unwrap_or_default();
                    self.candidates.composite(&members, start, end)
                }
            };
            self.buffer.write(Table::Genotypes, Channel::All, &GenotypingProcessor::row(fields, &genotype))?;
        }
        Ok(())
    }

    fn finalize_region(&mut self, sink: &mut impl OutputSink) -> Result<()> {
        self.buffer.replay(sink)
    }
}
