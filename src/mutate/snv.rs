//! Single nucleotide variant strategy.
//!
//! Every position of a sequence admitting a full kmer window is a mutation
//! candidate. A candidate enumerates its up to 3 alternative bases, queries
//! the counting table for every kmer the substitution would produce and, when
//! the sampling decision realizes the candidate, folds the collected
//! abundances into the inherited histograms.

use std::fmt;
use std::io;
use std::io::Write;

use log::{debug, log_enabled, trace, Level};

use crate::base::alphabet::{alternatives_of, is_acgt};
use crate::base::kmer::windows_over;
use crate::counttable::CountTableT;
use crate::error::{MutSimError, MutSimResult};

use super::{MutatorBase, MutatorT};


/// Transient scoring record for one candidate position.
/// It borrows the sequence, collects one abundance per (alternative, window)
/// pair and is folded into the owning mutator's histograms before being dropped.
struct SingleNucleotideVariant<'a> {
    sequence: &'a [u8],
    /// candidate position in sequence
    position: usize,
    /// the base present at position
    refbase: u8,
    /// one abundance per alternative base and overlapping window
    abunds: Vec<u32>,
}


impl<'a> SingleNucleotideVariant<'a> {
    /// enumerate the alternatives and the overlapping windows at position,
    /// query the counting table for each substituted kmer.
    /// The caller only scores positions of sequences of length >= ksize, so the
    /// window range always exists.
    fn score(
        sequence: &'a [u8],
        position: usize,
        ksize: usize,
        counttable: &dyn CountTableT,
    ) -> SingleNucleotideVariant<'a> {
        let refbase = sequence[position].to_ascii_uppercase();
        let (first, last) = windows_over(position, sequence.len(), ksize).unwrap();
        let mut abunds: Vec<u32> = Vec::with_capacity(3 * (last - first + 1));
        // one reusable buffer for the substituted kmer
        let mut kmer = vec![0u8; ksize];
        for alt in alternatives_of(refbase) {
            for w in first..=last {
                kmer.copy_from_slice(&sequence[w..w + ksize]);
                kmer[position - w] = alt;
                abunds.push(counttable.get_count(&kmer));
            }
        }
        SingleNucleotideVariant {
            sequence,
            position,
            refbase,
            abunds,
        }
    } // end of score

    /// write the candidate with a little sequence context around it
    fn print(&self, out: &mut dyn Write) -> io::Result<()> {
        let low = self.position.saturating_sub(5);
        let up = (self.position + 6).min(self.sequence.len());
        writeln!(
            out,
            "variant at position {} , base {} , context {} , abundances {:?}",
            self.position,
            self.refbase as char,
            String::from_utf8_lossy(&self.sequence[low..up]),
            self.abunds
        )
    } // end of print
} // end of impl SingleNucleotideVariant


/// Realizes single nucleotide substitutions over the sequences it processes.
pub struct MutatorSNV {
    base: MutatorBase,
    /// cumulative number of mutated positions across process calls
    nucl_count: u64,
}


impl MutatorSNV {
    /// ksize must be positive, maxabund bounds the histogram buckets,
    /// a limit of 0 means unlimited
    pub fn new(ksize: usize, maxabund: u32, limit: u64) -> MutSimResult<MutatorSNV> {
        let base = MutatorBase::new(ksize, maxabund, limit)?;
        Ok(MutatorSNV {
            base,
            nucl_count: 0,
        })
    } // end of new

    /// constructor with default maxabund and no limit
    pub fn with_ksize(ksize: usize) -> MutSimResult<MutatorSNV> {
        MutatorSNV::new(ksize, super::DEFAULT_MAXABUND, 0)
    }

    /// mutable access to the shared state, to configure sampling
    pub fn base_mut(&mut self) -> &mut MutatorBase {
        &mut self.base
    }

    /// sum another mutator's accumulators into this one, used by the parallel driver
    pub fn absorb(&mut self, other: &MutatorSNV) {
        self.base.merge_histograms(&other.base);
        self.nucl_count += other.nucl_count;
    }
} // end of impl MutatorSNV


impl MutatorT for MutatorSNV {
    fn process(&mut self, sequence: &[u8], counttable: &dyn CountTableT) -> MutSimResult<u64> {
        let ksize = self.base.get_ksize();
        if sequence.len() < ksize {
            // no position admits a full window, nothing to do and no draw consumed
            return Ok(0);
        }
        // whole call rejection : a malformed sequence must not touch any state
        if let Some(position) = sequence.iter().position(|&b| !is_acgt(b)) {
            return Err(MutSimError::Input { position });
        }
        //
        let mut nb_mutated: u64 = 0;
        for position in 0..sequence.len() {
            if self.base.limit_reached(self.nucl_count) {
                debug!(
                    "mutation limit {} reached, stopping early",
                    self.base.get_limit()
                );
                break;
            }
            // one draw per candidate position, never per alternative
            if self.base.skip_nucl() {
                continue;
            }
            let variant = SingleNucleotideVariant::score(sequence, position, ksize, counttable);
            if log_enabled!(Level::Trace) {
                let mut buf: Vec<u8> = Vec::new();
                let _ = variant.print(&mut buf);
                trace!("{}", String::from_utf8_lossy(&buf).trim_end());
            }
            self.base.record_variant(&variant.abunds);
            self.nucl_count += 1;
            nb_mutated += 1;
        } // end of for on position
        //
        Ok(nb_mutated)
    } // end of process

    fn get_mut_count(&self) -> u64 {
        self.nucl_count
    }

    fn base(&self) -> &MutatorBase {
        &self.base
    }

    fn print(&self, out: &mut dyn Write) -> io::Result<()> {
        self.base.print("snv", self.nucl_count, out)
    }
} // end of impl MutatorT for MutatorSNV


impl fmt::Display for MutatorSNV {
    /// thin forwarding convenience over [`MutatorT::print`]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut buf: Vec<u8> = Vec::new();
        self.print(&mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}


// ====================================================================================================
//   Some tests
// ====================================================================================================


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[allow(dead_code)]
    fn log_init_test() {
        let mut builder = env_logger::Builder::from_default_env();
        let _ = builder.is_test(true).try_init();
    }

    /// an oracle answering the same abundance for every kmer
    struct ConstTable {
        ksize: usize,
        abund: u32,
    }

    impl CountTableT for ConstTable {
        fn get_count(&self, _kmer: &[u8]) -> u32 {
            self.abund
        }
        fn insert_kmer(&mut self, _kmer: &[u8]) {}
        fn get_kmer_size(&self) -> usize {
            self.ksize
        }
        fn get_nb_distinct(&self) -> u64 {
            0
        }
        fn get_nb_unique(&self) -> u64 {
            0
        }
    }

    /// an oracle answering from a raw (non canonical) map, 0 when absent
    struct MapTable {
        ksize: usize,
        counts: HashMap<Vec<u8>, u32>,
    }

    impl CountTableT for MapTable {
        fn get_count(&self, kmer: &[u8]) -> u32 {
            *self.counts.get(kmer).unwrap_or(&0)
        }
        fn insert_kmer(&mut self, _kmer: &[u8]) {}
        fn get_kmer_size(&self) -> usize {
            self.ksize
        }
        fn get_nb_distinct(&self) -> u64 {
            self.counts.len() as u64
        }
        fn get_nb_unique(&self) -> u64 {
            0
        }
    }

    #[test]
    fn test_short_sequence_yields_nothing() {
        log_init_test();
        let table = ConstTable { ksize: 5, abund: 3 };
        let mut mutator = MutatorSNV::with_ksize(5).unwrap();
        mutator.base_mut().set_sampling_rate(1., 42).unwrap();
        let nb = mutator.process(b"ACG", &table).unwrap();
        assert_eq!(nb, 0);
        assert_eq!(mutator.get_mut_count(), 0);
        assert_eq!(mutator.base().get_abund_hist().entries(), 0);
        assert_eq!(mutator.base().get_unique_hist().entries(), 0);
    }

    // the concrete scenario : k=3, "ACGTA", rate 1, constant abundance 5.
    // every position keeps at least one window so all 5 positions are mutated,
    // window counts per position are 1,2,3,2,1 hence 9 windows and 27 queries.
    #[test]
    fn test_acgta_rate_one() {
        log_init_test();
        let table = ConstTable { ksize: 3, abund: 5 };
        let mut mutator = MutatorSNV::new(3, 16, 0).unwrap();
        mutator.base_mut().set_sampling_rate(1., 42).unwrap();
        let nb = mutator.process(b"ACGTA", &table).unwrap();
        assert_eq!(nb, 5);
        assert_eq!(mutator.get_mut_count(), 5);
        let abund_hist = mutator.base().get_abund_hist();
        assert_eq!(abund_hist.get(5), 27);
        assert_eq!(abund_hist.entries(), 27);
        // constant oracle : one distinct nonzero abundance per position
        let unique_hist = mutator.base().get_unique_hist();
        assert_eq!(unique_hist.get(1), 5);
        assert_eq!(unique_hist.entries(), 5);
    }

    #[test]
    fn test_acgta_rate_zero() {
        log_init_test();
        let table = ConstTable { ksize: 3, abund: 5 };
        let mut mutator = MutatorSNV::new(3, 16, 0).unwrap();
        mutator.base_mut().set_sampling_rate(0., 42).unwrap();
        let nb = mutator.process(b"ACGTA", &table).unwrap();
        assert_eq!(nb, 0);
        assert_eq!(mutator.get_mut_count(), 0);
        assert_eq!(mutator.base().get_abund_hist().entries(), 0);
        assert_eq!(mutator.base().get_unique_hist().entries(), 0);
    }

    #[test]
    fn test_fixed_seed_reproducibility() {
        log_init_test();
        let table = ConstTable { ksize: 4, abund: 2 };
        let seqstr = b"TCAAAGGGAAACATTCAAAATCAGTATGCGCCCGTTCAGTTACGTATTGC";
        //
        let mut mutator1 = MutatorSNV::new(4, 16, 0).unwrap();
        let mut mutator2 = MutatorSNV::new(4, 16, 0).unwrap();
        mutator1.base_mut().set_sampling_rate(0.5, 7777).unwrap();
        mutator2.base_mut().set_sampling_rate(0.5, 7777).unwrap();
        let nb1 = mutator1.process(seqstr, &table).unwrap();
        let nb2 = mutator2.process(seqstr, &table).unwrap();
        println!("nb mutated with rate 0.5 : {}", nb1);
        assert_eq!(nb1, nb2);
        assert_eq!(mutator1.get_mut_count(), mutator2.get_mut_count());
        assert_eq!(
            mutator1.base().get_abund_hist().get_counts(),
            mutator2.base().get_abund_hist().get_counts()
        );
        assert_eq!(
            mutator1.base().get_unique_hist().get_counts(),
            mutator2.base().get_unique_hist().get_counts()
        );
    }

    #[test]
    fn test_mut_count_accumulates() {
        log_init_test();
        let table = ConstTable { ksize: 3, abund: 1 };
        let mut mutator = MutatorSNV::new(3, 16, 0).unwrap();
        mutator.base_mut().set_sampling_rate(1., 1).unwrap();
        let mut previous = 0;
        for _ in 0..4 {
            mutator.process(b"ACGTACGT", &table).unwrap();
            // monotone accumulation across calls
            assert!(mutator.get_mut_count() > previous);
            previous = mutator.get_mut_count();
        }
        assert_eq!(mutator.get_mut_count(), 4 * 8);
    }

    #[test]
    fn test_mutation_limit() {
        log_init_test();
        let table = ConstTable { ksize: 3, abund: 1 };
        let mut mutator = MutatorSNV::new(3, 16, 3).unwrap();
        mutator.base_mut().set_sampling_rate(1., 1).unwrap();
        let nb = mutator.process(b"ACGTACGTAC", &table).unwrap();
        assert_eq!(nb, 3);
        assert_eq!(mutator.get_mut_count(), 3);
        // the limit holds across calls on the same instance
        let nb = mutator.process(b"ACGTACGTAC", &table).unwrap();
        assert_eq!(nb, 0);
        assert_eq!(mutator.get_mut_count(), 3);
    }

    #[test]
    fn test_malformed_sequence_rejected() {
        log_init_test();
        let table = ConstTable { ksize: 3, abund: 5 };
        let mut mutator = MutatorSNV::new(3, 16, 0).unwrap();
        mutator.base_mut().set_sampling_rate(1., 42).unwrap();
        let res = mutator.process(b"ACGNA", &table);
        match res {
            Err(MutSimError::Input { position }) => assert_eq!(position, 3),
            _ => panic!("expected an input error"),
        }
        // the rejected call left no trace
        assert_eq!(mutator.get_mut_count(), 0);
        assert_eq!(mutator.base().get_abund_hist().entries(), 0);
        assert_eq!(mutator.base().get_unique_hist().entries(), 0);
    }

    #[test]
    fn test_abundance_clamping() {
        log_init_test();
        // abundance 40 with maxabund 16 : everything clamps into the top bucket
        let table = ConstTable { ksize: 3, abund: 40 };
        let mut mutator = MutatorSNV::new(3, 16, 0).unwrap();
        mutator.base_mut().set_sampling_rate(1., 42).unwrap();
        mutator.process(b"ACGTA", &table).unwrap();
        let abund_hist = mutator.base().get_abund_hist();
        assert_eq!(abund_hist.get(16), 27);
        assert_eq!(abund_hist.entries(), 27);
        assert_eq!(abund_hist.get_nb_clamped(), 27);
    }

    #[test]
    fn test_unique_hist_counts_distinct_nonzero() {
        log_init_test();
        // k=1 : the single position of "A" has one window and alternatives C,G,T
        let mut counts = HashMap::new();
        counts.insert(b"C".to_vec(), 4u32);
        counts.insert(b"G".to_vec(), 4u32);
        // T stays absent hence abundance 0
        let table = MapTable { ksize: 1, counts };
        let mut mutator = MutatorSNV::new(1, 16, 0).unwrap();
        mutator.base_mut().set_sampling_rate(1., 42).unwrap();
        mutator.process(b"A", &table).unwrap();
        // collected abundances are [4, 4, 0] : one distinct nonzero value
        assert_eq!(mutator.base().get_unique_hist().get(1), 1);
        assert_eq!(mutator.base().get_abund_hist().get(4), 2);
        assert_eq!(mutator.base().get_abund_hist().get(0), 1);
        //
        // with two distinct nonzero values the unique bucket moves to 2
        let mut counts = HashMap::new();
        counts.insert(b"C".to_vec(), 4u32);
        counts.insert(b"G".to_vec(), 7u32);
        let table = MapTable { ksize: 1, counts };
        let mut mutator = MutatorSNV::new(1, 16, 0).unwrap();
        mutator.base_mut().set_sampling_rate(1., 42).unwrap();
        mutator.process(b"A", &table).unwrap();
        assert_eq!(mutator.base().get_unique_hist().get(2), 1);
    }

    #[test]
    fn test_display_forwards_print() {
        log_init_test();
        let table = ConstTable { ksize: 3, abund: 5 };
        let mut mutator = MutatorSNV::new(3, 16, 0).unwrap();
        mutator.base_mut().set_sampling_rate(1., 42).unwrap();
        mutator.process(b"ACGTA", &table).unwrap();
        let report = format!("{}", mutator);
        println!("{}", report);
        assert!(report.contains("kmer size 3"));
        assert!(report.contains("nb mutations realized : 5"));
    }
} // end of mod tests
