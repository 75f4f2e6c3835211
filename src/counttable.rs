//! This module contains trait/struct to count kmers and serve abundance queries.
//!
//! The mutation engine only needs the lookup side : given a kmer, how many
//! times was it observed in the reference dataset. Counting is canonical, a
//! kmer and its reverse complement share one count as sequencing orientation
//! is arbitrary.


use log::{debug, info};

use ::bloom::*;
use ::cuckoofilter::*;
use fnv::FnvHashMap;
use metrohash::MetroHash64;

use crate::base::alphabet::count_non_acgt;
use crate::base::kmer::canonical;


/// Trait kmer count table. Abstraction of basic requests over the exact case
/// and the filter based case used for large references.
pub trait CountTableT {
    /// return observed count for a kmer, 0 if not seen. Lookup is canonical.
    fn get_count(&self, kmer: &[u8]) -> u32;
    /// insert one kmer occurrence
    fn insert_kmer(&mut self, kmer: &[u8]);
    /// size of counted kmers
    fn get_kmer_size(&self) -> usize;
    /// returns number of distinct kmers
    fn get_nb_distinct(&self) -> u64;
    /// returns the number of kmers seen exactly once
    fn get_nb_unique(&self) -> u64;
}


//===================================================================================
// ExactCountTable
//===================================================================================


/// Exact counting table backed by a hash map.
/// Fine for tests and references small enough to keep every kmer in memory.
pub struct ExactCountTable {
    ksize: usize,
    counts: FnvHashMap<Vec<u8>, u32>,
}

impl ExactCountTable {
    pub fn new(ksize: usize) -> ExactCountTable {
        assert!(ksize > 0, "ExactCountTable requires a positive kmer size");
        ExactCountTable {
            ksize,
            counts: FnvHashMap::default(),
        }
    } // end of new
} // end of impl ExactCountTable

impl CountTableT for ExactCountTable {
    fn get_count(&self, kmer: &[u8]) -> u32 {
        let kmin = canonical(kmer);
        *self.counts.get(&kmin).unwrap_or(&0)
    }

    fn insert_kmer(&mut self, kmer: &[u8]) {
        debug_assert_eq!(kmer.len(), self.ksize);
        let kmin = canonical(kmer);
        *self.counts.entry(kmin).or_insert(0) += 1;
    }

    fn get_kmer_size(&self) -> usize {
        self.ksize
    }

    fn get_nb_distinct(&self) -> u64 {
        self.counts.len() as u64
    }

    fn get_nb_unique(&self) -> u64 {
        self.counts.values().filter(|&&c| c == 1).count() as u64
    }
} // end of impl CountTableT for ExactCountTable


//===================================================================================
// FilterCountTable
//===================================================================================


/// The structure to count kmers within bounded memory.
/// A cuckoo filter keeps track of kmers encountered only once, a counting
/// bloom filter of kmers encountered at least twice. Counts are estimates,
/// possibly inflated by bloom collisions.
pub struct FilterCountTable {
    ksize: usize,
    /// number of bits for a count in the bloom filter
    bloom_f_nb_bits: usize,
    /// a cuckoo filter to keep track of kmers encountered only once
    cuckoo_f: CuckooFilter<MetroHash64>,
    /// a counting bloom filter to keep track of kmers encountered at least twice
    cbloom_f: CountingBloomFilter,
    /// total number of distinct kmers seen
    nb_distinct: u64,
}


impl FilterCountTable {
    /// fpr is the false positive rate required, standard is 0.03.
    /// capacity the expected number of distinct kmers, nb_bits the count width.
    pub fn new(ksize: usize, fpr: f32, capacity: usize, nb_bits: usize) -> FilterCountTable {
        assert!(ksize > 0, "FilterCountTable requires a positive kmer size");
        FilterCountTable {
            ksize,
            bloom_f_nb_bits: nb_bits,
            cuckoo_f: CuckooFilter::with_capacity(capacity),
            cbloom_f: CountingBloomFilter::with_rate(nb_bits, fpr, capacity as u32),
            nb_distinct: 0,
        }
    } // end of new

    /// returns number of bits used for a count
    pub fn get_count_nb_bits(&self) -> usize {
        self.bloom_f_nb_bits
    }
} // end of impl FilterCountTable


impl CountTableT for FilterCountTable {
    /// insert a kmer.
    /// a kmer seen for the first time goes in the cuckoo filter. when seen again
    /// it is deleted from the cuckoo and inserted twice in the counting bloom.
    fn insert_kmer(&mut self, kmer: &[u8]) {
        debug_assert_eq!(kmer.len(), self.ksize);
        let kmin = canonical(kmer);
        if self.cbloom_f.contains(&kmin) {
            self.cbloom_f.insert(&kmin); // insert once more
        } else {
            let inserted = match self.cuckoo_f.test_and_add(&kmin) {
                Ok(true) => true,
                _ => false,
            };
            if inserted {
                self.nb_distinct += 1;
            } else {
                // second occurrence : transfer from cuckoo to the counting bloom
                self.cuckoo_f.delete(&kmin);
                self.cbloom_f.insert(&kmin);
                self.cbloom_f.insert(&kmin);
            }
        } // end not yet inserted in cbloom
    } // end of insert_kmer

    fn get_count(&self, kmer: &[u8]) -> u32 {
        let kmin = canonical(kmer);
        if self.cbloom_f.contains(&kmin) {
            return self.cbloom_f.estimate_count(&kmin);
        } else {
            self.cuckoo_f.contains(&kmin) as u32
        }
    } // end of get_count

    fn get_kmer_size(&self) -> usize {
        self.ksize
    }

    /// returns number of different kmers.
    fn get_nb_distinct(&self) -> u64 {
        self.nb_distinct
    }

    /// returns the number of unique kmers
    fn get_nb_unique(&self) -> u64 {
        self.cuckoo_f.len() as u64
    }
} // end of impl CountTableT for FilterCountTable


//===================================================================================
// counting driver
//===================================================================================


/// Count all kmers of the given sequences into table, returns the number of
/// kmers inserted. Windows containing a non ACGT character are skipped, as the
/// sequence loader already rejects whole records carrying one.
pub fn count_sequences(table: &mut dyn CountTableT, seqvec: &[Vec<u8>]) -> u64 {
    let ksize = table.get_kmer_size();
    info!("counting kmers of size {} over {} sequences", ksize, seqvec.len());
    let start_t = std::time::Instant::now();
    //
    let mut nb_kmer: u64 = 0;
    let mut nbseq = 0u64;
    for seq in seqvec {
        if seq.len() < ksize {
            continue;
        }
        for w in 0..=(seq.len() - ksize) {
            let kmer = &seq[w..w + ksize];
            if count_non_acgt(kmer) > 0 {
                continue;
            }
            table.insert_kmer(kmer);
            nb_kmer += 1;
        }
        nbseq += 1;
        if nbseq % 100_000 == 0 {
            debug!(
                " nb seq treated = {} , nb distinct kmers = {}",
                nbseq,
                table.get_nb_distinct()
            );
        }
    } // end of for on seq
    //
    let elapsed_t = start_t.elapsed().as_secs();
    info!(
        " kmer counting done, nb kmer generated {} , nb distinct {} , elapsed time (s) {}",
        nb_kmer,
        table.get_nb_distinct(),
        elapsed_t
    );
    //
    nb_kmer
} // end of count_sequences


// ====================================================================================================
//   Some tests
// ====================================================================================================


#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn log_init_test() {
        let mut builder = env_logger::Builder::from_default_env();
        let _ = builder.is_test(true).try_init();
    }

    #[test]
    fn test_exact_table_counts() {
        log_init_test();
        let mut table = ExactCountTable::new(3);
        table.insert_kmer(b"ACG");
        table.insert_kmer(b"ACG");
        table.insert_kmer(b"TTT");
        assert_eq!(table.get_count(b"ACG"), 2);
        assert_eq!(table.get_count(b"TTT"), 1);
        assert_eq!(table.get_count(b"GGG"), 0);
        assert_eq!(table.get_nb_distinct(), 2);
        assert_eq!(table.get_nb_unique(), 1);
    }

    #[test]
    fn test_exact_table_canonical_lookup() {
        log_init_test();
        let mut table = ExactCountTable::new(4);
        table.insert_kmer(b"AAAC");
        // GTTT is the reverse complement of AAAC, both share one count
        assert_eq!(table.get_count(b"GTTT"), 1);
        table.insert_kmer(b"GTTT");
        assert_eq!(table.get_count(b"AAAC"), 2);
        assert_eq!(table.get_nb_distinct(), 1);
    }

    #[test]
    fn test_filter_table_counts() {
        log_init_test();
        let mut table = FilterCountTable::new(3, 0.03, 10_000, 8);
        for _ in 0..5 {
            table.insert_kmer(b"ACG");
        }
        table.insert_kmer(b"TTT");
        // bloom estimates never undercount
        assert!(table.get_count(b"ACG") >= 5);
        assert_eq!(table.get_count(b"TTT"), 1);
        assert_eq!(table.get_nb_distinct(), 2);
        assert_eq!(table.get_nb_unique(), 1);
    }

    #[test]
    fn test_count_sequences_windows() {
        log_init_test();
        let seqvec = vec![b"ACGTA".to_vec(), b"AC".to_vec()];
        let mut table = ExactCountTable::new(3);
        // 3 windows in ACGTA, the 2 base sequence holds none
        let nb = count_sequences(&mut table, &seqvec);
        assert_eq!(nb, 3);
        // ACG and CGT are reverse complements, they share one canonical count
        assert_eq!(table.get_count(b"ACG"), 2);
        assert_eq!(table.get_count(b"CGT"), 2);
        assert_eq!(table.get_count(b"GTA"), 1);
        assert_eq!(table.get_nb_distinct(), 2);
    }
} // end of mod tests
