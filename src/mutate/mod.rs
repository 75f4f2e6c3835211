//! The mutation application contract shared by all strategies and the state
//! they compose.
//!
//! A mutator processes one sequence at a time against a counting table used as
//! abundance oracle, accumulates two histograms (abundance of the mutant kmers,
//! number of distinct nonzero abundances per mutated position) and keeps a
//! cumulative count of realized mutations.
//!
//! One mutator drives one sequential simulation : processing is synchronous
//! and an instance must not be shared between threads. The counting table is
//! only read and can back several independent mutators at once.

use std::io;
use std::io::Write;

use log::debug;

use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::counttable::CountTableT;
use crate::error::{MutSimError, MutSimResult};
use crate::hist::BoundedHistogram;

pub mod snv;

pub use snv::MutatorSNV;

/// default upper bucket of the histograms
pub const DEFAULT_MAXABUND: u32 = 16;


/// The mutation application contract.
/// Polymorphic over the capability set {process, get_mut_count}. MutatorSNV is
/// the only strategy for now, insertion/deletion strategies would slot in as
/// further implementors.
pub trait MutatorT {
    /// apply the strategy to sequence, using counttable as the abundance oracle.
    /// Histograms accumulate across calls. Returns the number of positions
    /// mutated during this call. A sequence shorter than the kmer size yields
    /// no candidate and returns Ok(0) without consuming a draw.
    fn process(&mut self, sequence: &[u8], counttable: &dyn CountTableT) -> MutSimResult<u64>;

    /// cumulative count of mutations realized since construction.
    /// Granularity is defined by the strategy, it need not equal the sum of
    /// process return values.
    fn get_mut_count(&self) -> u64;

    /// access to the shared state
    fn base(&self) -> &MutatorBase;

    /// write a human readable summary of configuration and both histograms
    fn print(&self, out: &mut dyn Write) -> io::Result<()>;
}


/// State shared by every mutation strategy : kmer size, mutation limit, the
/// two histogram accumulators and the sampling decision source.
pub struct MutatorBase {
    /// size of the kmers queried against the counting table
    ksize: usize,
    /// maximum number of mutations to realize, 0 means unlimited
    limit: u64,
    /// upper bucket of both histograms
    maxabund: u32,
    /// distribution of mutant kmer abundances
    abund_hist: BoundedHistogram,
    /// distribution of distinct nonzero abundances per mutated position
    unique_hist: BoundedHistogram,
    /// fraction of candidate positions that are realized, in [0,1]
    sampling_rate: f64,
    unit_range: Uniform<f64>,
    rng: Xoshiro256PlusPlus,
}


impl MutatorBase {
    /// ksize must be positive and maxabund >= 1, a limit of 0 means unlimited.
    /// The generator starts from entropy, call [`Self::set_sampling_rate`] with
    /// a seed to get a reproducible mutation stream.
    pub fn new(ksize: usize, maxabund: u32, limit: u64) -> MutSimResult<MutatorBase> {
        if ksize == 0 {
            return Err(MutSimError::Config(String::from("kmer size must be > 0")));
        }
        if maxabund < 1 {
            return Err(MutSimError::Config(String::from("maxabund must be >= 1")));
        }
        Ok(MutatorBase {
            ksize,
            limit,
            maxabund,
            abund_hist: BoundedHistogram::new(maxabund),
            unique_hist: BoundedHistogram::new(maxabund),
            sampling_rate: 1.,
            unit_range: Uniform::<f64>::new(0., 1.),
            rng: Xoshiro256PlusPlus::seed_from_u64(rand::random::<u64>()),
        })
    } // end of new

    /// draw once in [0,1) and decide if the current candidate position must be
    /// skipped : true when the draw fell at or above the sampling rate.
    /// This is the single source of randomness consulted by all strategies, so
    /// a fixed seed and rate reproduce the same mutation stream.
    pub fn skip_nucl(&mut self) -> bool {
        let xsi = self.unit_range.sample(&mut self.rng);
        xsi >= self.sampling_rate
    } // end of skip_nucl

    /// reconfigure the sampling probability and reseed the generator.
    /// Reseeding discards prior generator state : two calls with the same seed
    /// reproduce the same future sequence of skip_nucl outcomes.
    pub fn set_sampling_rate(&mut self, rate: f64, seed: u64) -> MutSimResult<()> {
        if !(0. ..=1.).contains(&rate) {
            return Err(MutSimError::Config(format!(
                "sampling rate must be in [0,1], got {}",
                rate
            )));
        }
        debug!("setting sampling rate {} , seed {}", rate, seed);
        self.sampling_rate = rate;
        self.rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        Ok(())
    } // end of set_sampling_rate

    /// fold the abundances collected for one realized candidate into the
    /// accumulators : every abundance goes to the abundance histogram, the
    /// number of distinct nonzero values goes to the unique kmer histogram.
    pub(crate) fn record_variant(&mut self, abunds: &[u32]) {
        let mut distinct: Vec<u32> = Vec::with_capacity(abunds.len());
        for &a in abunds {
            self.abund_hist.increment(a);
            if a > 0 && !distinct.contains(&a) {
                distinct.push(a);
            }
        }
        self.unique_hist.increment(distinct.len() as u32);
    } // end of record_variant

    /// true when a nonzero limit has been reached by count
    pub(crate) fn limit_reached(&self, count: u64) -> bool {
        self.limit != 0 && count >= self.limit
    }

    /// sum another mutator's histograms into this one, used by the parallel driver
    pub fn merge_histograms(&mut self, other: &MutatorBase) {
        self.abund_hist.merge(&other.abund_hist);
        self.unique_hist.merge(&other.unique_hist);
    }

    pub fn get_ksize(&self) -> usize {
        self.ksize
    }

    pub fn get_limit(&self) -> u64 {
        self.limit
    }

    pub fn get_maxabund(&self) -> u32 {
        self.maxabund
    }

    pub fn get_sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn get_abund_hist(&self) -> &BoundedHistogram {
        &self.abund_hist
    }

    pub fn get_unique_hist(&self) -> &BoundedHistogram {
        &self.unique_hist
    }

    /// write configuration and both histograms. name tells which strategy owns the state
    pub fn print(&self, name: &str, mut_count: u64, out: &mut dyn Write) -> io::Result<()> {
        writeln!(
            out,
            " mutator {} : kmer size {} , sampling rate {:.3} , maxabund {} , limit {}",
            name, self.ksize, self.sampling_rate, self.maxabund, self.limit
        )?;
        writeln!(out, " nb mutations realized : {}", mut_count)?;
        writeln!(
            out,
            " abundance histogram ({} entries) :",
            self.abund_hist.entries()
        )?;
        self.abund_hist.dump_ascii(out)?;
        writeln!(
            out,
            " unique kmer histogram ({} entries) :",
            self.unique_hist.entries()
        )?;
        self.unique_hist.dump_ascii(out)?;
        Ok(())
    } // end of print
} // end of impl MutatorBase


// ====================================================================================================
//   Some tests
// ====================================================================================================


// end of mod tests
