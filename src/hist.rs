//! A bounded histogram with exact buckets over [0, maxabund].
//!
//! Abundances are small integers and the report needs exact per bucket counts,
//! so buckets are a plain vector indexed by value. Values above the bound are
//! clamped into the top bucket, never dropped : the number of entries always
//! equals the number of recorded values.

use serde::Serialize;

use std::io;
use std::io::Write;


#[derive(Clone, Debug, Serialize)]
pub struct BoundedHistogram {
    /// bucket counts, index is the recorded value clamped to the upper bound
    counts: Vec<u64>,
    /// number of values that fell above the bound and were clamped
    nb_clamped: u64,
}


impl BoundedHistogram {
    /// maxabund is the upper bucket, must be >= 1
    pub fn new(maxabund: u32) -> BoundedHistogram {
        assert!(maxabund >= 1, "BoundedHistogram requires maxabund >= 1");
        BoundedHistogram {
            counts: vec![0u64; maxabund as usize + 1],
            nb_clamped: 0,
        }
    } // end of new

    /// record one value. A value above maxabund goes into the top bucket.
    pub fn increment(&mut self, value: u32) {
        let top = self.counts.len() - 1;
        if value as usize > top {
            self.nb_clamped += 1;
        }
        self.counts[(value as usize).min(top)] += 1;
    } // end of increment

    /// count recorded in one bucket
    pub fn get(&self, bucket: u32) -> u64 {
        self.counts[bucket as usize]
    }

    /// total number of values recorded
    pub fn entries(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn get_max_bucket(&self) -> u32 {
        (self.counts.len() - 1) as u32
    }

    /// number of values clamped into the top bucket
    pub fn get_nb_clamped(&self) -> u64 {
        self.nb_clamped
    }

    pub fn get_counts(&self) -> &[u64] {
        &self.counts
    }

    /// sum another histogram bucket by bucket, used to reduce per thread accumulators
    pub fn merge(&mut self, other: &BoundedHistogram) {
        assert_eq!(
            self.counts.len(),
            other.counts.len(),
            "cannot merge histograms with different bounds"
        );
        for i in 0..self.counts.len() {
            self.counts[i] += other.counts[i];
        }
        self.nb_clamped += other.nb_clamped;
    } // end of merge

    /// ascii rendering, one line per non empty bucket
    pub fn dump_ascii(&self, out: &mut dyn Write) -> io::Result<()> {
        for (bucket, count) in self.counts.iter().enumerate() {
            if *count > 0 {
                writeln!(out, "    {}  {}", bucket, count)?;
            }
        }
        if self.nb_clamped > 0 {
            writeln!(out, "    (top bucket holds {} clamped values)", self.nb_clamped)?;
        }
        Ok(())
    } // end of dump_ascii
} // end of impl BoundedHistogram


// ====================================================================================================
//   Some tests
// ====================================================================================================


// end of mod tests
