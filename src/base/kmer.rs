//! Helpers over raw byte kmers : reverse complement, canonical form and the
//! window arithmetic shared by table construction and mutation scoring.

use super::alphabet::complement_base;

/// reverse complement of a byte kmer
pub fn reverse_complement(kmer: &[u8]) -> Vec<u8> {
    kmer.iter().rev().map(|&b| complement_base(b)).collect()
}

/// canonical form of a kmer : the min of the upper cased kmer and its reverse
/// complement. Counting and lookup always go through the canonical form so
/// that a kmer and its reverse complement share one count whatever the case.
pub fn canonical(kmer: &[u8]) -> Vec<u8> {
    let upper = kmer.to_ascii_uppercase();
    let revcomp = reverse_complement(&upper);
    if revcomp < upper {
        revcomp
    } else {
        upper
    }
} // end of canonical

/// range (first, last) of window starts of length ksize overlapping position pos
/// in a sequence of length len. None when the sequence cannot hold a full window.
/// For len >= ksize the range is never empty : end positions keep at least one window.
pub fn windows_over(pos: usize, len: usize, ksize: usize) -> Option<(usize, usize)> {
    if ksize == 0 || len < ksize || pos >= len {
        return None;
    }
    let first = pos.saturating_sub(ksize - 1);
    let last = pos.min(len - ksize);
    Some((first, last))
} // end of windows_over


// end of mod tests
