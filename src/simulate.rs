//! Simulation driver : loads sequences with needletail, builds the counting
//! table from the reference and runs a SNV mutator over the targets, possibly
//! in parallel with one independent mutator per chunk.

use log::{info, warn};

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use ::histogram::Histogram;
use ::rayon::prelude::*;
use serde::Serialize;

use crate::base::alphabet::count_non_acgt;
use crate::counttable::{count_sequences, CountTableT, ExactCountTable, FilterCountTable};
use crate::error::{MutSimError, MutSimResult};
use crate::hist::BoundedHistogram;
use crate::mutate::{MutatorSNV, MutatorT};
use crate::parsearg::SimArgs;


// above this estimate of kmers the exact table is traded for the filter based one
const EXACT_TABLE_MAX_KMERS: usize = 10_000_000;


/// parse a fasta/fastq file with needletail.
/// Records carrying a non ACGT character are counted and dropped, the mutator
/// would reject them anyway.
pub fn load_sequences(fname: &str) -> MutSimResult<Vec<Vec<u8>>> {
    info!("parsing with needletail file : {}", fname);
    let start_t = std::time::Instant::now();
    //
    let mut seq_array: Vec<Vec<u8>> = Vec::new();
    let mut n_bases: usize = 0;
    let mut nb_bad_read = 0u64;
    let mut reader = needletail::parse_fastx_file(Path::new(fname))?;
    while let Some(record) = reader.next() {
        let seqrec = record?;
        n_bases += seqrec.num_bases();
        if count_non_acgt(&seqrec.seq()) == 0 {
            seq_array.push(seqrec.seq().to_ascii_uppercase());
        } else {
            nb_bad_read += 1;
        }
    }
    //
    let elapsed_t = start_t.elapsed().as_secs();
    info!(
        " nb rec loaded = {} , nb_bases = {} , nb_bad_read = {} , elapsed time (s) {}",
        seq_array.len(),
        n_bases,
        nb_bad_read,
        elapsed_t
    );
    Ok(seq_array)
} // end of load_sequences


/// read length distribution of the targets, logged before the run
fn record_read_lengths(seqvec: &[Vec<u8>]) -> Histogram {
    let mut histo = Histogram::configure()
        .max_value(1_000_000)
        .precision(2)
        .build()
        .unwrap();
    let mut nb_out = 0u64;
    for seq in seqvec {
        if histo.increment(seq.len() as u64).is_err() {
            nb_out += 1;
        }
    }
    if nb_out > 0 {
        warn!("nb reads outside the length histogram range : {}", nb_out);
    }
    histo
} // end of record_read_lengths


/// summary of one simulation run, serializable for the json dump
#[derive(Serialize)]
pub struct SimReport {
    pub ksize: usize,
    pub sampling_rate: f64,
    pub seed: u64,
    pub maxabund: u32,
    pub nb_sequences: u64,
    pub nb_mutations: u64,
    pub abund_hist: BoundedHistogram,
    pub unique_hist: BoundedHistogram,
}


/// dump the report as json
pub fn dump_json(report: &SimReport, fname: &str) -> MutSimResult<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(fname)?;
    serde_json::to_writer_pretty(io::BufWriter::new(file), report)?;
    info!("report dumped in {}", fname);
    Ok(())
} // end of dump_json


/// Build the counting table from the reference file, then run a SNV mutator
/// over the target sequences. Returns the mutator (for printing) and the report.
pub fn run_simulation(args: &SimArgs) -> MutSimResult<(MutatorSNV, SimReport)> {
    if args.ksize == 0 {
        return Err(MutSimError::Config(String::from("kmer size must be > 0")));
    }
    //
    let refseqs = load_sequences(&args.ref_file)?;
    // rough upper bound on the number of kmers, drives the table choice
    let nb_kmer_estimate: usize = refseqs
        .iter()
        .map(|s| s.len().saturating_sub(args.ksize - 1))
        .sum();
    let mut table: Box<dyn CountTableT + Sync> = if nb_kmer_estimate <= EXACT_TABLE_MAX_KMERS {
        Box::new(ExactCountTable::new(args.ksize))
    } else {
        info!(
            "estimated {} kmers, switching to the filter based table",
            nb_kmer_estimate
        );
        Box::new(FilterCountTable::new(args.ksize, 0.03, nb_kmer_estimate, 8))
    };
    count_sequences(table.as_mut(), &refseqs);
    //
    let targets = match &args.target_file {
        Some(fname) => load_sequences(fname)?,
        None => refseqs,
    };
    let lenhisto = record_read_lengths(&targets);
    if lenhisto.entries() > 0 {
        info!(
            "targets : {} sequences, median length {}",
            lenhisto.entries(),
            lenhisto.percentile(50.).unwrap_or(0)
        );
    }
    //
    let seed = args.seed.unwrap_or_else(rand::random);
    info!("sampling seed : {}", seed);
    //
    // nb_threads 0 means one worker per physical cpu
    let mutator = if args.nb_threads == 1 {
        let mut mutator = MutatorSNV::new(args.ksize, args.maxabund, args.limit)?;
        mutator.base_mut().set_sampling_rate(args.sampling_rate, seed)?;
        for seq in &targets {
            mutator.process(seq, table.as_ref())?;
        }
        mutator
    } else {
        run_parallel(args, seed, &targets, table.as_ref())?
    };
    //
    let report = SimReport {
        ksize: args.ksize,
        sampling_rate: args.sampling_rate,
        seed,
        maxabund: args.maxabund,
        nb_sequences: targets.len() as u64,
        nb_mutations: mutator.get_mut_count(),
        abund_hist: mutator.base().get_abund_hist().clone(),
        unique_hist: mutator.base().get_unique_hist().clone(),
    };
    Ok((mutator, report))
} // end of run_simulation


/// chunked parallel run : one independent mutator per chunk with a seed derived
/// from the base seed, counts and histograms merged into the first mutator.
/// The counting table is only read and is shared across the workers.
fn run_parallel(
    args: &SimArgs,
    seed: u64,
    targets: &[Vec<u8>],
    table: &(dyn CountTableT + Sync),
) -> MutSimResult<MutatorSNV> {
    let nbthreads = if args.nb_threads > 0 {
        args.nb_threads
    } else {
        num_cpus::get_physical()
    };
    info!("running mutation on {} threads", nbthreads);
    if args.limit != 0 {
        // each worker enforces the limit on its own counter
        warn!("mutation limit {} applies per worker", args.limit);
    }
    let v_ref = targets;
    let results: Vec<MutSimResult<MutatorSNV>> = (0..nbthreads)
        .into_par_iter()
        .map(|i| {
            let low = (v_ref.len() / nbthreads) * i;
            let up = if i < nbthreads - 1 {
                (v_ref.len() / nbthreads) * (i + 1)
            } else {
                v_ref.len()
            };
            let mut mutator = MutatorSNV::new(args.ksize, args.maxabund, args.limit)?;
            // derived seed keeps every chunk deterministic for a given base seed
            mutator
                .base_mut()
                .set_sampling_rate(args.sampling_rate, seed.wrapping_add(i as u64))?;
            for seq in &v_ref[low..up] {
                mutator.process(seq, table)?;
            }
            Ok(mutator)
        })
        .collect();
    // reduce into the first mutator
    let mut results = results.into_iter();
    // there is at least one worker so the iterator is never empty
    let mut merged = results.next().unwrap()?;
    for res in results {
        merged.absorb(&res?);
    }
    Ok(merged)
} // end of run_parallel


// ====================================================================================================
//   Some tests
// ====================================================================================================


// end of mod tests
