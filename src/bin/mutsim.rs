//! mutation simulation driver.
//! usage mutsim -f reffile [-g targetfile] [-k n] [--rate r] [--seed s] [--maxabund m] [--limit l] [-t j] [--json out]
//! -   --file (or -f)      : fasta/fastq file the counting table is built from
//! -   --target (or -g)    : fasta/fastq file of sequences to mutate (default is the reference file)
//! -   --ksize (or -k)  n  : kmer size (default 31)
//! -   --rate           r  : fraction of candidate positions to mutate, in [0,1]
//! -   --seed           s  : seed of the sampling generator (default is drawn and logged)
//! -   --maxabund       m  : upper bucket of the histograms (default 16)
//! -   --limit          l  : maximum number of mutations, 0 means unlimited
//! -   --thread (or -t) j  : number of threads, 0 means one per physical cpu
//! -   --json           f  : dump the report as json in file f




use clap::{Arg, ArgAction, Command};



// general use
#[doc(no_inline)]
use std::process;


// our modules
use mutsim::mutate::MutatorT;
use mutsim::parsearg::SimArgs;
use mutsim::simulate::{dump_json, run_simulation};


// for logging (debug mostly, switched at compile time in cargo.toml)
use env_logger::Builder;

// install a logger facility
fn init_log() -> u64 {
    Builder::from_default_env().init();
    println!("\n ************** initializing logger *****************\n");
    1
}


fn main() {

    let _ = init_log();

    let matches = Command::new("mutsim")
        .arg(Arg::new("file")
            .long("file")
            .short('f')
            .required(true)
            .value_parser(clap::value_parser!(String))
            .action(ArgAction::Set)
            .help("expecting a fasta/fastq file to build the counting table from"))
        .arg(Arg::new("target")
            .long("target")
            .short('g')
            .value_parser(clap::value_parser!(String))
            .action(ArgAction::Set)
            .help("fasta/fastq file of sequences to mutate, default is the reference file"))
        .arg(Arg::new("ksize")
            .long("ksize")
            .short('k')
            .value_parser(clap::value_parser!(usize))
            .action(ArgAction::Set)
            .help("kmer size, default 31"))
        .arg(Arg::new("rate")
            .long("rate")
            .value_parser(clap::value_parser!(f64))
            .action(ArgAction::Set)
            .help("fraction of candidate positions to mutate, in [0,1]"))
        .arg(Arg::new("seed")
            .long("seed")
            .value_parser(clap::value_parser!(u64))
            .action(ArgAction::Set)
            .help("seed of the sampling generator, for a reproducible mutation stream"))
        .arg(Arg::new("maxabund")
            .long("maxabund")
            .value_parser(clap::value_parser!(u32))
            .action(ArgAction::Set)
            .help("upper bucket of the histograms, default 16"))
        .arg(Arg::new("limit")
            .long("limit")
            .value_parser(clap::value_parser!(u64))
            .action(ArgAction::Set)
            .help("maximum number of mutations, 0 means unlimited"))
        .arg(Arg::new("thread")
            .long("thread")
            .short('t')
            .value_parser(clap::value_parser!(usize))
            .action(ArgAction::Set)
            .help("to tell number of thread to be used, -t n , 0 means one per physical cpu"))
        .arg(Arg::new("json")
            .long("json")
            .value_parser(clap::value_parser!(String))
            .action(ArgAction::Set)
            .help("dump the report as json in the given file"))
        .get_matches();

    //
    let mut sim_args: SimArgs = Default::default();
    // file is required, clap guarantees it is there
    sim_args.ref_file = matches.get_one::<String>("file").unwrap().clone();
    if let Some(target) = matches.get_one::<String>("target") {
        sim_args.target_file = Some(target.clone());
    }
    if let Some(ksize) = matches.get_one::<usize>("ksize") {
        sim_args.ksize = *ksize;
    }
    if let Some(rate) = matches.get_one::<f64>("rate") {
        sim_args.sampling_rate = *rate;
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        sim_args.seed = Some(*seed);
    }
    if let Some(maxabund) = matches.get_one::<u32>("maxabund") {
        sim_args.maxabund = *maxabund;
    }
    if let Some(limit) = matches.get_one::<u64>("limit") {
        sim_args.limit = *limit;
    }
    if let Some(nb_threads) = matches.get_one::<usize>("thread") {
        sim_args.nb_threads = *nb_threads;
    }
    if let Some(json) = matches.get_one::<String>("json") {
        sim_args.json_file = Some(json.clone());
    }

    //
    match run_simulation(&sim_args) {
        Ok((mutator, report)) => {
            let mut out = std::io::stdout();
            if mutator.print(&mut out).is_err() {
                println!("could not write the report");
                process::exit(1);
            }
            if let Some(json_file) = &sim_args.json_file {
                if let Err(err) = dump_json(&report, json_file) {
                    println!("json dump in file {} failed : {}", json_file, err);
                    process::exit(1);
                }
            }
        }
        Err(err) => {
            println!("mutsim failed : {}", err);
            process::exit(1);
        }
    } // end match
} // end of main
