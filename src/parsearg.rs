//! this module contains the structure describing arguments of the simulation
//! driver, filled by the binary's command line parsing.

// The structure implements Clone as workers keep a reference to it only while running.


#[derive(Clone)]
pub struct SimArgs {
    /// file the counting table is built from
    pub ref_file: String,
    /// file containing the sequences to mutate. None means the reference file itself
    pub target_file: Option<String>,
    /// kmer size
    pub ksize: usize,
    /// upper bucket of both histograms
    pub maxabund: u32,
    /// fraction of candidate positions that are realized
    pub sampling_rate: f64,
    /// seed of the sampling generator. None draws one and logs it
    pub seed: Option<u64>,
    /// maximum number of mutations per mutator, 0 means unlimited
    pub limit: u64,
    /// number of threads, each thread runs an independent mutator
    pub nb_threads: usize,
    /// if set the report is dumped as json in this file
    pub json_file: Option<String>,
}


impl Default for SimArgs {
    fn default() -> SimArgs {
        SimArgs {
            ref_file: String::new(),
            target_file: None,
            ksize: 31,
            maxabund: 16,
            sampling_rate: 1.,
            seed: None,
            limit: 0,
            nb_threads: 1,
            json_file: None,
        }
    } // end of function default
}
