extern crate rand;

// for logging (debug mostly, switched at compile time in cargo.toml)
#[macro_use]
extern crate lazy_static;



// basic stuff : bases definitions, kmer helpers over raw sequences
pub mod base;


pub mod error;
pub mod hist;

// counting tables, the abundance oracle queried by the mutators
pub mod counttable;

// the mutation application engine
pub mod mutate;


pub mod parsearg;
pub mod simulate;


lazy_static! {
    #[allow(dead_code)]
    pub static ref LOG: u64 = {
        let res = init_log();
        res
    };
}
// install a logger facility
// set RUST_LOG to trace, warn debug off ....
fn init_log() -> u64 {
    env_logger::Builder::from_default_env().init();
    println!("\n ************** initializing logger from env *****************\n");
    return 1;
}
