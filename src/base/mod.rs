//! Contains basic tools to describe bases and kmers over raw byte sequences


pub mod alphabet;
pub mod kmer;
