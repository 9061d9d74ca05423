//! DAAP request authentication hashing

mod hasher;
mod md5;

#[cfg(test)]
mod tests;

pub use hasher::generate_validation;
