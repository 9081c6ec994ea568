use phf_codegen::Map;
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// Emits the rank character -> prime multiplier map consumed by the lookup
// fingerprint hash. Primes follow ace-first order so a rank multiset maps to
// a unique product.
fn main() {
    let path = Path::new(&env::var("OUT_DIR").unwrap()).join("rank_multipliers.rs");
    let mut file = BufWriter::new(File::create(&path).unwrap());

    let primes: [u64; 13] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41];
    let rank_chars = ['A', '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K'];

    let mut map = Map::new();
    for (prime, rank_char) in primes.iter().zip(rank_chars) {
        map.entry(rank_char, &prime.to_string());
    }

    writeln!(
        &mut file,
        "static RANK_MULTIPLIERS: phf::Map<char, u64> = {};",
        map.build()
    )
    .unwrap();
}
