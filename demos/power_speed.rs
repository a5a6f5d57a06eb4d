//! Hand-built parser tree.
//!
//! An optional `-p` flag taking a wattage, a mandatory `--speed` flag with
//! an exclusive choice of `slow`, `medium` or `fast`, and an optional
//! `--file` flag that only accepts an existing file.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p argtree-demos --example power_speed -- -p 10 --speed fast
//! cargo run -p argtree-demos --example power_speed -- --help
//! ```
//!
//! Parse failures print the error, the parsed prefix and the usage, then
//! exit with status 1.

use argtree_core::convert::{self, Range};
use argtree_core::{Parser, Policy};

fn main() {
    let mut parser = Parser::new();
    let root = parser.root();

    let power = parser
        .add_complex_flag(root, "-p", Policy::Optional, "Specify power output.")
        .unwrap();
    parser
        .on_match(power, |_| println!("Triggered power flag"))
        .unwrap();
    let watts = parser
        .add_arg(
            power.store(),
            "number_watts",
            Policy::Mandatory,
            "An integer representing the number of watts.",
            convert::integer::<i32>().then(Range::inclusive(0, 50).step()),
        )
        .unwrap();

    let speed = parser
        .add_complex_flag(root, "--speed", Policy::Mandatory, "Specify the speed.")
        .unwrap();
    let speeds = parser
        .add_exclusive_group(speed.store(), Policy::Mandatory)
        .unwrap();
    let slow = parser.add_group_flag(speeds, "slow", "").unwrap();
    let medium = parser.add_group_flag(speeds, "medium", "").unwrap();
    let fast = parser.add_group_flag(speeds, "fast", "").unwrap();

    let file = parser
        .add_complex_flag(root, "--file", Policy::Optional, "Read the specified file.")
        .unwrap();
    let file_path = parser
        .add_arg(
            file.store(),
            "file_path",
            Policy::Mandatory,
            "Path to an existing file.",
            convert::existing_file(),
        )
        .unwrap();

    parser.enable_help().unwrap();

    // Exits on failure or --help.
    parser.validate_env().unwrap();

    if let Some(power) = parser.value(watts) {
        println!("Accepted power output of {power} W");
    }
    if parser.is_matched(slow) {
        println!("Running slowly.");
    } else if parser.is_matched(medium) {
        println!("Running normally.");
    } else if parser.is_matched(fast) {
        println!("Running fast.");
    }
    if let Some(path) = parser.value(file_path) {
        println!("Reading {}", path.display());
    }
}
