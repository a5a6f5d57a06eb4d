//! Grammar loaded from a YAML file.
//!
//! Writes a small grammar to a temporary directory, loads it back, prints
//! its usage and parses the command line given to the example.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p argtree-demos --example grammar_file -- --format json in.txt
//! ```

use argtree_config::Grammar;

const GRAMMAR: &str = r#"
program: convert
help: true
args:
  - name: input
    description: File to convert.
flags:
  - key: --format
    policy: optional
    description: Output format.
    args:
      - name: format
        convert: { type: choice, values: [json, yaml] }
  - exclusive: optional
    members:
      - key: --quiet
        description: Print nothing.
      - key: --verbose
        description: Print every step.
"#;

fn main() {
    let dir = std::env::temp_dir().join("argtree_grammar_example");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("convert.yaml");
    std::fs::write(&path, GRAMMAR).unwrap();

    let grammar = Grammar::load(&path).unwrap();
    let mut built = grammar.build().unwrap();
    println!("{}", built.usage());

    let tokens: Vec<String> = std::env::args().skip(1).collect();
    let result = built.parse(&tokens);

    // Cleanup
    std::fs::remove_dir_all(&dir).ok();

    match result {
        Ok(report) => println!("{}", serde_json::to_string_pretty(&report).unwrap()),
        Err(err) => {
            eprint!("{}", built.failure_report(&err));
            std::process::exit(1);
        }
    }
}
