//! Command line entry point.
//!
//! Reads the grouped UCD document named on the command line, runs the
//! table pipeline, and prints the generated module on stdout. Progress and
//! diagnostics go to stderr, so the output can be redirected straight into
//! the consuming source tree.

mod flags;

use std::fs;
use std::process::exit;

use anyhow::{Context, Result};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use grapheme_table_gen::{emit, rules, search, ucd};

/// Shift search bounds. Four stages over shifts 2..=8 beat three stages by
/// roughly 30% while the search still finishes in moments; more stages buy
/// little and slow every lookup.
const MIN_SHIFT: u32 = 2;
const MAX_SHIFT: u32 = 8;
const STAGES: usize = 4;

const USAGE: &str = "\
Usage: grapheme-table-gen <path-to-ucd.nounihan.grouped.xml>

Generates the grapheme cluster break and character width lookup tables
used by the terminal text engine and prints the resulting module to
standard output. The required input is the grouped, no-Unihan variant of
the Unicode Character Database in XML format, available at:
    https://www.unicode.org/Public/UCD/latest/ucdxml/ucd.nounihan.grouped.zip
";

fn main() -> Result<()> {
    let Ok(flags) = flags::GraphemeTableGen::from_env() else {
        eprint!("{USAGE}");
        exit(1);
    };
    let module = run(&flags)?;
    print!("{module}");
    Ok(())
}

fn run(flags: &flags::GraphemeTableGen) -> Result<String> {
    let xml = fs::read_to_string(&flags.ucd_path)
        .with_context(|| format!("failed to read {}", flags.ucd_path.display()))?;
    let doc = roxmltree::Document::parse(&xml).context("failed to parse UCD document")?;
    let data = ucd::extract(&doc)?;

    let candidates = (MAX_SHIFT - MIN_SHIFT + 1).pow(STAGES as u32 - 1);
    eprintln!("searching {candidates} stage configurations...");
    let trie = search::build_best_trie(&data.values, MIN_SHIFT, MAX_SHIFT, STAGES);
    trie.verify(&data.values)?;
    let rules = rules::pack_rules(&rules::JOIN_RULES)?;
    eprintln!(
        "picked a {}-stage trie, {} bytes total",
        trie.stages.len(),
        trie.total_size + rules::RULES_SIZE
    );

    let timestamp = OffsetDateTime::now_utc().format(&Rfc3339)?;
    let mut out = String::new();
    emit::emit_module(&mut out, &trie, &rules, &data.description, &timestamp)?;
    Ok(out)
}
