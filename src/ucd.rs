//! Folds the Unicode Character Database into one packed value per codepoint.
//!
//! The input is the grouped, no-Unihan UCD document: a `<repertoire>` of
//! `<group>` elements whose `<char>` children inherit any attribute they do
//! not set themselves. Only five attributes matter here: the general
//! category, the grapheme cluster break class, the Indic conjunct break
//! class, the extended pictographic flag, and the East Asian width.

use std::ops::RangeInclusive;

use anyhow::{bail, ensure, Context, Result};
use roxmltree::{Document, Node};

/// Number of Unicode scalar values; every table in this generator covers
/// the full range, surrogates included.
pub const NUM_CODEPOINTS: usize = 0x110000;

/// Grapheme cluster break classes, reduced to the set the join rules
/// distinguish. The ordinals index the join rule tables, so the order is
/// load bearing and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClusterBreak {
    Other = 0,
    Control = 1,
    Extend = 2,
    Ri = 3,
    Prepend = 4,
    HangulL = 5,
    HangulV = 6,
    HangulT = 7,
    HangulLv = 8,
    HangulLvt = 9,
    InCbLinker = 10,
    InCbConsonant = 11,
    ExtPic = 12,
    Zwj = 13,
}

/// Number of cluster break classes. The emitted code indexes join rule
/// rows with `class & 15`, so this must stay at or below 16.
pub const CLUSTER_BREAK_COUNT: usize = 14;

/// Display width classes in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CharacterWidth {
    ZeroWidth = 0,
    Narrow = 1,
    Wide = 2,
    Ambiguous = 3,
}

/// Packs a cluster break class and a character width into one byte. The
/// width sits in the top two bits so the emitted accessor can extract it
/// with a single shift; bits 4 and 5 stay clear.
pub const fn packed_value(cb: ClusterBreak, width: CharacterWidth) -> u32 {
    cb as u32 | (width as u32) << 6
}

/// The flat per-codepoint array plus the document's description line,
/// which ends up in the emitted header.
#[derive(Debug)]
pub struct UcdData {
    pub description: String,
    pub values: Vec<u32>,
}

/// Walks the repertoire and fills the per-codepoint array in document
/// order, then applies the two hardcoded overrides. Any attribute value
/// outside the expected vocabulary aborts generation: this runs at build
/// time and silently guessing would bake the mistake into the terminal.
pub fn extract(doc: &Document) -> Result<UcdData> {
    let root = doc.root_element();
    ensure!(
        root.has_tag_name("ucd"),
        "expected a <ucd> root element, found <{}>",
        root.tag_name().name()
    );
    let description = root
        .children()
        .find(|n| n.has_tag_name("description"))
        .and_then(|n| n.text())
        .context("UCD document has no <description>")?
        .trim()
        .to_owned();
    let repertoire = root
        .children()
        .find(|n| n.has_tag_name("repertoire"))
        .context("UCD document has no <repertoire>")?;

    let mut values =
        vec![packed_value(ClusterBreak::Other, CharacterWidth::Narrow); NUM_CODEPOINTS];
    for group in repertoire.children().filter(|n| n.has_tag_name("group")) {
        for entry in group.children().filter(|n| n.has_tag_name("char")) {
            let range = codepoint_range(entry)?;
            let value = char_value(entry, group, &range)?;
            values[*range.start() as usize..=*range.end() as usize].fill(value);
        }
    }

    // Box drawing and block elements are Ambiguous in the UCD, but every
    // terminal draws them in a single cell.
    values[0x2500..=0x259F].fill(packed_value(ClusterBreak::Other, CharacterWidth::Narrow));
    // U+FE0F VARIATION SELECTOR-16 switches the preceding character to its
    // wide emoji presentation.
    values[0xFE0F] = packed_value(ClusterBreak::Extend, CharacterWidth::Wide);

    Ok(UcdData {
        description,
        values,
    })
}

fn parse_codepoint(s: &str) -> Result<u32> {
    u32::from_str_radix(s, 16).with_context(|| format!("failed to parse codepoint {s:?}"))
}

fn codepoint_range(entry: Node) -> Result<RangeInclusive<u32>> {
    let range = if let Some(cp) = entry.attribute("cp") {
        let cp = parse_codepoint(cp)?;
        cp..=cp
    } else {
        let (Some(first), Some(last)) = (entry.attribute("first-cp"), entry.attribute("last-cp"))
        else {
            bail!("<char> carries neither cp nor first-cp/last-cp");
        };
        parse_codepoint(first)?..=parse_codepoint(last)?
    };
    ensure!(
        range.start() <= range.end() && (*range.end() as usize) < NUM_CODEPOINTS,
        "invalid codepoint range U+{:04X}..U+{:04X}",
        range.start(),
        range.end()
    );
    Ok(range)
}

fn char_value(entry: Node, group: Node, range: &RangeInclusive<u32>) -> Result<u32> {
    let attr = |name: &str| {
        entry
            .attribute(name)
            .or_else(|| group.attribute(name))
            .with_context(|| {
                format!(
                    "missing {name} attribute for U+{:04X}..U+{:04X}",
                    range.start(),
                    range.end()
                )
            })
    };

    let gcb = attr("GCB")?;
    let mut cb = match gcb {
        "XX" => ClusterBreak::Other,
        "CR" | "LF" | "CN" => ClusterBreak::Control,
        // SpacingMark lands on Extend: we never want to break a cluster
        // before a combining spacing mark.
        "EX" | "SM" => ClusterBreak::Extend,
        "PP" => ClusterBreak::Prepend,
        "ZWJ" => ClusterBreak::Zwj,
        "RI" => ClusterBreak::Ri,
        "L" => ClusterBreak::HangulL,
        "V" => ClusterBreak::HangulV,
        "T" => ClusterBreak::HangulT,
        "LV" => ClusterBreak::HangulLv,
        "LVT" => ClusterBreak::HangulLvt,
        _ => bail!(
            "unrecognized GCB {gcb:?} for U+{:04X}..U+{:04X}",
            range.start(),
            range.end()
        ),
    };

    if attr("ExtPict")? == "Y" {
        ensure!(
            cb == ClusterBreak::Other,
            "ExtPict=Y on a non-Other class for U+{:04X}..U+{:04X}",
            range.start(),
            range.end()
        );
        cb = ClusterBreak::ExtPic;
    }

    let incb = attr("InCB")?;
    match incb {
        "None" | "Extend" => {}
        "Linker" => {
            ensure!(
                cb == ClusterBreak::Extend,
                "InCB=Linker on a non-Extend class for U+{:04X}..U+{:04X}",
                range.start(),
                range.end()
            );
            cb = ClusterBreak::InCbLinker;
        }
        "Consonant" => {
            ensure!(
                cb == ClusterBreak::Other,
                "InCB=Consonant on a non-Other class for U+{:04X}..U+{:04X}",
                range.start(),
                range.end()
            );
            cb = ClusterBreak::InCbConsonant;
        }
        _ => bail!(
            "unrecognized InCB {incb:?} for U+{:04X}..U+{:04X}",
            range.start(),
            range.end()
        ),
    }

    let ea = attr("ea")?;
    let mut width = match ea {
        "N" | "Na" | "H" => CharacterWidth::Narrow,
        "F" | "W" => CharacterWidth::Wide,
        "A" => CharacterWidth::Ambiguous,
        _ => bail!(
            "unrecognized ea {ea:?} for U+{:04X}..U+{:04X}",
            range.start(),
            range.end()
        ),
    };

    // Marks and format controls occupy no cell of their own, whatever
    // their East Asian width claims.
    let gc = attr("gc")?;
    if gc.starts_with('M') || gc == "Cf" {
        width = CharacterWidth::ZeroWidth;
    }

    Ok(packed_value(cb, width))
}
