//! The grapheme join rules and their packed encoding.
//!
//! Cluster boundaries are decided by a two-state machine: state 0 is the
//! ordinary join state, state 1 means the cluster just absorbed a regional
//! indicator pair, and 3 is the break sentinel. The machine follows UAX #29
//! with deliberate simplifications suited to a terminal:
//!
//! - GB9c is reduced to "join before a linker" and "a linker joins a
//!   consonant", with no leading-consonant requirement.
//! - GB11 is reduced to "ZWJ joins a pictograph", with no leading
//!   pictograph requirement.
//! - GB12/GB13 pair regional indicators greedily from the left, so
//!   odd-length RI runs break after the first pair.

use anyhow::{ensure, Result};

use crate::ucd::{ClusterBreak, CLUSTER_BREAK_COUNT};

const _: () = assert!(CLUSTER_BREAK_COUNT <= 16, "join rule rows hold 16 cells");

/// Bytes taken by the emitted `s_joinRules[2][16]` array.
pub const RULES_SIZE: usize = 2 * 16 * 4;

// Cell values: J continues the cluster, P continues it and arms the
// regional indicator pair state, B ends it.
const J: u8 = 0;
const P: u8 = 1;
const B: u8 = 3;

/// Transition tables of the join state machine, indexed by
/// `[state][leading class][trailing class]` in `ClusterBreak` ordinal
/// order:
///
/// Other, Control, Extend, RI, Prepend, HangulL, HangulV, HangulT,
/// HangulLV, HangulLVT, InCBLinker, InCBConsonant, ExtPic, ZWJ.
///
/// The state 1 table differs from state 0 in a single cell: a further
/// RI×RI join is forbidden, so flag sequences split into pairs.
#[rustfmt::skip]
pub const JOIN_RULES: [[[u8; CLUSTER_BREAK_COUNT]; CLUSTER_BREAK_COUNT]; 2] = [
    [
        /* Other         */ [B, B, J, B, B, B, B, B, B, B, J, B, B, J],
        /* Control       */ [B, B, B, B, B, B, B, B, B, B, B, B, B, B],
        /* Extend        */ [B, B, J, B, B, B, B, B, B, B, J, B, B, J],
        /* RI            */ [B, B, J, P, B, B, B, B, B, B, J, B, B, J],
        /* Prepend       */ [J, B, J, J, J, J, J, J, J, J, J, J, J, J],
        /* HangulL       */ [B, B, J, B, B, J, J, B, J, J, J, B, B, J],
        /* HangulV       */ [B, B, J, B, B, B, J, J, B, B, J, B, B, J],
        /* HangulT       */ [B, B, J, B, B, B, B, J, B, B, J, B, B, J],
        /* HangulLV      */ [B, B, J, B, B, B, J, J, B, B, J, B, B, J],
        /* HangulLVT     */ [B, B, J, B, B, B, B, J, B, B, J, B, B, J],
        /* InCBLinker    */ [B, B, J, B, B, B, B, B, B, B, J, J, B, J],
        /* InCBConsonant */ [B, B, J, B, B, B, B, B, B, B, J, B, B, J],
        /* ExtPic        */ [B, B, J, B, B, B, B, B, B, B, J, B, B, J],
        /* ZWJ           */ [B, B, J, B, B, B, B, B, B, B, J, B, J, J],
    ],
    [
        /* Other         */ [B, B, J, B, B, B, B, B, B, B, J, B, B, J],
        /* Control       */ [B, B, B, B, B, B, B, B, B, B, B, B, B, B],
        /* Extend        */ [B, B, J, B, B, B, B, B, B, B, J, B, B, J],
        /* RI            */ [B, B, J, B, B, B, B, B, B, B, J, B, B, J],
        /* Prepend       */ [J, B, J, J, J, J, J, J, J, J, J, J, J, J],
        /* HangulL       */ [B, B, J, B, B, J, J, B, J, J, J, B, B, J],
        /* HangulV       */ [B, B, J, B, B, B, J, J, B, B, J, B, B, J],
        /* HangulT       */ [B, B, J, B, B, B, B, J, B, B, J, B, B, J],
        /* HangulLV      */ [B, B, J, B, B, B, J, J, B, B, J, B, B, J],
        /* HangulLVT     */ [B, B, J, B, B, B, B, J, B, B, J, B, B, J],
        /* InCBLinker    */ [B, B, J, B, B, B, B, B, B, B, J, J, B, J],
        /* InCBConsonant */ [B, B, J, B, B, B, B, B, B, B, J, B, B, J],
        /* ExtPic        */ [B, B, J, B, B, B, B, B, B, B, J, B, B, J],
        /* ZWJ           */ [B, B, J, B, B, B, B, B, B, B, J, B, J, J],
    ],
];

/// Packs each rule row into a `u32`, two bits per trailing class. Rows
/// longer than 16 cells or cells above the break sentinel are table
/// authoring bugs and abort generation.
pub fn pack_rules<const N: usize>(rules: &[[[u8; N]; N]; 2]) -> Result<[[u32; 16]; 2]> {
    ensure!(N <= 16, "join rule rows must fit 16 two-bit cells, got {N}");
    let mut packed = [[0u32; 16]; 2];
    for (state, table) in rules.iter().enumerate() {
        for (lead, row) in table.iter().enumerate() {
            let mut word = 0u32;
            for (trail, &cell) in row.iter().enumerate() {
                ensure!(
                    cell <= 3,
                    "join rule cell out of range: rules[{state}][{lead}][{trail}] = {cell}"
                );
                word |= u32::from(cell) << (trail * 2);
            }
            packed[state][lead] = word;
        }
    }
    Ok(packed)
}

/// Reference implementation of the emitted `ucdGraphemeJoins` accessor:
/// next state for a trailing class arriving after a leading class.
pub fn grapheme_joins(rules: &[[u32; 16]; 2], state: u32, lead: u32, trail: u32) -> u32 {
    rules[state as usize][(lead & 15) as usize] >> ((trail & 15) * 2) & 3
}

/// Reference implementation of the emitted `ucdGraphemeDone` accessor.
pub fn grapheme_done(state: u32) -> bool {
    state == 3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ucd::ClusterBreak::*;

    fn packed() -> [[u32; 16]; 2] {
        pack_rules(&JOIN_RULES).unwrap()
    }

    fn joins(rules: &[[u32; 16]; 2], state: u32, lead: ClusterBreak, trail: ClusterBreak) -> u32 {
        grapheme_joins(rules, state, lead as u32, trail as u32)
    }

    #[test]
    fn packing_round_trips_every_cell() {
        let packed = packed();
        for state in 0..2 {
            for lead in 0..CLUSTER_BREAK_COUNT {
                for trail in 0..CLUSTER_BREAK_COUNT {
                    assert_eq!(
                        packed[state][lead] >> (trail * 2) & 3,
                        u32::from(JOIN_RULES[state][lead][trail]),
                        "state {state} lead {lead} trail {trail}"
                    );
                }
            }
        }
    }

    #[test]
    fn unused_cells_pack_to_zero() {
        let packed = packed();
        for table in &packed {
            for &word in &table[CLUSTER_BREAK_COUNT..] {
                assert_eq!(word, 0);
            }
            for &word in &table[..CLUSTER_BREAK_COUNT] {
                assert_eq!(word >> (CLUSTER_BREAK_COUNT * 2), 0);
            }
        }
    }

    #[test]
    fn rejects_oversized_rows() {
        let rules = [[[0u8; 17]; 17]; 2];
        assert!(pack_rules(&rules).is_err());
    }

    #[test]
    fn rejects_out_of_range_cells() {
        let mut rules = [[[0u8; 14]; 14]; 2];
        rules[1][3][3] = 4;
        let err = pack_rules(&rules).unwrap_err();
        assert!(err.to_string().contains("rules[1][3][3]"));
    }

    #[test]
    fn combining_mark_joins_its_base() {
        // U+0041 U+0301: no break between Other and Extend.
        let packed = packed();
        assert_eq!(joins(&packed, 0, Other, Extend), 0);
    }

    #[test]
    fn regional_indicators_join_in_pairs() {
        // Four RIs (two flags): the pair state forces a break before the
        // third, then the second pair joins again.
        let packed = packed();
        let state = joins(&packed, 0, Ri, Ri);
        assert_eq!(state, 1);
        let state = joins(&packed, state, Ri, Ri);
        assert!(grapheme_done(state));
        let state = joins(&packed, 0, Ri, Ri);
        assert_eq!(state, 1);
    }

    #[test]
    fn conjunct_linker_chain_stays_joined() {
        // KA, VIRAMA, KA: consonant joins linker, linker joins consonant.
        let packed = packed();
        assert_eq!(joins(&packed, 0, InCbConsonant, InCbLinker), 0);
        assert_eq!(joins(&packed, 0, InCbLinker, InCbConsonant), 0);
    }

    #[test]
    fn controls_break_both_ways() {
        let packed = packed();
        assert!(grapheme_done(joins(&packed, 0, Control, Extend)));
        assert!(grapheme_done(joins(&packed, 0, Other, Control)));
    }

    #[test]
    fn prepend_joins_forward_except_controls() {
        let packed = packed();
        assert_eq!(joins(&packed, 0, Prepend, Other), 0);
        assert_eq!(joins(&packed, 0, Prepend, ExtPic), 0);
        assert!(grapheme_done(joins(&packed, 0, Prepend, Control)));
    }

    #[test]
    fn zwj_joins_pictographs() {
        let packed = packed();
        assert_eq!(joins(&packed, 0, Zwj, ExtPic), 0);
        assert!(grapheme_done(joins(&packed, 0, Other, ExtPic)));
    }

    #[test]
    fn hangul_syllable_composition() {
        let packed = packed();
        assert_eq!(joins(&packed, 0, HangulL, HangulV), 0);
        assert_eq!(joins(&packed, 0, HangulV, HangulT), 0);
        assert_eq!(joins(&packed, 0, HangulLv, HangulT), 0);
        assert_eq!(joins(&packed, 0, HangulLvt, HangulT), 0);
        assert!(grapheme_done(joins(&packed, 0, HangulT, HangulV)));
    }
}
