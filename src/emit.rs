//! Renders the chosen trie and the packed join rules as a C++ module.
//!
//! The module is a handful of `constexpr` arrays plus four accessor
//! routines, bracketed by clang-format directives so the generated layout
//! survives the consuming repo's formatting hooks. Stage arrays print 16
//! elements per row for the root and one chunk per row for the rest, which
//! keeps diffs of regenerated tables readable.

use std::fmt::Write;

use crate::rules::RULES_SIZE;
use crate::trie::{Trie, ROOT_MASK};

/// Writes the complete module. The timestamp is injected by the caller so
/// reruns over the same input can be compared byte for byte.
pub fn emit_module(
    out: &mut String,
    trie: &Trie,
    rules: &[[u32; 16]; 2],
    description: &str,
    timestamp: &str,
) -> std::fmt::Result {
    writeln!(out, "// Generated by grapheme-table-gen")?;
    writeln!(
        out,
        "// on {timestamp}, from {description}, {} bytes",
        trie.total_size + RULES_SIZE
    )?;
    writeln!(out, "// clang-format off")?;

    for (i, stage) in trie.stages.iter().enumerate() {
        let per_row = if stage.mask == ROOT_MASK {
            16
        } else {
            (stage.mask + 1) as usize
        };
        let nibbles = (stage.bits / 4) as usize;
        writeln!(out, "static constexpr uint{}_t s_stage{}[] = {{", stage.bits, i + 1)?;
        for row in stage.values.chunks(per_row) {
            out.push_str("   ");
            for &value in row {
                write!(out, " {:#0width$x},", value, width = nibbles + 2)?;
            }
            out.push('\n');
        }
        writeln!(out, "}};")?;
    }

    writeln!(out, "static constexpr uint32_t s_joinRules[{}][16] = {{", rules.len())?;
    for table in rules {
        writeln!(out, "    {{")?;
        for &word in table {
            writeln!(out, "        0b{word:032b},")?;
        }
        writeln!(out, "    }},")?;
    }
    writeln!(out, "}};")?;

    let leaf = trie.stages.last().expect("a trie always has stages");
    writeln!(
        out,
        "constexpr uint{}_t ucdLookup(const char32_t cp) noexcept",
        leaf.bits
    )?;
    writeln!(out, "{{")?;
    for (i, stage) in trie.stages.iter().enumerate() {
        let target = format!("const auto s{} = s_stage{}[", i + 1, i + 1);
        if stage.mask == ROOT_MASK {
            writeln!(out, "    {target}cp >> {}];", stage.shift)?;
        } else if stage.shift == 0 {
            writeln!(out, "    {target}s{} + (cp & {})];", i, stage.mask)?;
        } else {
            writeln!(
                out,
                "    {target}s{} + ((cp >> {}) & {})];",
                i, stage.shift, stage.mask
            )?;
        }
    }
    writeln!(out, "    return s{};", trie.stages.len())?;
    writeln!(out, "}}")?;

    writeln!(
        out,
        "constexpr int ucdGraphemeJoins(const int state, const int lead, const int trail) noexcept"
    )?;
    writeln!(out, "{{")?;
    writeln!(out, "    return (s_joinRules[state][lead & 15] >> ((trail & 15) * 2)) & 3;")?;
    writeln!(out, "}}")?;

    writeln!(out, "constexpr bool ucdGraphemeDone(const int state) noexcept")?;
    writeln!(out, "{{")?;
    writeln!(out, "    return state == 3;")?;
    writeln!(out, "}}")?;

    writeln!(out, "constexpr int ucdToCharacterWidth(const int val) noexcept")?;
    writeln!(out, "{{")?;
    writeln!(out, "    return val >> 6;")?;
    writeln!(out, "}}")?;

    writeln!(out, "// clang-format on")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{pack_rules, JOIN_RULES};
    use crate::trie::build_trie;

    fn sample_module() -> String {
        let values: Vec<u32> = (0..256u32).map(|cp| u32::from(cp >= 0x80) << 6).collect();
        let trie = build_trie(&values, &[2, 3]);
        trie.verify(&values).unwrap();
        let rules = pack_rules(&JOIN_RULES).unwrap();
        let mut out = String::new();
        emit_module(&mut out, &trie, &rules, "Unicode 16.0.0", "2024-05-31T00:00:00Z").unwrap();
        out
    }

    #[test]
    fn header_names_timestamp_description_and_size() {
        let module = sample_module();
        let mut lines = module.lines();
        assert_eq!(lines.next(), Some("// Generated by grapheme-table-gen"));
        let info = lines.next().unwrap();
        assert!(info.starts_with("// on 2024-05-31T00:00:00Z, from Unicode 16.0.0, "));
        assert!(info.ends_with(" bytes"));
        assert_eq!(lines.next(), Some("// clang-format off"));
        assert!(module.ends_with("// clang-format on\n"));
    }

    #[test]
    fn stages_emit_in_root_first_order() {
        let module = sample_module();
        let s1 = module.find("s_stage1[] = {").unwrap();
        let s2 = module.find("s_stage2[] = {").unwrap();
        let s3 = module.find("s_stage3[] = {").unwrap();
        assert!(s1 < s2 && s2 < s3);
    }

    #[test]
    fn elements_are_zero_padded_to_the_stage_width() {
        let module = sample_module();
        // All three stages of the sample fit in 8 bits: two hex nibbles.
        assert!(module.contains(" 0x00,"));
        assert!(!module.contains(" 0x000,"));
    }

    #[test]
    fn join_rules_emit_as_binary_words() {
        let module = sample_module();
        assert!(module.contains("static constexpr uint32_t s_joinRules[2][16] = {"));
        // The Control row breaks before all 14 classes: 28 low bits set.
        assert!(module.contains(&format!("        0b{:032b},", 0x0FFF_FFFFu32)));
    }

    #[test]
    fn lookup_routine_masks_every_stage_but_the_root() {
        let module = sample_module();
        assert!(module.contains("constexpr uint8_t ucdLookup(const char32_t cp) noexcept"));
        assert!(module.contains("const auto s1 = s_stage1[cp >> 5];"));
        assert!(module.contains("const auto s2 = s_stage2[s1 + ((cp >> 2) & 7)];"));
        assert!(module.contains("const auto s3 = s_stage3[s2 + (cp & 3)];"));
        assert!(module.contains("    return s3;"));
    }

    #[test]
    fn accessor_contracts_are_fixed() {
        let module = sample_module();
        assert!(module
            .contains("return (s_joinRules[state][lead & 15] >> ((trail & 15) * 2)) & 3;"));
        assert!(module.contains("constexpr bool ucdGraphemeDone(const int state) noexcept"));
        assert!(module.contains("return state == 3;"));
        assert!(module.contains("return val >> 6;"));
    }
}
