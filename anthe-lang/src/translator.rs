//! Byte-faithful erasure of type annotations.
//!
//! The source-to-source backend keeps the surface program intact and only
//! blanks out the regions the parser marked as type annotations, so the
//! result is a legal host-language program whose every byte sits at the
//! same line and column as in the original. Diagnostics from the host
//! interpreter therefore point at the same coordinates the typed source
//! uses.

/// An inclusive `[start, end]` byte range, 1-based as the host counts
/// string positions.
pub type Region = (usize, usize);

/// Replaces every byte inside `type_regions` with a space, with two
/// exceptions: newlines stay (lines must not shift) and bytes inside a
/// `comment_regions` entry stay (comments survive erasure verbatim).
/// Bytes outside all type regions are emitted unchanged.
///
/// Comments must lie entirely inside or entirely outside any type
/// region; a straddling comment means the parser produced inconsistent
/// regions, and the translator refuses with the offending offsets rather
/// than guess. The output always has exactly the input's byte length.
pub fn erase_types(src: &str, type_regions: &[Region], comment_regions: &[Region]) -> String {
    let bytes = src.as_bytes();
    let mut out = bytes.to_vec();

    for &(cs, ce) in comment_regions {
        for &(ts, te) in type_regions {
            let inside = cs >= ts && ce <= te;
            let outside = ce < ts || cs > te;
            assert!(
                inside || outside,
                "comment [{cs}, {ce}] straddles the type region [{ts}, {te}]"
            );
        }
    }

    for &(ts, te) in type_regions {
        assert!(
            ts >= 1 && ts <= te && te <= bytes.len(),
            "type region [{ts}, {te}] out of range for a source of {} bytes",
            bytes.len()
        );
        for pos in ts..=te {
            let in_comment = comment_regions
                .iter()
                .any(|&(cs, ce)| cs <= pos && pos <= ce);
            if !in_comment && out[pos - 1] != b'\n' {
                out[pos - 1] = b' ';
            }
        }
    }

    String::from_utf8(out).expect("erasure must not split multi-byte sequences")
}
