//! Text export of the reconstructed model
//!
//! The dump is plain diffable text: one block per type, fields indented with
//! their offsets in hex. Verbose mode adds the kind tag and the
//! parent/interface decoration to each type header; value-kind markers
//! print in both modes, and only on fields that carry one.

use crate::core::VERSION;
use crate::model::TypeNode;
use std::fmt::Write as _;

/// Stage lengths text export contributes to the progress total
pub const EXPORT_STAGE_LENGTHS: f64 = 2.0;

/// Render the full dump as text.
///
/// Fields whose offset exceeds `field_offset_bound` were flagged corrupt
/// during resolution and are left out of the listing.
pub fn format_dump(nodes: &[TypeNode], verbose: bool, field_offset_bound: i32) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Generated by monodump v{}", VERSION);
    out.push('\n');
    out.push_str("S = Static\n");
    out.push_str("C = Constant\n");
    out.push('\n');

    for node in nodes {
        if verbose {
            let _ = write!(out, "[{}] ", node.kind);
        }
        out.push_str(&node.full_name);

        // Header decoration belongs to the verbose mode only
        if verbose {
            if let Some(parent_idx) = node.parent {
                let _ = write!(out, " : {}", nodes[parent_idx].full_name);
                for &iface_idx in &node.interfaces {
                    let _ = write!(out, ", {}", nodes[iface_idx].name);
                }
            }
        }
        out.push('\n');

        for field in &node.fields {
            if field.offset > field_offset_bound {
                continue;
            }
            match field.value_kind {
                Some(kind) => {
                    let _ = writeln!(
                        out,
                        "    [{:02X}][{}] {} : {}",
                        field.offset,
                        kind.marker(),
                        field.name,
                        field.type_name
                    );
                }
                None => {
                    let _ = writeln!(
                        out,
                        "    [{:02X}] {} : {}",
                        field.offset, field.name, field.type_name
                    );
                }
            }
        }
        out.push('\n');
    }

    out
}
