//! Text-level renaming of flattened entities
//!
//! When a nested model is flattened into its parent, its links and joints
//! get scoped names, and every reference to them (joint `<parent>` and
//! `<child>`, attribute values) has to follow. References are plain strings
//! with no schema marking them as such, so the renaming works on the
//! serialized document: a name is replaced wherever it appears as a whole
//! quoted attribute value or as the whole text of an element.

use quick_xml::escape::escape;
use std::collections::BTreeMap;

/// Replace every whole occurrence of the map's keys in `text`.
///
/// Occurrences count when delimited as `"old"`, `'old'` or `>old<`.
/// Names are matched in their escaped form, the way they appear in
/// serialized XML.
pub fn rename_by_substitution(text: &str, renames: &BTreeMap<String, String>) -> String {
    let mut out = text.to_string();
    for (old, new) in renames {
        let old = escape(old.as_str());
        let new = escape(new.as_str());
        for (open, close) in [("\"", "\""), ("'", "'"), (">", "<")] {
            out = out.replace(
                &format!("{}{}{}", open, old, close),
                &format!("{}{}{}", open, new, close),
            );
        }
    }
    out
}
