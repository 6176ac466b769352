//! Flat schema model
//!
//! A schema is a pre-order list of entries; `depth` gives the nesting
//! level. Only header-only entries have children: the engines step inside
//! their content instead of consuming it whole.
//!
//! ```text
//! Certificate-like prefix:
//!   0 SEQUENCE      header_only
//!   1   SEQUENCE    header_only
//!   2     [0]       header_only  optional
//!   3       INTEGER
//!   2     INTEGER
//! ```

use std::fmt;

use asn1tpl_core::tags::{self, CONSTRUCTED};
use asn1tpl_core::{Asn1Error, Asn1Result};

/// Maximum nesting depth of a schema entry
pub const MAX_DEPTH: usize = 16;

/// Number of distinct choice groups (numbered `1..=MAX_CHOICE_GROUPS`)
pub const MAX_CHOICE_GROUPS: usize = 8;

/// Presence rule of a schema entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Optionality {
    /// The item must be present
    #[default]
    Required,
    /// The item may be absent
    Optional,
    /// Member of a numbered choice group; exactly one member of a run of
    /// siblings in the same group must be present when decoding
    Choice(u8),
}

/// One element of a flat schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaEntry {
    /// Nesting level
    pub depth: u8,
    /// Tag byte without the constructed bit
    pub tag: u8,
    /// Whether the constructed bit is set on the wire
    pub constructed: bool,
    /// Only the header is consumed/produced; children follow in the schema
    pub header_only: bool,
    /// Presence rule
    pub optional: Optionality,
}

impl SchemaEntry {
    pub const fn new(
        depth: u8,
        tag: u8,
        constructed: bool,
        header_only: bool,
        optional: Optionality,
    ) -> Self {
        Self {
            depth,
            tag: tag & !CONSTRUCTED,
            constructed,
            header_only,
            optional,
        }
    }

    /// Constructed SEQUENCE entry whose children follow
    pub const fn sequence(depth: u8) -> Self {
        Self::new(depth, tags::SEQUENCE, true, true, Optionality::Required)
    }

    /// Constructed SET entry whose children follow
    pub const fn set(depth: u8) -> Self {
        Self::new(depth, tags::SET, true, true, Optionality::Required)
    }

    /// Primitive leaf entry
    pub const fn leaf(depth: u8, tag: u8) -> Self {
        Self::new(depth, tag, false, false, Optionality::Required)
    }

    /// Constructed context-specific `[n]` entry whose children follow
    pub const fn explicit(depth: u8, n: u8) -> Self {
        Self::new(depth, tags::context(n), true, true, Optionality::Required)
    }

    /// Primitive context-specific `[n]` leaf
    pub const fn implicit(depth: u8, n: u8) -> Self {
        Self::new(depth, tags::context(n), false, false, Optionality::Required)
    }

    /// Same entry, but only its header is consumed/produced
    pub const fn header(self) -> Self {
        Self { header_only: true, ..self }
    }

    /// Same entry, marked optional
    pub const fn optional(self) -> Self {
        Self {
            optional: Optionality::Optional,
            ..self
        }
    }

    /// Same entry, member of choice group `group`
    pub const fn choice(self, group: u8) -> Self {
        Self {
            optional: Optionality::Choice(group),
            ..self
        }
    }

    /// Tag byte as it appears on the wire
    pub const fn wire_tag(&self) -> u8 {
        if self.constructed { self.tag | CONSTRUCTED } else { self.tag }
    }

    /// Choice group number, if any
    pub fn choice_group(&self) -> Option<u8> {
        match self.optional {
            Optionality::Choice(group) => Some(group),
            _ => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.optional == Optionality::Optional
    }
}

impl fmt::Display for SchemaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:width$}{}", "", tags::name(self.wire_tag()), width = self.depth as usize * 2)?;
        if self.constructed {
            f.write_str(" constructed")?;
        }
        if self.header_only {
            f.write_str(" header")?;
        }
        match self.optional {
            Optionality::Required => Ok(()),
            Optionality::Optional => f.write_str(" optional"),
            Optionality::Choice(group) => write!(f, " choice({})", group),
        }
    }
}

/// Displays a schema one entry per line
pub struct SchemaDisplay<'s>(pub &'s [SchemaEntry]);

impl fmt::Display for SchemaDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.0.iter().enumerate() {
            writeln!(f, "{:3}: {}", i, entry)?;
        }
        Ok(())
    }
}

/// Check the structural rules both engines rely on
///
/// - depth stays below [`MAX_DEPTH`]
/// - the first entry is at depth 0 and depth grows by at most one, and
///   only below a header-only entry
/// - choice group numbers are in `1..=MAX_CHOICE_GROUPS`
pub fn validate_schema(schema: &[SchemaEntry]) -> Asn1Result<()> {
    let mut prev: Option<&SchemaEntry> = None;
    for (i, entry) in schema.iter().enumerate() {
        let depth = entry.depth as usize;
        if depth >= MAX_DEPTH {
            return Err(Asn1Error::InternalError(format!(
                "schema entry {} depth {} exceeds {}",
                i, depth, MAX_DEPTH
            )));
        }
        match prev {
            None if depth != 0 => {
                return Err(Asn1Error::InternalError(
                    "schema must start at depth 0".to_string(),
                ));
            }
            Some(p) if entry.depth > p.depth && (entry.depth != p.depth + 1 || !p.header_only) => {
                return Err(Asn1Error::InternalError(format!(
                    "schema entry {} nests under entry {} which has no children",
                    i,
                    i - 1
                )));
            }
            _ => {}
        }
        if let Some(group) = entry.choice_group() {
            if group == 0 || group as usize > MAX_CHOICE_GROUPS {
                return Err(Asn1Error::InternalError(format!(
                    "schema entry {} choice group {} out of range",
                    i, group
                )));
            }
        }
        prev = Some(entry);
    }
    Ok(())
}

/// Index one past the last descendant of entry `i`
pub fn subtree_end(schema: &[SchemaEntry], i: usize) -> usize {
    let depth = schema[i].depth;
    schema[i + 1..]
        .iter()
        .position(|e| e.depth <= depth)
        .map_or(schema.len(), |p| i + 1 + p)
}

/// Iterator over the indices of ancestors of entry `i`, nearest first
pub fn ancestors(schema: &[SchemaEntry], i: usize) -> impl Iterator<Item = usize> + '_ {
    let mut depth = schema[i].depth;
    (0..i).rev().filter(move |&j| {
        if schema[j].depth < depth {
            depth = schema[j].depth;
            true
        } else {
            false
        }
    })
}

/// Whether entry `i` starts a run of same-group choice siblings
pub fn starts_choice_run(schema: &[SchemaEntry], i: usize) -> bool {
    let entry = &schema[i];
    let prev_sibling = (0..i)
        .rev()
        .find(|&j| schema[j].depth <= entry.depth)
        .filter(|&j| schema[j].depth == entry.depth);
    match prev_sibling {
        Some(j) => schema[j].optional != entry.optional,
        None => true,
    }
}

/// Whether the run containing entry `i` ends at `next` (its subtree end)
pub fn ends_choice_run(schema: &[SchemaEntry], i: usize, next: usize) -> bool {
    match schema.get(next) {
        Some(e) => e.depth != schema[i].depth || e.optional != schema[i].optional,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSA_PUBLIC_KEY: [SchemaEntry; 3] = [
        SchemaEntry::sequence(0),
        SchemaEntry::leaf(1, tags::INTEGER),
        SchemaEntry::leaf(1, tags::INTEGER),
    ];

    #[test]
    fn test_wire_tag() {
        assert_eq!(SchemaEntry::sequence(0).wire_tag(), 0x30);
        assert_eq!(SchemaEntry::explicit(1, 0).wire_tag(), 0xA0);
        assert_eq!(SchemaEntry::implicit(1, 2).wire_tag(), 0x82);
        // Constructed bit in the tag argument is ignored
        assert_eq!(SchemaEntry::new(0, 0x30, false, false, Optionality::Required).wire_tag(), 0x10);
    }

    #[test]
    fn test_validate_schema() {
        assert!(validate_schema(&RSA_PUBLIC_KEY).is_ok());
        assert!(validate_schema(&[]).is_ok());

        let bad_start = [SchemaEntry::leaf(1, tags::INTEGER)];
        assert!(validate_schema(&bad_start).is_err());

        let under_leaf = [SchemaEntry::leaf(0, tags::INTEGER), SchemaEntry::leaf(1, tags::INTEGER)];
        assert!(matches!(validate_schema(&under_leaf), Err(Asn1Error::InternalError(_))));

        let jump = [SchemaEntry::sequence(0), SchemaEntry::leaf(2, tags::INTEGER)];
        assert!(validate_schema(&jump).is_err());

        let bad_group = [SchemaEntry::sequence(0), SchemaEntry::leaf(1, tags::NULL).choice(9)];
        assert!(validate_schema(&bad_group).is_err());
    }

    #[test]
    fn test_subtree_and_ancestors() {
        let schema = [
            SchemaEntry::sequence(0),
            SchemaEntry::sequence(1),
            SchemaEntry::leaf(2, tags::OBJECT_ID),
            SchemaEntry::leaf(2, tags::NULL).optional(),
            SchemaEntry::leaf(1, tags::BIT_STRING),
        ];
        assert_eq!(subtree_end(&schema, 0), 5);
        assert_eq!(subtree_end(&schema, 1), 4);
        assert_eq!(subtree_end(&schema, 2), 3);
        assert_eq!(ancestors(&schema, 3).collect::<Vec<_>>(), vec![1, 0]);
        assert_eq!(ancestors(&schema, 4).collect::<Vec<_>>(), vec![0]);
        assert!(ancestors(&schema, 0).next().is_none());
    }

    #[test]
    fn test_choice_runs() {
        let schema = [
            SchemaEntry::sequence(0),
            SchemaEntry::leaf(1, tags::INTEGER).choice(1),
            SchemaEntry::explicit(1, 0).choice(1),
            SchemaEntry::leaf(2, tags::NULL),
            SchemaEntry::leaf(1, tags::NULL).choice(1),
            SchemaEntry::leaf(1, tags::BOOLEAN),
        ];
        assert!(starts_choice_run(&schema, 1));
        assert!(!starts_choice_run(&schema, 2));
        assert!(!starts_choice_run(&schema, 4));
        assert!(!ends_choice_run(&schema, 1, 2));
        assert!(!ends_choice_run(&schema, 2, 4));
        assert!(ends_choice_run(&schema, 4, 5));
    }

    #[test]
    fn test_display() {
        let text = SchemaDisplay(&RSA_PUBLIC_KEY).to_string();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("header"));
        let entry = SchemaEntry::leaf(1, tags::NULL).optional();
        assert!(entry.to_string().ends_with("optional"));
    }
}
