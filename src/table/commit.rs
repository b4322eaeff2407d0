//! Per-cell copy plan for schema commits.
//!
//! ```text
//! old cell: | a (Stored) | b (Deleted) | c (Stored) |
//! fields:     a            b             c            d (Added)
//!
//! plan:     a <- Previous{offset 0}
//!           c <- Previous{offset |a|+|b|}
//!           d <- Default
//!
//! new cell: | a | c | d |
//! ```
//!
//! The plan is built from the field list before it is compacted, so `field`
//! indices refer to the uncompacted list and destination offsets to the new
//! cell layout.

use super::{FieldDef, FieldState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CopySource {
    Previous { offset: usize },
    Default,
}

#[derive(Debug, Clone, Copy)]
struct CopyStep {
    source: CopySource,
    field: usize,
    dest_offset: usize,
    size: usize,
}

#[derive(Debug)]
pub(super) struct CopyPlan {
    steps: Vec<CopyStep>,
    stride: usize,
    prev_stride: usize,
}

impl CopyPlan {
    pub(super) fn new(fields: &[FieldDef]) -> Self {
        let mut steps = Vec::with_capacity(fields.len());
        let mut stride = 0;
        let mut prev_stride = 0;

        for (i, field) in fields.iter().enumerate() {
            let source = match field.state {
                FieldState::Stored => {
                    prev_stride += field.size;
                    CopySource::Previous {
                        offset: field.offset,
                    }
                }
                FieldState::Added => CopySource::Default,
                FieldState::Deleted => {
                    prev_stride += field.size;
                    continue;
                }
            };

            steps.push(CopyStep {
                source,
                field: i,
                dest_offset: stride,
                size: field.size,
            });
            stride += field.size;
        }

        Self {
            steps,
            stride,
            prev_stride,
        }
    }

    /// Size of one cell in the new layout.
    pub(super) fn stride(&self) -> usize {
        self.stride
    }

    /// New offsets of the surviving fields, in order.
    pub(super) fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps.iter().map(|step| step.dest_offset)
    }

    /// Allocates a fresh buffer, broadcasting one cell of defaults to every
    /// cell when `use_defaults` is set.
    pub(super) fn rebuild(&self, fields: &[FieldDef], cells: usize, use_defaults: bool) -> Vec<u8> {
        let mut data = vec![0u8; cells * self.stride];
        if !use_defaults || self.stride == 0 {
            return data;
        }

        let mut template = vec![0u8; self.stride];
        for step in &self.steps {
            let default = &fields[step.field].default;
            template[step.dest_offset..step.dest_offset + step.size].copy_from_slice(default);
        }
        for cell in data.chunks_exact_mut(self.stride) {
            cell.copy_from_slice(&template);
        }
        data
    }

    /// Builds the new buffer from `old`, carrying stored fields forward and
    /// filling added ones. `old` is only read.
    pub(super) fn migrate(
        &self,
        fields: &[FieldDef],
        old: &[u8],
        cells: usize,
        use_defaults: bool,
    ) -> Vec<u8> {
        debug_assert_eq!(old.len(), cells * self.prev_stride);

        let mut data = vec![0u8; cells * self.stride];
        if self.stride == 0 {
            return data;
        }

        for (cell, dest) in data.chunks_exact_mut(self.stride).enumerate() {
            let base = cell * self.prev_stride;
            for step in &self.steps {
                let target = &mut dest[step.dest_offset..step.dest_offset + step.size];
                match step.source {
                    CopySource::Previous { offset } => {
                        let start = base + offset;
                        if let Some(src) = old.get(start..start + step.size) {
                            target.copy_from_slice(src);
                        }
                    }
                    CopySource::Default if use_defaults => {
                        target.copy_from_slice(&fields[step.field].default);
                    }
                    CopySource::Default => {}
                }
            }
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Token;

    fn field(size: usize, offset: usize, state: FieldState, fill: u8) -> FieldDef {
        FieldDef {
            name: Token::NULL,
            type_name: Token::NULL,
            size,
            default: vec![fill; size].into_boxed_slice(),
            offset,
            state,
        }
    }

    #[test]
    fn plan_drops_deleted_and_appends_added() {
        let fields = [
            field(2, 0, FieldState::Stored, 0),
            field(1, 2, FieldState::Deleted, 0),
            field(4, 3, FieldState::Stored, 0),
            field(1, 0, FieldState::Added, 9),
        ];
        let plan = CopyPlan::new(&fields);

        assert_eq!(plan.stride(), 7);
        assert_eq!(plan.prev_stride, 7);
        assert_eq!(plan.offsets().collect::<Vec<_>>(), vec![0, 2, 6]);
        assert_eq!(plan.steps[1].source, CopySource::Previous { offset: 3 });
        assert_eq!(plan.steps[2].source, CopySource::Default);
    }

    #[test]
    fn migrate_copies_per_cell() {
        let fields = [
            field(1, 0, FieldState::Deleted, 0),
            field(1, 1, FieldState::Stored, 0),
            field(1, 0, FieldState::Added, 7),
        ];
        let plan = CopyPlan::new(&fields);
        let old = [1u8, 2, 3, 4, 5, 6];

        assert_eq!(plan.migrate(&fields, &old, 3, true), vec![2, 7, 4, 7, 6, 7]);
        assert_eq!(plan.migrate(&fields, &old, 3, false), vec![2, 0, 4, 0, 6, 0]);
    }

    #[test]
    fn rebuild_broadcasts_defaults() {
        let fields = [
            field(1, 0, FieldState::Stored, 5),
            field(2, 0, FieldState::Added, 6),
        ];
        let plan = CopyPlan::new(&fields);

        assert_eq!(plan.rebuild(&fields, 2, true), vec![5, 6, 6, 5, 6, 6]);
        assert_eq!(plan.rebuild(&fields, 2, false), vec![0; 6]);
    }

    #[test]
    fn empty_schema_allocates_nothing() {
        let plan = CopyPlan::new(&[]);
        assert!(plan.rebuild(&[], 100, true).is_empty());
        assert!(plan.migrate(&[], &[], 100, true).is_empty());
    }
}
