//! Orphan repair
//!
//! Historical data contains annotations whose parent reference was never
//! written. The repair pass re-derives the hierarchy from entity references:
//! an orphan attaches to the most recently created annotation of the
//! enclosing kind that represents the same entity.

use crate::error::{HierarchyError, HierarchyResult};
use crate::store::HierarchyStore;
use annot_model::{AnnotationId, AnnotationKind};

/// Per-kind outcome of a repair pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindOutcome {
    pub kind: AnnotationKind,
    pub fixed: usize,
    pub failed: usize,
}

/// Result of a batch repair pass, consumed by the repair CLI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairReport {
    outcomes: Vec<KindOutcome>,
    repaired: Vec<(AnnotationId, AnnotationId)>,
    failed: Vec<AnnotationId>,
}

impl RepairReport {
    /// Repaired (orphan, new parent) pairs in repair order.
    pub fn repaired(&self) -> &[(AnnotationId, AnnotationId)] {
        &self.repaired
    }

    pub fn failed(&self) -> &[AnnotationId] {
        &self.failed
    }

    pub fn outcomes(&self) -> &[KindOutcome] {
        &self.outcomes
    }

    pub fn total_fixed(&self) -> usize {
        self.repaired.len()
    }

    pub fn total_failed(&self) -> usize {
        self.failed.len()
    }

    fn record_fixed(&mut self, kind: AnnotationKind, orphan: AnnotationId, parent: AnnotationId) {
        self.outcome_mut(kind).fixed += 1;
        self.repaired.push((orphan, parent));
    }

    fn record_failed(&mut self, kind: AnnotationKind, orphan: AnnotationId) {
        self.outcome_mut(kind).failed += 1;
        self.failed.push(orphan);
    }

    fn outcome_mut(&mut self, kind: AnnotationKind) -> &mut KindOutcome {
        let index = match self.outcomes.iter().position(|o| o.kind == kind) {
            Some(index) => index,
            None => {
                self.outcomes.push(KindOutcome { kind, fixed: 0, failed: 0 });
                self.outcomes.len() - 1
            }
        };

        &mut self.outcomes[index]
    }
}

impl std::fmt::Display for RepairReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.outcomes.is_empty() {
            return writeln!(f, "no orphans found");
        }

        for outcome in &self.outcomes {
            writeln!(
                f,
                "{}: {} repaired, {} failed",
                outcome.kind, outcome.fixed, outcome.failed
            )?;
        }
        Ok(())
    }
}

impl HierarchyStore {
    /// Attach an orphan to the most recently created annotation of the
    /// enclosing kind that shares its entity reference.
    ///
    /// Candidates that are themselves rooted (rooms, or nodes with a parent)
    /// win over other orphans so repairs never chain orphans together when a
    /// rooted candidate exists. Most recently created means highest id.
    pub fn repair_orphan(&mut self, id: AnnotationId) -> HierarchyResult<AnnotationId> {
        let orphan = self.get(id).ok_or(HierarchyError::NotFound(id))?;

        let Some(required) = orphan.kind.parent_kind() else {
            return Err(HierarchyError::RepairFailed(id));
        };
        let Some(entity_ref) = orphan.entity_ref.clone() else {
            return Err(HierarchyError::RepairFailed(id));
        };

        let parent = self
            .iter()
            .filter(|candidate| {
                candidate.id != id
                    && candidate.kind == required
                    && candidate.entity_ref.as_ref() == Some(&entity_ref)
            })
            .max_by_key(|candidate| {
                let rooted =
                    candidate.kind == AnnotationKind::Room || candidate.parent.is_some();
                (rooted, candidate.id)
            })
            .map(|candidate| candidate.id)
            .ok_or(HierarchyError::RepairFailed(id))?;

        self.set_parent_unchecked(id, parent);
        tracing::debug!(orphan = %id, %parent, "orphan repaired");

        Ok(parent)
    }

    /// Batch repair over every orphaned location, cabinet run and cabinet.
    ///
    /// Shallowest kinds go first so deeper orphans can attach to parents
    /// repaired earlier in the same pass.
    pub fn repair_all(&mut self) -> RepairReport {
        let mut report = RepairReport::default();

        for kind in [
            AnnotationKind::Location,
            AnnotationKind::CabinetRun,
            AnnotationKind::Cabinet,
        ] {
            let orphans: Vec<AnnotationId> =
                self.find_orphans(kind).iter().map(|a| a.id).collect();

            for orphan in orphans {
                match self.repair_orphan(orphan) {
                    Ok(parent) => report.record_fixed(kind, orphan, parent),
                    Err(_) => report.record_failed(kind, orphan),
                }
            }
        }

        if report.total_fixed() > 0 || report.total_failed() > 0 {
            tracing::debug!(
                fixed = report.total_fixed(),
                failed = report.total_failed(),
                "repair pass complete"
            );
        }

        report
    }
}
