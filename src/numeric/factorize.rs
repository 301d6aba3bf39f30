//! Numeric factorization: task-parallel traversal of the frontal tree.
//!
//! Each front is owned by the task that factorizes it. A task walks its
//! subtree in post-order, spawning sibling subtrees as separate tasks when
//! there are several and the subtree is big enough, and assembles each front
//! from its rows and the children's contribution blocks, which are moved in
//! and dropped after the extend-add. Factors go into one pre-sized slot per front. The first fatal
//! error raises a shared flag; tasks check it before starting a front and
//! unwind with `Cancelled`, releasing whatever they hold.

use super::Numeric;
use super::assemble::{AssembledFront, ScaledRows, assemble_front};
use super::front::{Contribution, FrontFactors, FrontFlags, FrontStatus, StatusCell};
use super::panel::factorize_front;
use super::pivot::PivotRule;
use crate::config::{Control, Strategy};
use crate::error::LuError;
use crate::matrix::{CscMatrix, DenseBlock};
use crate::parallel::kernels::{KernelCounters, KernelCounts, KernelPolicy};
use crate::parallel::{Scheduler, map_ordered};
use crate::symbolic::Symbolic;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

/// Sibling subtrees are only spawned as tasks above this much work (flops).
const TASK_WORK: f64 = 16_384.0;

/// Nesting limit for spawned subtrees; deeper ones run in their parent's task.
const MAX_TASK_DEPTH: usize = 32;

enum Visit {
    Enter(usize),
    Exit(usize, bool),
}

struct FactorContext<'a> {
    symbolic: &'a Symbolic,
    scaled: &'a ScaledRows,
    rule: PivotRule<'a>,
    panel_width: usize,
    policy: KernelPolicy,
    parallel: bool,
    slots: Vec<OnceLock<FrontFactors>>,
    status: Vec<StatusCell>,
    failed: AtomicBool,
    first_error: Mutex<Option<LuError>>,
    counters: KernelCounters,
    extend_add: AtomicUsize,
}

impl FactorContext<'_> {
    /// Record a fatal error and raise the shared flag.
    fn fail(&self, e: LuError) -> LuError {
        if e != LuError::Cancelled {
            self.failed.store(true, Ordering::Release);
            if let Ok(mut first) = self.first_error.lock() {
                first.get_or_insert_with(|| e.clone());
            }
        }
        e
    }

    fn into_parts(self) -> (Vec<OnceLock<FrontFactors>>, Vec<StatusCell>, KernelPolicy, KernelCounts, usize) {
        (
            self.slots,
            self.status,
            self.policy,
            self.counters.snapshot(),
            self.extend_add.into_inner(),
        )
    }

    fn cancelled(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Whether the subtrees rooted at `fronts` are run as concurrent tasks.
    fn spawn(&self, fronts: &[usize], work: f64, depth: usize) -> bool {
        self.parallel && fronts.len() > 1 && work >= TASK_WORK && depth < MAX_TASK_DEPTH
    }

    /// Factorize every tree of the forest.
    fn factor_roots(&self, roots: &[usize], work: f64) -> Result<(), LuError> {
        if self.spawn(roots, work, 0) {
            for r in map_ordered(roots, |&f| self.factor_subtree(f, 1)) {
                r?;
            }
        } else {
            for &f in roots {
                self.factor_subtree(f, 0)?;
            }
        }
        Ok(())
    }

    /// Factorize the subtree rooted at `root` and return its contribution.
    ///
    /// Fronts are visited in post-order from an explicit stack; finished
    /// contributions wait on `done` until their parent is assembled, so the
    /// call stack only grows where sibling subtrees are spawned.
    fn factor_subtree(&self, root: usize, depth: usize) -> Result<Option<Contribution>, LuError> {
        let tree = self.symbolic.tree();
        let mut todo = vec![Visit::Enter(root)];
        let mut done: Vec<Contribution> = Vec::new();
        while let Some(visit) = todo.pop() {
            if self.cancelled() {
                return Err(LuError::Cancelled);
            }
            match visit {
                Visit::Enter(f) => {
                    let children = tree.children(f);
                    if self.spawn(children, tree.subtree_work(f), depth) {
                        for r in map_ordered(children, |&c| self.factor_subtree(c, depth + 1)) {
                            done.extend(r?);
                        }
                        todo.push(Visit::Exit(f, true));
                    } else {
                        todo.push(Visit::Exit(f, false));
                        todo.extend(children.iter().rev().map(|&c| Visit::Enter(c)));
                    }
                }
                Visit::Exit(f, concurrent) => {
                    let nc = tree.children(f).len();
                    let start = done.len().checked_sub(nc).ok_or_else(|| {
                        self.fail(LuError::Invalid(format!(
                            "front {f} is missing child contributions"
                        )))
                    })?;
                    let contribs = done.split_off(start);
                    let out = self
                        .factor_front(f, contribs, concurrent)
                        .map_err(|e| self.fail(e))?;
                    done.extend(out);
                }
            }
        }
        Ok(done.pop())
    }

    fn factor_front(
        &self,
        f: usize,
        contribs: Vec<Contribution>,
        concurrent: bool,
    ) -> Result<Option<Contribution>, LuError> {
        if self.cancelled() {
            return Err(LuError::Cancelled);
        }
        let spec = self.symbolic.tree().front(f);
        let npiv = spec.npiv;
        self.status[f].set(FrontStatus::Assembling);
        let AssembledFront {
            mut w,
            mut rows,
            mut cols,
            extend_add_entries,
        } = assemble_front(f, spec, self.scaled, self.symbolic.qfill(), contribs, self.parallel)?;
        self.extend_add.fetch_add(extend_add_entries, Ordering::Relaxed);

        self.status[f].set(FrontStatus::Factorizing);
        let out = factorize_front(
            &mut w,
            &mut rows,
            &mut cols,
            npiv,
            self.panel_width,
            &self.rule,
            &self.policy,
            &self.counters,
        );
        let (m, nc, k) = (w.nrows(), w.ncols(), out.pivots);
        let view = w.as_ref();
        let pivot_block = DenseBlock::copy_of(view.submatrix(0, 0, k, k))?;
        let l21 = DenseBlock::copy_of(view.submatrix(k, 0, m - k, k))?;
        let u12 = DenseBlock::copy_of(view.submatrix(0, k, k, nc - k))?;
        let contribution = match spec.parent {
            Some(_) => Some(Contribution {
                rows: rows[k..].to_vec(),
                cols: cols[npiv..].to_vec(),
                block: DenseBlock::copy_of(view.submatrix(k, npiv, m - k, nc - npiv))?,
            }),
            None => None,
        };
        drop(w);

        let mut flags = FrontFlags::empty();
        flags.set(FrontFlags::TRUNCATED, k < npiv || out.forced > 0);
        flags.set(FrontFlags::OFF_DIAGONAL, out.off_diagonal > 0);
        flags.set(FrontFlags::FORCED, out.forced > 0);
        flags.set(FrontFlags::PARALLEL_CHILDREN, concurrent);
        let status = if flags.contains(FrontFlags::TRUNCATED) {
            FrontStatus::SingularTruncated
        } else {
            FrontStatus::Done
        };
        log::debug!(
            "front {f}: {m}x{nc}, {k}/{npiv} pivots, {} off-diagonal, {} forced",
            out.off_diagonal,
            out.forced
        );

        let factors = FrontFactors {
            rows,
            cols,
            npiv,
            pivot_block,
            l21,
            u12,
            flags,
            status,
            off_diagonal: out.off_diagonal,
            forced: out.forced,
        };
        if self.slots[f].set(factors).is_err() {
            return Err(LuError::Invalid(format!("front {f} factorized twice")));
        }
        self.status[f].set(status);
        Ok(contribution)
    }
}

/// Numerically factorize `a`, whose pattern must match the one `symbolic`
/// was built for, on the workers of `scheduler`.
///
/// A matrix without a full set of acceptable pivots still yields
/// `Ok(numeric)`, with `numeric.status() == Status::Singular`.
pub fn factorize(
    a: &CscMatrix,
    symbolic: &Symbolic,
    control: &Control,
    scheduler: &Scheduler,
) -> Result<Numeric, LuError> {
    control.validate()?;
    let n = symbolic.n();
    if a.nrows() != n || a.ncols() != n {
        return Err(LuError::Invalid(format!(
            "matrix is {}x{}, symbolic analysis is for n = {n}",
            a.nrows(),
            a.ncols()
        )));
    }
    if !symbolic.fits(a) {
        return Err(LuError::Invalid(
            "matrix pattern differs from the analyzed one".into(),
        ));
    }

    let scaled = ScaledRows::build(a, symbolic, control.prescale)?;
    let nf = symbolic.nfronts();
    let ctx = FactorContext {
        symbolic,
        scaled: &scaled,
        rule: PivotRule {
            piv_toler: control.piv_toler,
            diag_toler: control.diag_toler,
            zero_tol: control.zero_pivot_tol,
            fallback: control.pivot_fallback,
            prefer_diagonal: symbolic.strategy() == Strategy::Symmetric,
            qfill: symbolic.qfill(),
        },
        panel_width: control.panel_width,
        policy: KernelPolicy::from_control(control),
        parallel: scheduler.threads() > 1,
        slots: (0..nf).map(|_| OnceLock::new()).collect(),
        status: (0..nf).map(|_| StatusCell::new()).collect(),
        failed: AtomicBool::new(false),
        first_error: Mutex::new(None),
        counters: KernelCounters::default(),
        extend_add: AtomicUsize::new(0),
    };

    let tree = symbolic.tree();
    let work: f64 = tree.roots().iter().map(|&r| tree.subtree_work(r)).sum();
    let outcome = scheduler.install(|| ctx.factor_roots(tree.roots(), work));
    if let Err(e) = outcome {
        let first = ctx.first_error.lock().ok().and_then(|mut g| g.take());
        let err = first.unwrap_or(e);
        log::warn!("numeric factorization failed: {err}");
        return Err(err);
    }

    let (slots, status, policy, kernel_calls, extend_add) = ctx.into_parts();
    let fronts = slots
        .into_iter()
        .enumerate()
        .map(|(f, slot)| {
            slot.into_inner()
                .ok_or_else(|| LuError::Invalid(format!("front {f} was never factorized")))
        })
        .collect::<Result<Vec<_>, LuError>>()?;
    let front_status = status.iter().map(StatusCell::get).collect();
    Numeric::from_fronts(
        symbolic,
        fronts,
        front_status,
        scaled.scale,
        policy,
        kernel_calls,
        extend_add,
    )
}
