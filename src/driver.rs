//! # Exploration driver
//!
//! [`Svm`] decides which methods of a program image to analyze, invokes the engine on
//! each of them, memoizes the summaries and renders every summary into a report.
//!
//! ## Invocation protocol
//!
//! Every invocation of method `m` follows the same steps:
//!
//! 1. Resolve `m` via [`Explorer::make_method_identifier`]. If the engine has no
//!    metadata for `m`, log a warning and give up: nothing is stored, nothing is
//!    reported.
//! 2. If a store is in use, reserve a pending slot for `m`.
//! 3. Call [`Explorer::explore`] (ordinary methods) or
//!    [`Explorer::interpret_entry_point`] (the entry point) with the identity
//!    continuation.
//! 4. On success, record the summary in the store.
//!
//! Step 3 runs under a [`FaultPolicy`]. Under [`FaultPolicy::Tolerant`] an engine
//! failure is logged and leaves the slot pending, and processing continues with the
//! next method. Under [`FaultPolicy::Strict`] the failure is returned to the caller.
//!
//! ## Runs
//!
//! [`Svm::run`] explores every selected method of an image (see [`crate::selector`])
//! in enumeration order, then interprets the entry point once, and finally reports
//! every store entry. Ordinary methods are tolerant and the entry point is strict by
//! default; see [`DriverConfig`].
//!
//! Everything is sequential: at most one engine invocation is in flight at a time.

use std::fmt::{Display, Formatter};
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, error, info, warn};

use crate::config::{DriverConfig, FaultPolicy};
use crate::engine::{identity, Continuation, Explorer, SummaryOf};
use crate::error::{DriverError, Result};
use crate::format::{display_report, ReportFormatter};
use crate::image::{MethodHandle, ProgramImage};
use crate::selector::{select_methods, IgnoreList};
use crate::store::SummaryStore;

/// Which engine operation to invoke.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Invocation {
    /// Ordinary exploration of an arbitrary method.
    Explore,
    /// Interpretation of the program entry point.
    EntryPoint,
}

#[derive(Debug)]
enum Outcome<T> {
    Unresolved,
    Failed,
    Done(T),
}

impl<T> Outcome<T> {
    fn into_option(self) -> Option<T> {
        match self {
            Outcome::Done(summary) => Some(summary),
            Outcome::Unresolved | Outcome::Failed => None,
        }
    }
}

/// Counters describing one run.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct RunStats {
    /// Methods handed to the engine's resolver: every selected method plus the
    /// entry point, if the image has one.
    pub attempted: usize,
    /// Methods skipped because the engine had no metadata for them.
    pub unresolved: usize,
    /// Methods whose invocation failed.
    pub failed: usize,
    /// Methods with a summary.
    pub completed: usize,
}

impl RunStats {
    fn count<T>(&mut self, outcome: &Outcome<T>) {
        self.attempted += 1;
        match outcome {
            Outcome::Unresolved => self.unresolved += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Done(_) => self.completed += 1,
        }
    }
}

impl Display for RunStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "attempted {} method(s): {} completed, {} failed, {} unresolved",
            self.attempted, self.completed, self.failed, self.unresolved
        )
    }
}

/// Result of a run: one entry per method that reached the engine, in exploration order.
///
/// Methods that were attempted but did not produce a summary map to `None`.
/// Methods the engine could not resolve are absent.
#[derive(Debug, Clone, Default)]
pub struct Report {
    entries: IndexMap<MethodHandle, Option<String>>,
    stats: RunStats,
}

impl Report {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, method: &MethodHandle) -> bool {
        self.entries.contains_key(method)
    }

    /// Get the report text of `method`, if it was attempted and completed.
    pub fn get(&self, method: &MethodHandle) -> Option<&str> {
        self.entries.get(method)?.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MethodHandle, Option<&str>)> {
        self.entries.iter().map(|(m, r)| (m, r.as_deref()))
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodHandle> {
        self.entries.keys()
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Convert into the plain method-to-report mapping, in exploration order.
    pub fn into_map(self) -> IndexMap<MethodHandle, Option<String>> {
        self.entries
    }
}

/// Exploration driver over the engine `E`.
pub struct Svm<E: Explorer> {
    explorer: E,
    config: DriverConfig,
    formatter: ReportFormatter,
    solver_configured: bool,
}

impl<E: Explorer> Svm<E> {
    pub fn new(explorer: E, config: DriverConfig) -> Self {
        Self {
            explorer,
            config,
            formatter: ReportFormatter::default(),
            solver_configured: false,
        }
    }

    /// Replace the report formatter.
    pub fn with_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn explorer(&self) -> &E {
        &self.explorer
    }

    /// Install the solver backend of this driver's engine.
    ///
    /// Must happen before any exploration when [`DriverConfig::require_solver`] is set.
    pub fn configure_solver(&mut self, solver: E::Solver) {
        debug!("configure_solver");
        self.explorer.configure_solver(solver);
        self.solver_configured = true;
    }

    pub fn is_solver_configured(&self) -> bool {
        self.solver_configured
    }

    fn check_solver(&self) -> Result<()> {
        if self.config.require_solver && !self.solver_configured {
            return Err(DriverError::SolverNotConfigured);
        }
        Ok(())
    }

    fn invoke(
        &mut self,
        mut store: Option<&mut SummaryStore<Rc<SummaryOf<E>>>>,
        method: &MethodHandle,
        invocation: Invocation,
        policy: FaultPolicy,
    ) -> Result<Outcome<Rc<SummaryOf<E>>>> {
        self.check_solver()?;
        if invocation == Invocation::EntryPoint {
            assert!(method.is_static(), "entry point {} must be static", method);
        }

        let Some(id) = self.explorer.make_method_identifier(method) else {
            warn!("metadata method for {} not found!", method.name());
            return Ok(Outcome::Unresolved);
        };

        if let Some(store) = store.as_deref_mut() {
            store.reserve(method);
        }

        debug!("invoke({:?}, {} = {})", invocation, method, id);
        let k: Continuation<'_, E> = &identity::<SummaryOf<E>>;
        let result = match invocation {
            Invocation::Explore => self.explorer.explore(id, k),
            Invocation::EntryPoint => self.explorer.interpret_entry_point(id, k),
        };

        let summary = match result {
            Ok(summary) => Rc::new(summary),
            Err(e) => match policy {
                FaultPolicy::Tolerant => {
                    error!("for method {} got error {}", method, e);
                    return Ok(Outcome::Failed);
                }
                FaultPolicy::Strict => return Err(DriverError::engine(method, e)),
            },
        };

        if let Some(store) = store {
            store.record(method, Rc::clone(&summary));
        }
        Ok(Outcome::Done(summary))
    }

    fn format_summary(&self, summary: Option<&SummaryOf<E>>) -> Option<String> {
        self.formatter.format_opt(&self.explorer, summary)
    }

    /// Explore a single method in strict mode, without memoization.
    ///
    /// Returns `Ok(None)` if the engine has no metadata for `method`.
    /// Engine failures are returned as [`DriverError::Engine`].
    pub fn explore_one(&mut self, method: &MethodHandle) -> Result<Option<String>> {
        let summary = self.invoke(None, method, Invocation::Explore, FaultPolicy::Strict)?.into_option();
        Ok(self.format_summary(summary.as_deref()))
    }

    /// Explore a single method in tolerant mode: engine failures are logged and
    /// yield `Ok(None)`.
    pub fn explore_with_logging(&mut self, method: &MethodHandle) -> Result<Option<String>> {
        let summary = self.invoke(None, method, Invocation::Explore, FaultPolicy::Tolerant)?.into_option();
        Ok(self.format_summary(summary.as_deref()))
    }

    /// Interpret `method` as a program entry point in strict mode.
    ///
    /// # Panics
    ///
    /// Panics if `method` is not static.
    pub fn explore_entry_point(&mut self, method: &MethodHandle) -> Result<Option<String>> {
        let summary = self.invoke(None, method, Invocation::EntryPoint, FaultPolicy::Strict)?.into_option();
        Ok(self.format_summary(summary.as_deref()))
    }

    /// Explore a whole program image.
    ///
    /// Explores every method selected by [`select_methods`] under
    /// [`DriverConfig::methods`], then interprets the image's entry point (if any)
    /// under [`DriverConfig::entry_point`]. Every attempted method appears in the
    /// returned [`Report`].
    ///
    /// # Panics
    ///
    /// Panics if the image's entry point is not static.
    pub fn run<P: ProgramImage>(&mut self, image: &P, ignore: &IgnoreList) -> Result<Report> {
        self.check_solver()?;

        let mut store = SummaryStore::new();
        let mut stats = RunStats::default();
        let entry_point = image.entry_point();

        let methods = select_methods(image, ignore);
        info!(
            "exploring {} method(s) of {} type(s), entry point: {}",
            methods.len(),
            image.types().len(),
            entry_point.as_ref().map_or("none".to_string(), |m| m.to_string())
        );

        let policy = self.config.methods;
        for method in &methods {
            debug!("called interpreter for method {}", method.name());
            let outcome = self.invoke(Some(&mut store), method, Invocation::Explore, policy)?;
            stats.count(&outcome);
        }

        if let Some(entry_point) = &entry_point {
            let policy = self.config.entry_point;
            let outcome = self.invoke(Some(&mut store), entry_point, Invocation::EntryPoint, policy)?;
            stats.count(&outcome);
        }

        let mut entries = IndexMap::with_capacity(store.len());
        for (method, slot) in store.iter() {
            let report = self.format_summary(slot.summary().map(|s| &**s));
            info!("for method {} got summary {}", method, display_report(report.as_deref()));
            entries.insert(method.clone(), report);
        }
        info!("{}", stats);

        Ok(Report { entries, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    use test_log::test;

    use crate::engine::{MethodIdentifier, Summary};
    use crate::image::{Image, Modifiers, TypeDecl};

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct MockError(String);

    /// Engine answering every resolvable method with a canned summary.
    #[derive(Default)]
    struct MockExplorer {
        ids: HashMap<MethodHandle, MethodIdentifier>,
        names: HashMap<MethodIdentifier, String>,
        failing: HashSet<String>,
        calls: RefCell<Vec<(Invocation, String)>>,
        solver: Option<&'static str>,
    }

    impl MockExplorer {
        fn new<'a>(methods: impl IntoIterator<Item = &'a MethodHandle>) -> Self {
            let mut explorer = Self::default();
            for (i, m) in methods.into_iter().enumerate() {
                let id = MethodIdentifier::new(0x0600_0001 + i as u64);
                explorer.ids.insert(m.clone(), id);
                explorer.names.insert(id, m.name().to_string());
            }
            explorer
        }

        fn failing(mut self, name: &str) -> Self {
            self.failing.insert(name.to_string());
            self
        }

        fn call(&self, invocation: Invocation, id: MethodIdentifier) -> std::result::Result<Summary<String, String>, MockError> {
            let name = self.names[&id].clone();
            self.calls.borrow_mut().push((invocation, name.clone()));
            if self.failing.contains(&name) {
                return Err(MockError(format!("{} exploded", name)));
            }
            Ok(Summary::new(format!("ret {}", name), format!("{{ k@1+2[Microsoft.FSharp.Core.Unit]: {} }}", name)))
        }

        fn calls(&self) -> Vec<(Invocation, String)> {
            self.calls.borrow().clone()
        }
    }

    impl Explorer for MockExplorer {
        type Term = String;
        type State = String;
        type Solver = &'static str;
        type Error = MockError;

        fn make_method_identifier(&self, method: &MethodHandle) -> Option<MethodIdentifier> {
            self.ids.get(method).copied()
        }

        fn explore(&mut self, id: MethodIdentifier, k: Continuation<'_, Self>) -> std::result::Result<Summary<String, String>, MockError> {
            self.call(Invocation::Explore, id).map(k)
        }

        fn interpret_entry_point(
            &mut self,
            id: MethodIdentifier,
            k: Continuation<'_, Self>,
        ) -> std::result::Result<Summary<String, String>, MockError> {
            self.call(Invocation::EntryPoint, id).map(k)
        }

        fn dump(&self, state: &String) -> String {
            state.clone()
        }

        fn configure_solver(&mut self, solver: &'static str) {
            self.solver = Some(solver);
        }
    }

    fn image() -> Image {
        let mut image = Image::new();
        let t = image.add_type(TypeDecl::new("App.T", true));
        t.declare("F", Modifiers::PUBLIC);
        t.declare("G", Modifiers::PUBLIC);
        t.declare("H", Modifiers::PUBLIC);
        let main = image
            .add_type(TypeDecl::new("App.Program", true))
            .declare("Main", Modifiers::PUBLIC | Modifiers::STATIC);
        image.set_entry_point(main);
        image
    }

    fn all_methods(image: &Image) -> Vec<MethodHandle> {
        image.types().iter().flat_map(|t| t.methods().to_vec()).collect()
    }

    #[test]
    fn test_explore_one() {
        let image = image();
        let f = image.find_method("App.T", "F").unwrap().clone();
        let mut svm = Svm::new(MockExplorer::new(&all_methods(&image)), DriverConfig::default());

        let report = svm.explore_one(&f).unwrap();
        assert_eq!(report.as_deref(), Some("ret F\nHEAP:\n{ k: F }"));
        assert_eq!(svm.explorer().calls(), vec![(Invocation::Explore, "F".to_string())]);
    }

    #[test]
    fn test_explore_one_is_deterministic() {
        let image = image();
        let g = image.find_method("App.T", "G").unwrap().clone();
        let mut svm = Svm::new(MockExplorer::new(&all_methods(&image)), DriverConfig::default());
        let first = svm.explore_one(&g).unwrap();
        let second = svm.explore_one(&g).unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_explore_one_unresolved() {
        let image = image();
        let f = image.find_method("App.T", "F").unwrap().clone();
        let mut svm = Svm::new(MockExplorer::default(), DriverConfig::default());
        assert_eq!(svm.explore_one(&f).unwrap(), None);
        assert!(svm.explorer().calls().is_empty());
    }

    #[test]
    fn test_explore_one_propagates_failure() {
        let image = image();
        let f = image.find_method("App.T", "F").unwrap().clone();
        let mut svm = Svm::new(MockExplorer::new(&all_methods(&image)).failing("F"), DriverConfig::default());
        let err = svm.explore_one(&f).unwrap_err();
        assert!(matches!(err, DriverError::Engine { .. }));
        assert_eq!(err.to_string(), "for method App.T::F got error: F exploded");
    }

    #[test]
    fn test_explore_with_logging_swallows_failure() {
        let image = image();
        let f = image.find_method("App.T", "F").unwrap().clone();
        let mut svm = Svm::new(MockExplorer::new(&all_methods(&image)).failing("F"), DriverConfig::default());
        assert_eq!(svm.explore_with_logging(&f).unwrap(), None);
    }

    #[test]
    fn test_explore_entry_point() {
        let image = image();
        let main = image.entry_point().unwrap();
        let mut svm = Svm::new(MockExplorer::new(&all_methods(&image)), DriverConfig::default());
        let report = svm.explore_entry_point(&main).unwrap();
        assert_eq!(report.as_deref(), Some("ret Main\nHEAP:\n{ k: Main }"));
        assert_eq!(svm.explorer().calls(), vec![(Invocation::EntryPoint, "Main".to_string())]);
    }

    #[test]
    #[should_panic(expected = "must be static")]
    fn test_entry_point_must_be_static() {
        let image = image();
        let f = image.find_method("App.T", "F").unwrap().clone();
        let mut svm = Svm::new(MockExplorer::new(&all_methods(&image)), DriverConfig::default());
        let _ = svm.explore_entry_point(&f);
    }

    #[test]
    fn test_run_order_and_failures() {
        let image = image();
        let explorer = MockExplorer::new(&all_methods(&image)).failing("G");
        let mut svm = Svm::new(explorer, DriverConfig::default());

        let report = svm.run(&image, &IgnoreList::empty()).unwrap();

        let calls: Vec<_> = svm.explorer().calls().into_iter().map(|(_, name)| name).collect();
        assert_eq!(calls, vec!["F", "G", "H", "Main"]);
        assert_eq!(report.len(), 4);

        let g = image.find_method("App.T", "G").unwrap();
        assert!(report.contains(g));
        assert_eq!(report.get(g), None);
        assert_eq!(
            report.stats(),
            RunStats {
                attempted: 4,
                unresolved: 0,
                failed: 1,
                completed: 3,
            }
        );
    }

    #[test]
    fn test_run_strict_entry_point_propagates() {
        let image = image();
        let explorer = MockExplorer::new(&all_methods(&image)).failing("Main");
        let mut svm = Svm::new(explorer, DriverConfig::default());
        let err = svm.run(&image, &IgnoreList::empty()).unwrap_err();
        assert!(err.to_string().contains("App.Program::Main"));
    }

    #[test]
    fn test_run_tolerant_entry_point_completes() {
        let image = image();
        let explorer = MockExplorer::new(&all_methods(&image)).failing("Main");
        let config = DriverConfig {
            entry_point: FaultPolicy::Tolerant,
            ..DriverConfig::default()
        };
        let mut svm = Svm::new(explorer, config);
        let report = svm.run(&image, &IgnoreList::empty()).unwrap();
        let main = image.entry_point().unwrap();
        assert!(report.contains(&main));
        assert_eq!(report.get(&main), None);
    }

    #[test]
    fn test_require_solver() {
        let image = image();
        let config = DriverConfig {
            require_solver: true,
            ..DriverConfig::default()
        };
        let mut svm = Svm::new(MockExplorer::new(&all_methods(&image)), config);
        assert!(matches!(
            svm.run(&image, &IgnoreList::empty()),
            Err(DriverError::SolverNotConfigured)
        ));
        assert!(svm.explorer().calls().is_empty());

        svm.configure_solver("z3");
        assert!(svm.is_solver_configured());
        assert_eq!(svm.explorer().solver, Some("z3"));
        assert_eq!(svm.run(&image, &IgnoreList::empty()).unwrap().len(), 4);
    }
}
