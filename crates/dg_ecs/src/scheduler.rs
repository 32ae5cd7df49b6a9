// scheduler.rs - phased system scheduling
//
// Systems are grouped into fixed phases (Init runs once, the rest run every
// tick in order) and topologically sorted within each phase using Kahn's
// algorithm over `before`/`after` dependency edges. A dependency cycle is
// rejected at sort time rather than silently picking an arbitrary order.
//
// Per-system run time is tracked through `dg_metrics::SystemProfiler`, which
// is a real timer when the `metrics` feature is enabled and a zero-cost
// no-op otherwise.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use crate::error::EcsError;
use crate::query::QueryDescriptor;
use crate::world::World;

pub type SystemId = &'static str;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Init,
    PreUpdate,
    Update,
    PostUpdate,
    LateUpdate,
}

impl Phase {
    pub const ORDER: [Phase; 5] = [
        Phase::Init,
        Phase::PreUpdate,
        Phase::Update,
        Phase::PostUpdate,
        Phase::LateUpdate,
    ];
}

pub struct System {
    pub name: SystemId,
    pub phase: Phase,
    /// Query this system is primarily driven by; informational for tracing
    /// and tooling, not required for the system to run its own queries.
    pub query: Option<QueryDescriptor>,
    pub before: Vec<SystemId>,
    pub after: Vec<SystemId>,
    pub enabled: bool,
    run: Box<dyn FnMut(&mut World) -> Result<(), EcsError> + Send>,
}

impl System {
    pub fn new(
        name: SystemId,
        phase: Phase,
        run: impl FnMut(&mut World) -> Result<(), EcsError> + Send + 'static,
    ) -> Self {
        Self {
            name,
            phase,
            query: None,
            before: Vec::new(),
            after: Vec::new(),
            enabled: true,
            run: Box::new(run),
        }
    }

    pub fn with_query(mut self, query: QueryDescriptor) -> Self {
        self.query = Some(query);
        self
    }

    pub fn before(mut self, name: SystemId) -> Self {
        self.before.push(name);
        self
    }

    pub fn after(mut self, name: SystemId) -> Self {
        self.after.push(name);
        self
    }
}

#[derive(Default)]
pub struct Scheduler {
    /// Registration-ordered storage: a system's index here is its ordinal
    /// position, used to break ties among independent systems during the
    /// topological sort so that order is stable across runs given the same
    /// registrations (§5). A removed system leaves its slot `None` rather
    /// than shifting everything after it, so the ordinal position of every
    /// other system is unaffected by removal.
    systems: Vec<Option<System>>,
    /// Name -> index into `systems`.
    index: HashMap<SystemId, usize>,
    /// Cached topological order per phase, rebuilt lazily after any system
    /// registration, removal, or enable/disable toggle.
    order: HashMap<Phase, Vec<SystemId>>,
    dirty: bool,
    /// No-op unless the `metrics` feature enables real timing in `dg_metrics`.
    profiler: dg_metrics::SystemProfiler,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            index: HashMap::new(),
            order: HashMap::new(),
            dirty: true,
            profiler: dg_metrics::SystemProfiler::new(),
        }
    }

    /// Per-system cumulative time spent in `run_phase`, zero when the
    /// `metrics` feature is disabled.
    pub fn system_timing(&self, name: SystemId) -> std::time::Duration {
        self.profiler.get_timing(name)
    }

    pub fn reset_timings(&mut self) {
        self.profiler.reset();
    }

    /// Register a system. Replacing a previously registered system of the
    /// same name preserves its ordinal position (§4.11) rather than moving
    /// it to the end; a genuinely new name is appended.
    pub fn add_system(&mut self, system: System) {
        self.dirty = true;
        if let Some(&i) = self.index.get(system.name) {
            self.systems[i] = Some(system);
        } else {
            let i = self.systems.len();
            self.index.insert(system.name, i);
            self.systems.push(Some(system));
        }
    }

    pub fn remove_system(&mut self, name: SystemId) -> bool {
        if let Some(i) = self.index.remove(name) {
            self.systems[i] = None;
            self.dirty = true;
            true
        } else {
            false
        }
    }

    pub fn set_enabled(&mut self, name: SystemId, enabled: bool) -> bool {
        if let Some(&i) = self.index.get(name) {
            if let Some(system) = self.systems[i].as_mut() {
                system.enabled = enabled;
                self.dirty = true;
                return true;
            }
        }
        false
    }

    fn ensure_sorted(&mut self) -> Result<(), EcsError> {
        if !self.dirty {
            return Ok(());
        }
        let mut order = HashMap::new();
        for &phase in Phase::ORDER.iter() {
            order.insert(phase, self.topo_sort_phase(phase)?);
        }
        self.order = order;
        self.dirty = false;
        Ok(())
    }

    fn topo_sort_phase(&self, phase: Phase) -> Result<Vec<SystemId>, EcsError> {
        // `self.systems` is registration-ordered, so `members` is too -
        // filtering preserves relative order, giving a deterministic tie-break
        // index below independent of any hashing.
        let members: Vec<&System> = self.systems.iter().flatten().filter(|s| s.phase == phase).collect();
        let names: HashMap<SystemId, usize> = members
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name, i))
            .collect();

        let mut indegree = vec![0usize; members.len()];
        let mut edges: Vec<Vec<usize>> = vec![Vec::new(); members.len()];

        for (i, system) in members.iter().enumerate() {
            for &after in &system.after {
                if let Some(&j) = names.get(after) {
                    edges[j].push(i);
                    indegree[i] += 1;
                }
            }
            for &before in &system.before {
                if let Some(&j) = names.get(before) {
                    edges[i].push(j);
                    indegree[j] += 1;
                }
            }
        }

        // Stable order among independent systems: `i` is `members`' index,
        // which reflects registration order, so sorting ready-queue ties by
        // `i` makes the result deterministic across runs of the same
        // registrations rather than dependent on hash iteration order.
        let mut ready: Vec<usize> = indegree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == 0)
            .map(|(i, _)| i)
            .collect();
        ready.sort_unstable();
        let mut queue: VecDeque<usize> = ready.into();

        let mut sorted = Vec::with_capacity(members.len());
        while let Some(i) = queue.pop_front() {
            sorted.push(members[i].name);
            let mut newly_ready = Vec::new();
            for &j in &edges[i] {
                indegree[j] -= 1;
                if indegree[j] == 0 {
                    newly_ready.push(j);
                }
            }
            newly_ready.sort_unstable();
            for j in newly_ready {
                queue.push_back(j);
            }
        }

        if sorted.len() != members.len() {
            let remaining: Vec<&str> = members
                .iter()
                .map(|s| s.name)
                .filter(|n| !sorted.contains(n))
                .collect();
            return Err(EcsError::SchedulerCycle {
                phase: format!("{phase:?}"),
                cycle: remaining.join(", "),
            });
        }

        Ok(sorted)
    }

    /// Run every enabled system in `phase`, in dependency order.
    pub fn run_phase(&mut self, phase: Phase, world: &mut World) -> Result<(), EcsError> {
        self.ensure_sorted()?;
        let order = self.order.get(&phase).cloned().unwrap_or_default();
        for name in order {
            // Indexed directly so this borrow of `self.systems` stays
            // disjoint from `self.profiler` below.
            let Some(&i) = self.index.get(name) else {
                continue;
            };
            let Some(system) = self.systems[i].as_mut() else {
                continue;
            };
            if !system.enabled {
                continue;
            }
            debug!(system = name, ?phase, "running system");
            let run = &mut system.run;
            let result = self.profiler.time_system(name, || run(world));
            if let Err(err) = result {
                warn!(system = name, ?phase, error = %err, "system returned an error");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Runs `Init` once. Callers typically invoke this a single time after
    /// world setup, before the first `run_all`.
    pub fn run_init(&mut self, world: &mut World) -> Result<(), EcsError> {
        self.run_phase(Phase::Init, world)
    }

    /// Runs every non-`Init` phase in order, once per tick.
    pub fn run_all(&mut self, world: &mut World) -> Result<(), EcsError> {
        for &phase in Phase::ORDER.iter() {
            if phase == Phase::Init {
                continue;
            }
            self.run_phase(phase, world)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_system(name: SystemId, phase: Phase) -> System {
        System::new(name, phase, |_world| Ok(()))
    }

    #[test]
    fn independent_systems_run_in_registration_order_tiebreak() {
        let mut sched = Scheduler::new();
        sched.add_system(noop_system("b", Phase::Update));
        sched.add_system(noop_system("a", Phase::Update));
        sched.ensure_sorted().unwrap();
        let order = sched.order[&Phase::Update].clone();
        // "b" was registered before "a": with no dependency edges between
        // them, registration order breaks the tie, not name or hash order.
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn topo_order_is_stable_across_independently_built_schedulers() {
        let build = || {
            let mut sched = Scheduler::new();
            sched.add_system(noop_system("c", Phase::Update));
            sched.add_system(noop_system("a", Phase::Update));
            sched.add_system(noop_system("b", Phase::Update));
            sched.ensure_sorted().unwrap();
            sched.order[&Phase::Update].clone()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn replacing_a_system_keeps_its_ordinal_position() {
        let mut sched = Scheduler::new();
        sched.add_system(noop_system("a", Phase::Update));
        sched.add_system(noop_system("b", Phase::Update));
        sched.add_system(noop_system("c", Phase::Update));
        // Re-register "a" (same name, same phase): it must stay first, not
        // move to the end of registration order.
        sched.add_system(noop_system("a", Phase::Update));
        sched.ensure_sorted().unwrap();
        assert_eq!(sched.order[&Phase::Update], vec!["a", "b", "c"]);
    }

    #[test]
    fn removing_a_system_leaves_the_others_ordinal_positions_untouched() {
        let mut sched = Scheduler::new();
        sched.add_system(noop_system("a", Phase::Update));
        sched.add_system(noop_system("b", Phase::Update));
        sched.add_system(noop_system("c", Phase::Update));
        assert!(sched.remove_system("b"));
        sched.ensure_sorted().unwrap();
        assert_eq!(sched.order[&Phase::Update], vec!["a", "c"]);
    }

    #[test]
    fn after_dependency_orders_correctly() {
        let mut sched = Scheduler::new();
        sched.add_system(noop_system("physics", Phase::Update));
        sched.add_system(noop_system("render_sync", Phase::Update).after("physics"));
        sched.ensure_sorted().unwrap();
        let order = &sched.order[&Phase::Update];
        let physics_idx = order.iter().position(|&n| n == "physics").unwrap();
        let render_idx = order.iter().position(|&n| n == "render_sync").unwrap();
        assert!(physics_idx < render_idx);
    }

    #[test]
    fn cycle_is_rejected() {
        let mut sched = Scheduler::new();
        sched.add_system(noop_system("a", Phase::Update).after("b"));
        sched.add_system(noop_system("b", Phase::Update).after("a"));
        assert!(matches!(
            sched.ensure_sorted(),
            Err(EcsError::SchedulerCycle { .. })
        ));
    }

    #[test]
    fn disabled_system_is_skipped_without_error() {
        let mut sched = Scheduler::new();
        sched.add_system(noop_system("only", Phase::Update));
        sched.set_enabled("only", false);
        let mut world = World::new();
        assert!(sched.run_phase(Phase::Update, &mut world).is_ok());
    }

    #[test]
    fn running_a_system_records_a_timing_entry() {
        let mut sched = Scheduler::new();
        sched.add_system(noop_system("only", Phase::Update));
        let mut world = World::new();
        sched.run_phase(Phase::Update, &mut world).unwrap();
        // With the `metrics` feature off this is zero, but the call itself
        // must not panic or require the feature to be present.
        let _ = sched.system_timing("only");
    }
}
