//! The per-tick game loop: pull the frame's control packet, dispatch phase
//! functions, step movement and particles, expire messages, reap removed
//! objects. Grounded on the teacher's `qcommon_frame` in `common.rs` — a
//! plain per-frame advance function threading owned state through, rather
//! than a windowed event-loop callback (rejected as a model since the
//! renderer/input frontend it drives is out of scope here).

use rand::SeedableRng;

use lc_landscape::Landscape;
use lc_net::{ControlQueue, ControlSyncTick};
use lc_script::{FuncBody, FuncId, FuncMap, Vm};
use lc_sim::{NoopSink, Section, Status};

use crate::host::EngineHost;

/// `PSF_Initialize` only runs the tick a scenario's objects are first
/// brought to life; every later tick just runs `PSF_Execute`. Neither call
/// is scoped per-object yet — see `host.rs`'s `EngineHost` doc comment.
const PHASE_FUNCS: &[(&str, bool)] = &[("PSF_Initialize", true), ("PSF_Execute", false)];

/// What one completed tick produced, standing in for the render/audio
/// producer snapshot spec's scheduler step 6 calls for; there is no
/// renderer or audio backend in this crate to hand it to.
#[derive(Debug, Default, Clone, Copy)]
pub struct TickReport {
    pub frame: u32,
    pub active_objects: usize,
    pub active_particles: usize,
    pub pending_messages: usize,
}

pub struct Scheduler {
    pub section: Section,
    pub landscape: Landscape,
    pub funcs: FuncMap,
    pub queue: ControlQueue,
    host: EngineHost,
    first_tick: bool,
}

impl Scheduler {
    pub fn new(section: Section, landscape: Landscape, funcs: FuncMap, queue: ControlQueue) -> Self {
        Scheduler { section, landscape, funcs, queue, host: EngineHost, first_tick: true }
    }

    /// Runs exactly one tick to completion. Spec's scheduler has no
    /// suspension points or cancellation within a tick, so this either
    /// returns a full report or panics on a logic bug — it never leaves
    /// `section` half-advanced.
    pub fn tick(&mut self) -> TickReport {
        let frame = self.section.frame();
        let control = self.queue.pop_frame(frame);
        self.apply_control(control.as_ref());

        self.dispatch_phase_funcs();
        self.step_movement();
        self.step_particles();
        self.section.messages.expire(frame);
        self.section.reap_removed();

        let report = TickReport {
            frame,
            active_objects: self.section.objects.len(),
            active_particles: self.section.pxs.count(),
            pending_messages: self.section.messages.len(),
        };

        self.section.advance_frame();
        self.first_tick = false;
        report
    }

    /// Reseeds the section's RNG from the incoming tick's deterministic
    /// seed so every peer's particle/collision randomness for this frame
    /// matches bit-for-bit. Per-player input dispatch into running scripts
    /// (a global `PlayerInput` array script code can read) is not wired up
    /// yet; only the seed is consumed.
    fn apply_control(&mut self, control: Option<&ControlSyncTick>) {
        if let Some(tick) = control {
            self.section.rng = rand::rngs::StdRng::seed_from_u64(tick.deterministic_seed);
        } else {
            tracing::warn!(frame = self.section.frame(), "no control packet for this frame, stepping without one");
        }
    }

    fn dispatch_phase_funcs(&mut self) {
        for &(name, only_first_tick) in PHASE_FUNCS {
            if only_first_tick && !self.first_tick {
                continue;
            }
            if let Some(func_id) = self.funcs.first_func(name) {
                self.call_func(func_id);
            }
        }
    }

    fn call_func(&mut self, func_id: FuncId) {
        let func = self.funcs.get(func_id);
        let FuncBody::Script(chunk) = &func.body else {
            return;
        };
        let mut vm = Vm::new(&self.funcs, &mut self.host);
        if let Err(err) = vm.run(chunk, &[]) {
            tracing::warn!(function = %func.name, error = %err, "phase function failed");
        }
    }

    /// Objects step in `Section::objects`'s own order, which only ever
    /// grows by appending freshly spawned objects at the end — the same
    /// deterministic, append-only order every peer observes, matching
    /// spec §5's "global doubly-linked list with deterministic append
    /// order" guarantee without needing an explicit list type of our own.
    fn step_movement(&mut self) {
        let landscape = &self.landscape;
        let mut moved = Vec::new();
        {
            // Destructured so `materials` and `objects` borrow disjoint
            // fields of `self.section` — `Section::object_mut` alone ties
            // its return lifetime to the whole struct and can't be held
            // alongside a separate borrow of `materials`.
            let Section { objects, materials, .. } = &mut self.section;
            let mut sink = NoopSink;
            for obj in objects.iter_mut() {
                if obj.status != Status::Active {
                    continue;
                }
                lc_sim::step_object(obj, landscape, materials, &mut sink);
                moved.push(obj.id);
            }
        }
        for id in moved {
            self.section.resync_sector(id);
        }
    }

    fn step_particles(&mut self) {
        self.section.pxs.step(&self.landscape, &self.section.materials, &mut self.section.rng);
    }
}
