//! Ticks must not allocate once scratch buffers are warm.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use bubble_motion::motion::{MotionConfig, MotionEngine, SimulationNode, Viewport};
use bubble_motion::records::demo_records;

struct CountingAllocator;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

fn count_allocation() {
    let _ = ALLOCATIONS.try_with(|count| count.set(count.get() + 1));
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        count_allocation();
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        count_allocation();
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        count_allocation();
        unsafe { System.realloc(ptr, layout, new_size) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

/// Allocations made on this thread while `work` runs.
fn allocations_during(work: impl FnOnce()) -> usize {
    let before = ALLOCATIONS.with(Cell::get);
    work();
    ALLOCATIONS.with(Cell::get) - before
}

fn running_engine() -> MotionEngine {
    let mut engine = MotionEngine::new(Viewport::new(1200.0, 800.0), MotionConfig::default())
        .expect("engine builds");
    engine.update_nodes(demo_records(100)).expect("records load");
    engine.set_commit_sink(|_: &[SimulationNode]| {});
    engine.start();
    engine
}

fn warm_up(engine: &mut MotionEngine) {
    for _ in 0..5 {
        assert!(engine.step());
    }
}

#[test]
fn unfiltered_tick_does_not_allocate() {
    let mut engine = running_engine();
    warm_up(&mut engine);

    let allocations = allocations_during(|| {
        for _ in 0..3 {
            engine.step();
        }
    });

    assert_eq!(allocations, 0);
}

#[test]
fn filtered_tick_does_not_allocate() {
    let mut engine = running_engine();
    engine
        .trigger_spatial_filter(Some("category"))
        .expect("filter enters");
    warm_up(&mut engine);

    let allocations = allocations_during(|| {
        for _ in 0..3 {
            engine.step();
        }
    });

    assert_eq!(allocations, 0);
}
