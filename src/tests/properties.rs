//! Random open/close/escape/settle sequences against the stack and
//! scroll-lock invariants.

use proptest::prelude::*;
use proptest::test_runner::{Config, TestRunner};

use super::*;
use crate::movia::{Lifecycle, MoviaId};

#[derive(Debug, Clone)]
enum Op {
    Open(usize),
    Close(usize),
    ForceClose(usize),
    Destroy(usize),
    Escape,
    Frames,
    Settle,
}

const MODALS: usize = 4;

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..MODALS).prop_map(Op::Open),
        3 => (0..MODALS).prop_map(Op::Close),
        1 => (0..MODALS).prop_map(Op::ForceClose),
        1 => (0..MODALS).prop_map(Op::Destroy),
        2 => Just(Op::Escape),
        2 => Just(Op::Frames),
        2 => Just(Op::Settle),
    ]
}

fn expected_owner(ctx: &MoviaContext, modals: &[Movia], locks: &[bool]) -> Option<MoviaId> {
    ctx.stack_ids().into_iter().rev().find(|id| {
        modals
            .iter()
            .position(|m| m.id() == *id)
            .map_or(false, |i| locks[i])
    })
}

#[test]
fn stack_and_lock_invariants_hold_for_any_sequence() {
    let mut runner = TestRunner::new(Config {
        cases: 128,
        ..Config::default()
    });
    let strategy = prop::collection::vec(op_strategy(), 0..60);

    runner
        .run(&strategy, |ops| {
            let (adapter, ctx) = setup();
            let locks = [true, false, true, true];
            let modals: Vec<Movia> = (0..MODALS)
                .map(|i| {
                    modal(
                        &ctx,
                        MoviaOptions::new()
                            .content(format!("<p>{i}</p>"))
                            .scroll_lock(locks[i])
                            .destroy_on_close(i % 2 == 0),
                    )
                })
                .collect();

            for op in ops {
                match op {
                    Op::Open(i) => modals[i].open(),
                    Op::Close(i) => modals[i].close(),
                    Op::ForceClose(i) => modals[i].close_with(true),
                    Op::Destroy(i) => modals[i].destroy(),
                    Op::Escape => adapter.press_escape(),
                    Op::Frames => adapter.run_frames(),
                    Op::Settle => adapter.settle_transitions(),
                }

                let stack = ctx.stack_ids();
                for m in &modals {
                    let on_stack = stack.iter().filter(|id| **id == m.id()).count();
                    prop_assert!(on_stack <= 1, "{:?} pushed twice", m.id());
                    prop_assert_eq!(on_stack == 1, m.lifecycle() == Lifecycle::Open);
                    if m.is_open() {
                        prop_assert!(m.surface().is_some());
                    }
                }
                prop_assert_eq!(ctx.scroll_lock_owner(), expected_owner(&ctx, &modals, &locks));
                prop_assert_eq!(adapter.target(ROOT).locked, ctx.scroll_lock_owner().is_some());
                prop_assert!(adapter.escape_listeners() <= stack.len());
            }

            adapter.flush();
            for m in &modals {
                if m.lifecycle() == Lifecycle::Destroyed {
                    prop_assert!(m.surface().is_none());
                }
            }
            Ok(())
        })
        .unwrap();
}
