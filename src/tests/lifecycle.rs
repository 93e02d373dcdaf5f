use super::*;
use crate::config::CloseMethods;
use crate::error::MoviaError;
use crate::movia::Lifecycle;

#[test]
fn construction_requires_content_or_template() {
    let (_, ctx) = setup();
    let err = Movia::new(&ctx, MoviaOptions::new()).unwrap_err();
    assert!(matches!(err, MoviaError::MissingContent));
}

#[test]
fn template_wins_over_inline_content() {
    let (adapter, ctx) = setup();
    adapter.add_template("tpl-login", "<form>login</form>");
    let m = modal(&ctx, MoviaOptions::new().template("tpl-login").content("<p>inline</p>"));

    assert_eq!(m.content(), None);
    m.open();
    adapter.with_surface(surface_of(&m), |s| assert_eq!(s.content, "<form>login</form>"));
}

#[test]
fn missing_template_renders_empty_content() {
    let (adapter, ctx) = setup();
    let m = modal(&ctx, MoviaOptions::new().template("nope"));
    m.open();
    adapter.with_surface(surface_of(&m), |s| assert_eq!(s.content, ""));
}

#[test]
fn ids_strictly_increase() {
    let (_, ctx) = setup();
    let a = simple(&ctx, "a");
    let b = simple(&ctx, "b");
    let c = simple(&ctx, "c");
    assert!(a.id() < b.id() && b.id() < c.id());
}

#[test]
fn open_reveals_on_next_frame_and_fires_callbacks_in_order() {
    let (adapter, ctx) = setup();
    let (ready, on_ready) = counter();
    let (opened, on_open) = counter();
    let m = modal(&ctx, MoviaOptions::new().content("<p>hi</p>").on_ready(on_ready).on_open(on_open));
    assert_eq!(m.lifecycle(), Lifecycle::Unmounted);

    m.open();
    let surface = surface_of(&m);
    assert_eq!(m.lifecycle(), Lifecycle::Open);
    assert_eq!(ctx.stack_ids(), vec![m.id()]);
    adapter.with_surface(surface, |s| {
        assert!(s.mounted);
        assert!(!s.visible, "marker waits for the next frame");
    });

    adapter.run_frames();
    adapter.with_surface(surface, |s| assert!(s.visible));
    assert_eq!(*adapter.ready_events.borrow(), vec![surface]);
    assert_eq!((ready.get(), opened.get()), (1, 0));

    adapter.settle_transitions();
    assert_eq!(opened.get(), 1);
}

#[test]
fn open_twice_is_a_noop() {
    let (adapter, ctx) = setup();
    let m = simple(&ctx, "x");
    m.open();
    m.open();
    adapter.flush();
    assert_eq!(ctx.stack_ids(), vec![m.id()]);
    assert_eq!(adapter.created.get(), 1);
    assert_eq!(adapter.escape_listeners(), 1);
}

#[test]
fn close_hides_and_keeps_surface_for_reuse() {
    let (adapter, ctx) = setup();
    let (closed, on_close) = counter();
    let m = modal(&ctx, MoviaOptions::new().content("x").on_close(on_close));
    m.open();
    adapter.flush();

    m.close();
    assert_eq!(m.lifecycle(), Lifecycle::Closing);
    assert!(ctx.stack_ids().is_empty());
    assert_eq!(adapter.escape_listeners(), 0);
    assert_eq!(closed.get(), 0);

    adapter.flush();
    let surface = surface_of(&m);
    assert_eq!(m.lifecycle(), Lifecycle::Mounted);
    assert_eq!(closed.get(), 1);
    adapter.with_surface(surface, |s| assert!(s.concealed && !s.visible));

    m.open();
    adapter.flush();
    assert_eq!(surface_of(&m), surface);
    assert_eq!(adapter.created.get(), 1);
    adapter.with_surface(surface, |s| assert!(!s.concealed && s.visible));
}

#[test]
fn close_when_not_open_is_a_noop() {
    let (adapter, ctx) = setup();
    let (closed, on_close) = counter();
    let m = modal(&ctx, MoviaOptions::new().content("x").on_close(on_close));
    m.close();
    m.open();
    adapter.flush();
    m.close();
    m.close();
    adapter.flush();
    assert_eq!(closed.get(), 1);
}

#[test]
fn destroy_on_close_tears_down_after_settle() {
    let (adapter, ctx) = setup();
    let m = modal(&ctx, MoviaOptions::new().content("x").destroy_on_close(true));
    m.open();
    adapter.flush();
    let first = surface_of(&m);

    m.close();
    assert!(adapter.is_alive(first), "teardown waits for the transition");
    adapter.flush();
    assert!(!adapter.is_alive(first));
    assert_eq!(m.lifecycle(), Lifecycle::Unmounted);

    m.open();
    adapter.flush();
    assert_ne!(surface_of(&m), first);
    assert_eq!(adapter.created.get(), 2);
}

#[test]
fn forced_close_destroys_surface() {
    let (adapter, ctx) = setup();
    let m = simple(&ctx, "x");
    m.open();
    adapter.flush();
    m.close_with(true);
    adapter.flush();
    assert_eq!(adapter.live_surfaces(), 0);
    assert_eq!(m.lifecycle(), Lifecycle::Unmounted);
}

#[test]
fn reopen_during_close_transition_supersedes_it() {
    let (adapter, ctx) = setup();
    let (closed, on_close) = counter();
    let m = modal(
        &ctx,
        MoviaOptions::new().content("x").destroy_on_close(true).on_close(on_close),
    );
    m.open();
    adapter.flush();

    m.close();
    m.open();
    adapter.flush();

    assert_eq!(closed.get(), 0);
    assert_eq!(m.lifecycle(), Lifecycle::Open);
    assert_eq!(adapter.live_surfaces(), 1);
    assert_eq!(ctx.stack_ids(), vec![m.id()]);
    adapter.with_surface(surface_of(&m), |s| assert!(s.visible));
}

#[test]
fn close_during_open_transition_skips_open_effects() {
    let (adapter, ctx) = setup();
    let (ready, on_ready) = counter();
    let (opened, on_open) = counter();
    let (closed, on_close) = counter();
    let m = modal(
        &ctx,
        MoviaOptions::new()
            .content("x")
            .on_ready(on_ready)
            .on_open(on_open)
            .on_close(on_close),
    );

    m.open();
    m.close();
    adapter.flush();

    assert_eq!((ready.get(), opened.get(), closed.get()), (0, 0, 1));
    assert_eq!(m.lifecycle(), Lifecycle::Mounted);
    assert!(adapter.ready_events.borrow().is_empty());
}

#[test]
fn destroyed_movia_refuses_to_reopen() {
    let (adapter, ctx) = setup();
    let m = simple(&ctx, "x");
    m.open();
    adapter.flush();

    m.destroy();
    assert_eq!(m.lifecycle(), Lifecycle::Destroyed);
    assert!(ctx.stack_ids().is_empty());
    adapter.flush();
    assert_eq!(adapter.live_surfaces(), 0);

    m.open();
    adapter.flush();
    assert_eq!(m.lifecycle(), Lifecycle::Destroyed);
    assert!(ctx.stack_ids().is_empty());
    assert_eq!(adapter.created.get(), 1);
}

#[test]
fn destroy_of_hidden_movia_removes_surface_immediately() {
    let (adapter, ctx) = setup();
    let m = simple(&ctx, "x");
    m.open();
    adapter.flush();
    m.close();
    adapter.flush();
    assert_eq!(adapter.live_surfaces(), 1);

    m.destroy();
    assert_eq!(adapter.live_surfaces(), 0);
    assert_eq!(adapter.pending_settles(), 0);
}

#[test]
fn destroy_during_close_cancels_pending_close() {
    let (adapter, ctx) = setup();
    let (closed, on_close) = counter();
    let m = modal(&ctx, MoviaOptions::new().content("x").on_close(on_close));
    m.open();
    adapter.flush();

    m.close();
    m.destroy();
    assert_eq!(adapter.live_surfaces(), 0);
    adapter.flush();
    assert_eq!(closed.get(), 0);
    assert_eq!(m.lifecycle(), Lifecycle::Destroyed);
}

#[test]
fn failing_callbacks_do_not_break_the_lifecycle() {
    let (adapter, ctx) = setup();
    let m = modal(
        &ctx,
        MoviaOptions::new()
            .content("x")
            .on_open(|| anyhow::bail!("boom"))
            .on_close(|| Err(anyhow::anyhow!("boom again"))),
    );
    m.open();
    adapter.flush();
    assert_eq!(m.lifecycle(), Lifecycle::Open);
    m.close();
    adapter.flush();
    assert_eq!(m.lifecycle(), Lifecycle::Mounted);
    m.open();
    assert!(m.is_open());
}

#[test]
fn escape_closes_only_the_topmost() {
    let (adapter, ctx) = setup();
    let a = simple(&ctx, "a");
    let b = simple(&ctx, "b");
    let c = simple(&ctx, "c");
    for m in [&a, &b, &c] {
        m.open();
    }
    adapter.flush();

    adapter.press_escape();
    assert!(a.is_open() && b.is_open() && !c.is_open());
    adapter.press_escape();
    assert!(a.is_open() && !b.is_open());
    assert_eq!(ctx.stack_ids(), vec![a.id()]);
}

#[test]
fn escape_ignored_when_not_a_close_method() {
    let (adapter, ctx) = setup();
    let m = modal(&ctx, MoviaOptions::new().content("x").close_methods(CloseMethods::BUTTON));
    m.open();
    adapter.flush();
    assert_eq!(adapter.escape_listeners(), 0);
    adapter.press_escape();
    assert!(m.is_open());
}

#[test]
fn topmost_without_escape_blocks_escape_below() {
    let (adapter, ctx) = setup();
    let a = simple(&ctx, "a");
    let b = modal(&ctx, MoviaOptions::new().content("b").close_methods(CloseMethods::OVERLAY));
    a.open();
    b.open();
    adapter.flush();
    adapter.press_escape();
    assert!(a.is_open() && b.is_open());
}

#[test]
fn close_button_and_overlay_follow_close_methods() {
    let (adapter, ctx) = setup();
    let only_button = modal(&ctx, MoviaOptions::new().content("x").close_methods(CloseMethods::BUTTON));
    only_button.open();
    adapter.flush();
    let surface = surface_of(&only_button);
    adapter.click_overlay(surface);
    assert!(only_button.is_open());
    adapter.click_close_button(surface);
    assert!(!only_button.is_open());

    let overlay = modal(&ctx, MoviaOptions::new().content("y").close_methods(CloseMethods::OVERLAY));
    overlay.open();
    adapter.flush();
    let surface = surface_of(&overlay);
    adapter.with_surface(surface, |s| assert!(!s.close_button));
    adapter.click_overlay(surface);
    assert!(!overlay.is_open());
}

#[test]
fn scroll_position_is_restored_on_reopen() {
    let (adapter, ctx) = setup();
    let kept = simple(&ctx, "x");
    let dropped = modal(&ctx, MoviaOptions::new().content("y").preserve_scroll_position(false));

    for m in [&kept, &dropped] {
        m.open();
        adapter.flush();
        let surface = surface_of(m);
        adapter.set_scroll(surface, 120.0);
        m.close();
        adapter.flush();
        adapter.set_scroll(surface, 0.0);
        m.open();
        adapter.flush();
    }

    adapter.with_surface(surface_of(&kept), |s| assert_eq!(s.scroll, 120.0));
    adapter.with_surface(surface_of(&dropped), |s| assert_eq!(s.scroll, 0.0));
}

#[test]
fn css_classes_fall_back_to_global_default() {
    let (adapter, ctx) = setup();
    ctx.configure(&serde_json::json!({ "defaultCssClass": "wide dark" }));
    let plain = simple(&ctx, "x");
    let custom = modal(&ctx, MoviaOptions::new().content("y").css_class(["narrow", " "]));
    plain.open();
    custom.open();

    adapter.with_surface(surface_of(&plain), |s| assert_eq!(s.classes, vec!["wide", "dark"]));
    adapter.with_surface(surface_of(&custom), |s| assert_eq!(s.classes, vec!["narrow"]));
}

#[test]
fn global_destroy_on_close_applies_to_new_modals() {
    let (adapter, ctx) = setup();
    let before = simple(&ctx, "x");
    ctx.configure(&serde_json::json!({ "destroyOnClose": true }));
    let after = simple(&ctx, "y");
    for m in [&before, &after] {
        m.open();
        adapter.flush();
        m.close();
        adapter.flush();
    }
    assert_eq!(before.lifecycle(), Lifecycle::Mounted);
    assert_eq!(after.lifecycle(), Lifecycle::Unmounted);
}

#[test]
fn dropping_every_handle_leaves_queued_callbacks_harmless() {
    let (adapter, ctx) = setup();
    let m = simple(&ctx, "x");
    m.open();
    drop(m);
    adapter.flush();
    adapter.press_escape();
    assert_eq!(adapter.ready_events.borrow().len(), 0);
}
