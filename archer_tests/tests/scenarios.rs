//! End-to-end scenarios: host events in, frames out.

use archer_client::{anim::Clip, game::AssetStatus, Character};
use archer_shared::event::{InputEvent, PointerButton};
use archer_tests::{
    full_model, init_tracing, loaded_game, new_game, run, FailingLoader, StaticLoader, FRAME,
};

fn right_click() -> InputEvent {
    InputEvent::PointerDown(PointerButton::Secondary)
}

#[test]
fn walking_forward_without_aim_keeps_idle() {
    init_tracing();
    let mut game = loaded_game();
    game.tick(FRAME);
    assert_eq!(game.character().current_clip(), Some(Clip::Idle));

    game.push_event(InputEvent::KeyDown("w".into()));
    let before = game.character().transform();
    run(&mut game, 10);
    let after = game.character().transform();

    assert!((after.z - before.z - 10.0 * game.cfg.normal_speed).abs() < 1e-5);
    assert_eq!(after.x, before.x);
    assert_eq!(game.character().current_clip(), Some(Clip::Idle));
    assert_eq!(game.character().animator().count(Clip::Idle), 1);
}

#[test]
fn right_click_while_walking_draws_then_aims_forward() {
    init_tracing();
    let mut game = loaded_game();
    game.push_event(InputEvent::KeyDown("w".into()));
    run(&mut game, 3);

    game.push_event(right_click());
    game.tick(FRAME);
    assert!(game.character().is_aiming());
    assert_eq!(game.character().current_clip(), Some(Clip::Draw));
    assert_eq!(game.character().animator().last(), Some(("draw", false)));

    // The toggle frame plus 48 more is 980ms.
    for _ in 0..48 {
        game.tick(FRAME);
        assert_eq!(game.character().current_clip(), Some(Clip::Draw));
    }
    game.tick(FRAME);
    assert_eq!(game.character().current_clip(), Some(Clip::AimWalkForward));
    let starts: Vec<(&str, bool)> = game
        .character()
        .animator()
        .starts
        .iter()
        .map(|(name, looping)| (name.as_str(), *looping))
        .collect();
    assert_eq!(
        starts,
        vec![("idle", true), ("draw", false), ("aim-walk-forward", true)]
    );
    assert_eq!(game.character().animator().count(Clip::AimOverdraw), 0);
}

#[test]
fn model_loading_mid_walk_starts_idle() {
    init_tracing();
    let mut game = new_game();
    game.push_event(InputEvent::KeyDown("w".into()));
    run(&mut game, 5);
    assert_eq!(game.character().current_clip(), None);

    game.finish_asset_load(Ok(full_model()));
    run(&mut game, 5);
    assert_eq!(game.asset_status(), AssetStatus::Ready);
    assert_eq!(game.character().current_clip(), Some(Clip::Idle));
    assert_eq!(game.character().animator().count(Clip::Idle), 1);
    assert!(game.character().transform().z > 0.0);
}

#[test]
fn right_click_then_stop_settles_on_overdraw() {
    let mut game = loaded_game();
    game.push_event(InputEvent::KeyDown("w".into()));
    game.push_event(right_click());
    game.tick(FRAME);
    game.push_event(InputEvent::KeyUp("W".into()));
    run(&mut game, 49);

    assert_eq!(game.character().current_clip(), Some(Clip::AimOverdraw));
    assert_eq!(game.character().animator().count(Clip::AimWalkForward), 0);
}

#[test]
fn rapid_retoggle_never_forces_idle() {
    init_tracing();
    let mut game = loaded_game();
    game.tick(FRAME);
    let idle_starts = game.character().animator().count(Clip::Idle);

    // Aim, release, aim again: 100ms apart, inside the 500ms recoil window.
    game.push_event(right_click());
    run(&mut game, 5);
    game.push_event(right_click());
    run(&mut game, 5);
    game.push_event(right_click());
    game.tick(FRAME);
    assert_eq!(game.character().current_clip(), Some(Clip::Draw));

    for _ in 0..48 {
        game.tick(FRAME);
        assert_eq!(game.character().current_clip(), Some(Clip::Draw));
    }
    game.tick(FRAME);
    assert_eq!(game.character().current_clip(), Some(Clip::AimOverdraw));
    assert_eq!(game.character().animator().count(Clip::Idle), idle_starts);

    run(&mut game, 100);
    assert_eq!(game.character().current_clip(), Some(Clip::AimOverdraw));
    assert_eq!(game.character().animator().count(Clip::AimOverdraw), 1);
}

#[test]
fn speed_matches_stance_every_frame() {
    let mut game = loaded_game();
    game.push_event(InputEvent::KeyDown("d".into()));
    for i in 0..60 {
        if i % 7 == 0 {
            game.push_event(right_click());
        }
        let before = game.character().transform().x;
        game.tick(FRAME);
        let step = game.character().transform().x - before;
        let expected = if game.character().is_aiming() {
            game.cfg.aim_speed
        } else {
            game.cfg.normal_speed
        };
        assert!((step - expected).abs() < 1e-5, "frame {i}: step {step}, expected {expected}");
        assert_eq!(game.character().move_speed(), expected);
    }
}

#[test]
fn unchanged_frames_do_not_restart_clips() {
    let mut game = loaded_game();
    run(&mut game, 200);
    assert_eq!(game.character().animator().starts.len(), 1);

    game.push_event(right_click());
    run(&mut game, 200);
    let starts = game.character().animator().starts.len();
    run(&mut game, 200);
    assert_eq!(game.character().animator().starts.len(), starts);
}

#[tokio::test]
async fn failed_load_never_starts_a_clip() {
    init_tracing();
    let mut game = new_game();
    game.start_asset_load(FailingLoader);

    game.push_event(InputEvent::KeyDown("a".into()));
    for i in 0..300 {
        tokio::task::yield_now().await;
        if i % 40 == 0 {
            game.push_event(right_click());
        }
        game.tick(FRAME);
    }

    assert_eq!(game.asset_status(), AssetStatus::Failed);
    assert!(game.model().is_none());
    assert!(game.character().transform().x < 0.0);
    assert!(game.character().animator().starts.is_empty());
    assert_eq!(game.character().current_clip(), None);
}

#[tokio::test]
async fn background_load_switches_from_placeholder_to_idle() {
    let mut game = new_game();
    game.start_asset_load(StaticLoader(full_model()));

    for _ in 0..50 {
        tokio::task::yield_now().await;
        game.tick(FRAME);
        if game.asset_status() == AssetStatus::Ready {
            break;
        }
    }

    assert_eq!(game.asset_status(), AssetStatus::Ready);
    assert_eq!(game.model().map(|m| m.clips.len()), Some(Clip::ALL.len()));
    assert_eq!(game.character().animator().last(), Some(("idle", true)));
}
