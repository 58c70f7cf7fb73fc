mod common;

use common::Rig;
use keysynth::{keys::KeyState, KeyMode};

#[test]
fn mono_retriggers_on_every_new_note() {
    let mut rig = Rig::new(4, KeyMode::Mono, 1);
    rig.press(60);
    assert_eq!(rig.voice(0).triggers, 1);

    rig.press(64);
    let voice = rig.voice(0);
    assert_eq!(voice.note, 64);
    assert_eq!(voice.triggers, 2);
    assert_eq!(rig.on_indices(), vec![0]);
}

#[test]
fn legato_glides_without_retrigger() {
    let mut rig = Rig::new(4, KeyMode::Legato, 1);
    rig.press(60);
    assert_eq!(rig.voice(0).triggers, 1);

    rig.press(64);
    let voice = rig.voice(0);
    assert_eq!(voice.note, 64);
    assert_eq!(voice.triggers, 1);
    assert_eq!(voice.note_changes, 2);
    assert!(voice.key_on);
    assert_eq!(rig.on_indices(), vec![0]);
}

#[test]
fn exposed_key_keeps_the_latched_velocity() {
    for mode in [KeyMode::Mono, KeyMode::Legato] {
        let mut rig = Rig::new(4, mode, 1);
        rig.table.press(60, 40);
        rig.pump();
        rig.table.press(64, 120);
        rig.pump();
        assert_eq!(rig.ctrl.mono_velocity(), 120);

        rig.release(64);
        let voice = rig.voice(0);
        assert_eq!(voice.note, 60, "{mode:?}");
        assert_eq!(voice.velocity, 120, "{mode:?}");
    }
}

#[test]
fn exposed_key_retriggers_in_mono_only() {
    let mut mono = Rig::new(4, KeyMode::Mono, 1);
    mono.press(60);
    mono.press(64);
    mono.release(64);
    assert_eq!(mono.voice(0).triggers, 3);

    let mut legato = Rig::new(4, KeyMode::Legato, 1);
    legato.press(60);
    legato.press(64);
    legato.release(64);
    assert_eq!(legato.voice(0).triggers, 1);
    assert_eq!(legato.voice(0).note, 60);
}

#[test]
fn releasing_a_hidden_key_changes_nothing() {
    let mut rig = Rig::new(4, KeyMode::Mono, 1);
    rig.press(60);
    rig.press(64);
    rig.release(60);

    let voice = rig.voice(0);
    assert_eq!(voice.note, 64);
    assert_eq!(voice.triggers, 2);
    assert_eq!(voice.releases, 0);
}

#[test]
fn last_key_up_releases_the_group() {
    for mode in [KeyMode::Mono, KeyMode::Legato] {
        let mut rig = Rig::new(4, mode, 2);
        rig.press(60);
        rig.release(60);

        assert!(rig.ctrl.on_list().is_empty(), "{mode:?}");
        assert_eq!(rig.ctrl.mono_velocity(), 0);
        for index in 0..2 {
            assert!(!rig.voice(index).key_on);
            assert_eq!(rig.voice(index).releases, 1);
        }
    }
}

#[test]
fn mono_group_occupies_the_first_voices() {
    let mut rig = Rig::new(6, KeyMode::Mono, 3);
    rig.press(60);

    assert_eq!(rig.on_indices(), vec![0, 1, 2]);
    for role in 0..3 {
        let unison = rig.voice(role).unison;
        assert_eq!(unison.master, 0);
        assert_eq!(unison.size, 3);
        assert_eq!(unison.role, role);
    }
    assert!(rig.ctrl.pool().iter().skip(3).all(|v| v.triggers == 0));

    // Hard retrigger keeps each voice listed once
    rig.press(64);
    assert_eq!(rig.on_indices(), vec![0, 1, 2]);
    rig.assert_on_list_consistent();
}

#[test]
fn legato_only_triggers_voices_that_were_off() {
    let mut rig = Rig::new(4, KeyMode::Legato, 2);
    rig.press(60);
    // Drop one voice out of the group behind the controller's back
    rig.ctrl.pool_mut().get_mut(1).unwrap().key_on = false;

    rig.press(64);
    assert_eq!(rig.voice(0).triggers, 1);
    assert_eq!(rig.voice(1).triggers, 2);
    assert!(rig.ctrl.pool().iter().take(2).all(|v| v.note == 64));
    assert_eq!(rig.on_indices(), vec![0, 1]);
}

#[test]
fn switching_mode_releases_poly_voices() {
    let mut rig = Rig::new(4, KeyMode::Poly, 1);
    rig.press(60);
    rig.press(64);

    rig.ctrl.set_key_mode(KeyMode::Mono);
    assert!(rig.ctrl.on_list().is_empty());
    assert!(rig.ctrl.pool().iter().all(|v| !v.key_on));

    rig.press(67);
    assert_eq!(rig.on_indices(), vec![0]);
    assert_eq!(rig.voice(0).note, 67);
}

#[test]
fn mode_switch_with_keys_held_falls_back_to_key_velocity() {
    let mut rig = Rig::new(4, KeyMode::Poly, 1);
    rig.table.press(60, 30);
    rig.pump();
    rig.table.press(64, 90);
    rig.pump();

    rig.ctrl.set_key_mode(KeyMode::Legato);
    rig.release(64);

    let voice = rig.voice(0);
    assert!(voice.key_on);
    assert_eq!(voice.note, 60);
    assert_eq!(voice.velocity, 30);
}

#[test]
fn unison_change_releases_everything() {
    let mut rig = Rig::new(4, KeyMode::Mono, 1);
    rig.press(60);
    rig.ctrl.set_unison_count(3);

    assert_eq!(rig.ctrl.unison_count(), 3);
    assert!(rig.ctrl.on_list().is_empty());

    rig.ctrl.set_unison_count(99);
    assert_eq!(rig.ctrl.unison_count(), 4);
}

#[test]
fn key_pressed_during_a_pass_sounds_once_at_its_own_velocity() {
    let mut rig = Rig::new(4, KeyMode::Mono, 1);
    rig.table.press(60, 40);
    rig.pump();
    rig.table.press(62, 50);
    rig.pump();

    rig.table.release(62);
    assert!(rig.keys.has_changed());
    // Lands between the change check and the trigger pass
    rig.table.press(67, 127);
    rig.ctrl.trigger(&rig.keys);
    rig.keys.acknowledge_change();

    let voice = rig.voice(0);
    assert_eq!(voice.note, 60);
    assert_eq!(voice.velocity, 50);
    assert_eq!(voice.triggers, 3);

    assert!(rig.pump());
    let voice = rig.voice(0);
    assert_eq!(voice.note, 67);
    assert_eq!(voice.velocity, 127);
    assert_eq!(voice.triggers, 4);
    assert!(!rig.pump());
}
