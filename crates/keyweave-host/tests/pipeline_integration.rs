//! Integration tests for the keystroke pipeline.
//!
//! These tests exercise the application layer of keyweave-host end-to-end:
//! `Pipeline` + `KeyFilter` + `Worker` + `ProcessKeysUseCase` + mock
//! infrastructure standing in for the hook, the foreground window and
//! `SendInput`.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use keyweave_core::engine::mock::ScriptedEngine;
use keyweave_core::keymap::windows_vk::*;
use keyweave_core::{
    EngineResult, KeyboardShortcut, ModifierState, NeutralKey, SharedEngine, WindowHandle,
    INJECTION_MARKER,
};
use keyweave_host::application::classify_app::{AppClassifier, ClassificationRules};
use keyweave_host::application::filter_keys::{HookNotice, HookVerdict};
use keyweave_host::application::inject_text::{
    InjectionTiming, Injector, SyntheticInput, SyntheticKey,
};
use keyweave_host::application::pipeline::{Pipeline, PipelineConfig};
use keyweave_host::application::process_keys::ProcessKeysUseCase;
use keyweave_host::application::settings::ImeController;
use keyweave_host::application::worker::WorkerConfig;
use keyweave_host::infrastructure::foreground::mock::FixedForeground;
use keyweave_host::infrastructure::input_capture::mock::MockKeyboardHook;
use keyweave_host::infrastructure::input_emulation::mock::{
    MockInputSynthesizer, RecordingPacer, TimelineEntry,
};
use keyweave_host::infrastructure::storage::config::AppConfig;
use keyweave_host::infrastructure::storage::mock::MemoryConfigStore;

const VK_C: u16 = 0x43;
const VK_S: u16 = 0x53;

// ── Harness ───────────────────────────────────────────────────────────────────

struct Harness {
    pipeline: Pipeline<ProcessKeysUseCase<FixedForeground>>,
    hook: MockKeyboardHook,
    engine: SharedEngine,
    recorder: ScriptedEngine,
    synth: Arc<MockInputSynthesizer>,
}

fn harness(scripted: ScriptedEngine, app: &str) -> Harness {
    harness_with(scripted, app, PipelineConfig::default())
}

fn harness_with(scripted: ScriptedEngine, app: &str, config: PipelineConfig) -> Harness {
    let recorder = scripted.clone();
    let engine = SharedEngine::new(scripted);
    let synth = Arc::new(MockInputSynthesizer::new());
    let pacer = RecordingPacer::with_timeline(synth.timeline());
    let injector = Injector::new(synth.clone(), Arc::new(pacer), InjectionTiming::default());
    let classifier = AppClassifier::new(
        FixedForeground::new(WindowHandle(7), app),
        ClassificationRules::with_defaults(),
    );
    let processor = ProcessKeysUseCase::new(engine.clone(), classifier, injector);

    let hook = MockKeyboardHook::new();
    let mut pipeline =
        Pipeline::new(processor, engine.enabled_flag(), Box::new(hook.clone()), config);
    pipeline.start().expect("pipeline must start with the mock hook");

    Harness { pipeline, hook, engine, recorder, synth }
}

fn wait_until(what: &str, mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !done() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

fn ctrl() -> ModifierState {
    ModifierState { ctrl: true, ..ModifierState::default() }
}

fn unicode_of(text: &str) -> Vec<SyntheticInput> {
    text.encode_utf16()
        .flat_map(|u| [SyntheticInput::unicode(u, false), SyntheticInput::unicode(u, true)])
        .collect()
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn test_plain_letter_is_replaced_by_one_insert_without_backspaces() {
    // Arrange
    let scripted = ScriptedEngine::new().with_response(NeutralKey::A, EngineResult::send(0, "a"));
    let h = harness(scripted, "notepad");

    // Act
    let verdict = h.hook.press(VK_A);
    wait_until("injection", || !h.synth.batches().is_empty());

    // Assert
    assert_eq!(verdict, Some(HookVerdict::Consume));
    assert_eq!(h.synth.batches(), vec![unicode_of("a")]);
}

#[test]
fn test_tone_mark_erases_one_character_then_types_replacement() {
    // Arrange
    let scripted = ScriptedEngine::new().with_response(NeutralKey::S, EngineResult::send(1, "á"));
    let h = harness(scripted, "notepad");

    // Act
    h.hook.press(VK_S);
    wait_until("replacement", || h.synth.batches().len() == 2);

    // Assert
    let timing = InjectionTiming::default();
    assert_eq!(
        h.synth.timeline_entries(),
        vec![
            TimelineEntry::Batch(vec![
                SyntheticInput::virtual_key(VK_BACK, false),
                SyntheticInput::virtual_key(VK_BACK, true),
            ]),
            TimelineEntry::Pause(timing.fast_delay),
            TimelineEntry::Batch(unicode_of("á")),
        ]
    );
}

#[test]
fn test_ctrl_chord_passes_through_and_clears_composition() {
    // Arrange
    let h = harness(ScriptedEngine::new(), "notepad");

    // Act
    let verdict = h.hook.press_with(VK_C, ctrl());
    wait_until("buffer clear", || h.recorder.clear_count() == 1);

    // Assert
    assert_eq!(verdict, Some(HookVerdict::PassThrough));
    assert!(h.recorder.processed().is_empty(), "no key event may reach the engine");
    assert!(h.synth.batches().is_empty(), "a passed-through key is not re-typed");
}

#[test]
fn test_slow_app_gets_one_timed_pair_per_character() {
    // Arrange
    let scripted = ScriptedEngine::new().with_response(NeutralKey::A, EngineResult::send(0, "abc"));
    let h = harness(scripted, "Code.exe");

    // Act
    h.hook.press(VK_A);
    wait_until("paced injection", || h.synth.batches().len() == 3);

    // Assert
    let timing = InjectionTiming::default();
    assert_eq!(
        h.synth.timeline_entries(),
        vec![
            TimelineEntry::Pause(timing.slow_pre_delay),
            TimelineEntry::Batch(unicode_of("a")),
            TimelineEntry::Pause(timing.slow_key_delay),
            TimelineEntry::Batch(unicode_of("b")),
            TimelineEntry::Pause(timing.slow_key_delay),
            TimelineEntry::Batch(unicode_of("c")),
            TimelineEntry::Pause(timing.slow_key_delay),
        ]
    );
}

#[test]
fn test_fast_app_gets_a_single_batched_submission() {
    let scripted = ScriptedEngine::new().with_response(NeutralKey::A, EngineResult::send(0, "abc"));
    let h = harness(scripted, "notepad");

    h.hook.press(VK_A);
    wait_until("batched injection", || !h.synth.batches().is_empty());
    thread::sleep(Duration::from_millis(20));

    assert_eq!(h.synth.batches(), vec![unicode_of("abc")]);
}

#[test]
fn test_disable_after_enqueue_is_honoured_at_process_time() {
    // Arrange
    let scripted = ScriptedEngine::new()
        .with_response(NeutralKey::A, EngineResult::send(0, "â"))
        .with_response(NeutralKey::S, EngineResult::send(0, "ś"));
    let h = harness(scripted, "notepad");
    let handler = h.pipeline.worker().handler();

    // Act: hold the worker off while both keys are queued, then disable
    let guard = handler.lock();
    let first = h.hook.press(VK_A);
    let second = h.hook.press(VK_S);
    h.engine.set_enabled(false);
    drop(guard);
    wait_until("both keys re-typed", || h.synth.batches().len() == 2);

    // Assert
    assert_eq!(first, Some(HookVerdict::Consume));
    assert_eq!(second, Some(HookVerdict::Consume));
    assert!(h.recorder.processed().is_empty(), "disabled engine must not be called");
    let retyped: Vec<SyntheticKey> = h.synth.batches().iter().map(|b| b[0].key).collect();
    assert_eq!(retyped, vec![SyntheticKey::Virtual(VK_A), SyntheticKey::Virtual(VK_S)]);
}

#[test]
fn test_dispose_wakes_worker_blocked_in_dequeue() {
    // Arrange
    let config = PipelineConfig {
        worker: WorkerConfig {
            dequeue_timeout: Duration::from_secs(30),
            stop_timeout: Duration::from_millis(500),
        },
        ..PipelineConfig::default()
    };
    let mut h = harness_with(ScriptedEngine::new(), "notepad", config);
    thread::sleep(Duration::from_millis(20));

    // Act
    let start = Instant::now();
    h.pipeline.queue().dispose();
    h.pipeline.shutdown();

    // Assert
    assert!(start.elapsed() < Duration::from_millis(500));
    assert!(!h.pipeline.worker().is_running());
    assert_eq!(h.hook.stop_count(), 1);
}

// ── Ordering and feedback ─────────────────────────────────────────────────────

#[test]
fn test_keys_are_delivered_in_capture_order() {
    // Arrange
    let h = harness(ScriptedEngine::new(), "notepad");
    let keys: Vec<u16> = (VK_A..=VK_Z).collect();

    // Act
    for &vk in &keys {
        assert_eq!(h.hook.press(vk), Some(HookVerdict::Consume));
    }
    wait_until("all keys re-typed", || h.synth.batches().len() == keys.len());

    // Assert
    let retyped: Vec<SyntheticKey> = h.synth.batches().iter().map(|b| b[0].key).collect();
    let expected: Vec<SyntheticKey> = keys.iter().map(|&vk| SyntheticKey::Virtual(vk)).collect();
    assert_eq!(retyped, expected);
    assert_eq!(h.recorder.processed().len(), keys.len());
}

#[test]
fn test_injected_output_does_not_reenter_the_pipeline() {
    // Arrange
    let scripted = ScriptedEngine::new().with_response(NeutralKey::S, EngineResult::send(1, "á"));
    let h = harness(scripted, "notepad");
    h.hook.press(VK_S);
    wait_until("replacement", || h.synth.batches().len() == 2);

    // Act: replay every synthetic key-down through the hook the way the OS would
    let mut verdicts = Vec::new();
    for input in h.synth.batches().into_iter().flatten().filter(|i| !i.key_up) {
        let vk = match input.key {
            SyntheticKey::Virtual(vk) => vk,
            SyntheticKey::Unicode(_) => 0xE7,
        };
        verdicts.push(h.hook.press_injected(vk, input.extra_info));
    }
    thread::sleep(Duration::from_millis(20));

    // Assert
    assert!(!verdicts.is_empty());
    assert!(verdicts.iter().all(|v| *v == Some(HookVerdict::PassThrough)));
    assert_eq!(h.recorder.processed().len(), 1, "only the physical key reaches the engine");
    assert!(h.pipeline.queue().is_empty());
}

#[test]
fn test_marker_alone_is_enough_to_pass_through() {
    let h = harness(ScriptedEngine::new(), "notepad");

    let verdict = h.hook.press_injected(VK_A, INJECTION_MARKER);

    assert_eq!(verdict, Some(HookVerdict::PassThrough));
    assert!(h.pipeline.queue().is_empty());
}

// ── Lifecycle and settings ────────────────────────────────────────────────────

#[test]
fn test_after_shutdown_keys_reach_the_os_untouched() {
    // Arrange
    let mut h = harness(ScriptedEngine::new(), "notepad");

    // Act
    h.pipeline.shutdown();
    h.pipeline.shutdown();

    // Assert
    assert_eq!(h.hook.press(VK_A), None, "hook must be uninstalled");
    assert_eq!(h.hook.start_count(), 1);
    assert_eq!(h.hook.stop_count(), 1);
    assert!(h.pipeline.queue().is_disposed());
}

#[test]
fn test_hotkey_toggles_transformation_through_the_controller() {
    // Arrange
    let h = harness(ScriptedEngine::new(), "notepad");
    let store = MemoryConfigStore::new();
    let mut controller = ImeController::new(
        h.engine.clone(),
        h.pipeline.filter(),
        AppConfig::default(),
        Box::new(store.clone()),
    );
    controller.apply_all();
    let notices = h.pipeline.notices();

    // Act
    let hotkey = h.hook.press_with(VK_SPACE, ctrl());
    let notice = notices.recv_timeout(Duration::from_secs(1)).expect("hotkey notice");
    controller.handle_notice(notice).expect("in-memory save cannot fail");
    let after_toggle = h.hook.press(VK_A);

    // Assert
    assert_eq!(hotkey, Some(HookVerdict::Consume));
    assert_eq!(notice, HookNotice::HotkeyTriggered);
    assert_eq!(after_toggle, Some(HookVerdict::PassThrough));
    assert_eq!(h.pipeline.filter().hotkey(), Some(KeyboardShortcut::default()));
    assert_eq!(store.last_saved().map(|c| c.engine.enabled), Some(false));
}
