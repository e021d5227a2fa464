use super::*;
use futures::executor::block_on;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::controller::transition_phase;

#[derive(Clone, Debug, Eq, PartialEq)]
struct TestError(&'static str);

impl ValidationError for TestError {
    fn message(&self) -> String {
        self.0.to_string()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, FormModel)]
struct SignupForm {
    handle: String,
    email: String,
}

fn signup_controller() -> FormController<SignupForm, TestError> {
    let controller = FormController::new(SignupForm::default());
    let fields = SignupForm::fields();
    controller
        .register_field_validator(fields.handle(), |_model: &SignupForm, value: &String| {
            if value.is_empty() {
                Err(TestError("required"))
            } else {
                Ok(())
            }
        })
        .expect("register handle required");
    controller
        .register_field_validator(fields.handle(), |_model: &SignupForm, value: &String| {
            if value.len() < 3 {
                Err(TestError("short"))
            } else {
                Ok(())
            }
        })
        .expect("register handle length");
    controller
        .register_field_validator(fields.email(), |_model: &SignupForm, value: &String| {
            if value.contains('@') {
                Ok(())
            } else {
                Err(TestError("email"))
            }
        })
        .expect("register email");
    controller
}

fn fill_valid(controller: &FormController<SignupForm, TestError>) {
    let fields = SignupForm::fields();
    controller
        .set(fields.handle(), "ferris".to_string())
        .expect("set handle");
    controller
        .set(fields.email(), "ferris@example.com".to_string())
        .expect("set email");
}

fn record_phases(
    controller: &FormController<SignupForm, TestError>,
) -> Arc<Mutex<Vec<SubmissionPhase>>> {
    let phases = Arc::new(Mutex::new(Vec::new()));
    let sink = phases.clone();
    controller
        .subscribe(move |snapshot| {
            let mut phases = sink.lock().expect("phase lock");
            if phases.last() != Some(&snapshot.phase) {
                phases.push(snapshot.phase);
            }
        })
        .expect("subscribe");
    phases
}

#[test]
fn validate_form_reports_one_error_per_field_in_registration_order() {
    let controller = signup_controller();
    let fields = SignupForm::fields();

    assert!(!controller.validate_form().expect("validate"));
    let errors = controller.errors().expect("errors");
    assert_eq!(
        errors.iter().collect::<Vec<_>>(),
        vec![
            (fields.handle().key(), &TestError("required")),
            (fields.email().key(), &TestError("email")),
        ]
    );

    controller
        .set(fields.handle(), "ab".to_string())
        .expect("set handle");
    assert!(!controller.validate_form().expect("validate"));
    assert_eq!(
        controller.errors().expect("errors").message(fields.handle().key()),
        Some("short".to_string())
    );
}

#[test]
fn set_drops_only_the_edited_fields_error() {
    let controller = signup_controller();
    let fields = SignupForm::fields();
    assert!(!controller.validate_form().expect("validate"));

    controller
        .set(fields.handle(), "x".to_string())
        .expect("set handle");

    let snapshot = controller.snapshot().expect("snapshot");
    assert_eq!(snapshot.model.handle, "x");
    assert!(!snapshot.errors.contains(fields.handle().key()));
    assert!(snapshot.errors.contains(fields.email().key()));
    assert!(!snapshot.is_valid);
}

#[test]
fn rejected_submit_skips_dispatch_and_returns_to_idle() {
    let controller = signup_controller();
    let dispatched = Arc::new(AtomicUsize::new(0));

    let outcome = {
        let dispatched = dispatched.clone();
        controller
            .submit(move |_model| {
                dispatched.fetch_add(1, Ordering::SeqCst);
                Ok::<(), ()>(())
            })
            .expect("submit")
    };

    assert_eq!(outcome, Submission::Rejected);
    assert_eq!(dispatched.load(Ordering::SeqCst), 0);
    let snapshot = controller.snapshot().expect("snapshot");
    assert_eq!(snapshot.phase, SubmissionPhase::Idle);
    assert_eq!(snapshot.submit_count, 1);
    assert_eq!(snapshot.errors.len(), 2);
}

#[test]
fn failed_dispatch_keeps_model_and_returns_to_idle() {
    let controller = signup_controller();
    fill_valid(&controller);

    let outcome = controller
        .submit(|_model| Err::<(), _>("offline"))
        .expect("submit");

    assert_eq!(outcome, Submission::Failed("offline"));
    let snapshot = controller.snapshot().expect("snapshot");
    assert_eq!(snapshot.phase, SubmissionPhase::Idle);
    assert_eq!(snapshot.model.handle, "ferris");
    assert!(snapshot.errors.is_empty());
}

#[test]
fn successful_submit_walks_every_phase_then_turns_away_resubmits() {
    let controller = signup_controller();
    fill_valid(&controller);
    let phases = record_phases(&controller);
    let dispatched = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let dispatched = dispatched.clone();
        let _ = controller
            .submit(move |model: &SignupForm| {
                assert_eq!(model.handle, "ferris");
                dispatched.fetch_add(1, Ordering::SeqCst);
                Ok::<(), ()>(())
            })
            .expect("submit");
    }

    assert_eq!(dispatched.load(Ordering::SeqCst), 1);
    assert_eq!(
        *phases.lock().expect("phase lock"),
        vec![
            SubmissionPhase::Validating,
            SubmissionPhase::Submitting,
            SubmissionPhase::Succeeded,
        ]
    );
}

#[test]
fn nested_submit_during_dispatch_is_busy() {
    let controller = signup_controller();
    fill_valid(&controller);

    let inner = controller.clone();
    let outcome = controller
        .submit(move |_model| inner.submit(|_model| Ok::<(), ()>(())))
        .expect("outer submit");

    assert_eq!(outcome, Submission::Dispatched(Submission::Busy));
}

#[test]
fn phase_transitions_outside_the_cycle_are_rejected() {
    let controller = signup_controller();
    let mut state = controller.state.write().expect("state lock");

    assert_eq!(
        transition_phase(&mut state, SubmissionPhase::Succeeded),
        Err(FormError::InvalidStateTransition {
            from: SubmissionPhase::Idle,
            to: SubmissionPhase::Succeeded,
        })
    );
    assert_eq!(
        transition_phase(&mut state, SubmissionPhase::Validating),
        Ok(())
    );
    assert!(transition_phase(&mut state, SubmissionPhase::Succeeded).is_err());
    assert_eq!(transition_phase(&mut state, SubmissionPhase::Idle), Ok(()));
}

#[test]
fn unsubscribed_listeners_stop_receiving_snapshots() {
    let controller = signup_controller();
    let fields = SignupForm::fields();
    let seen = Arc::new(AtomicUsize::new(0));
    let id = {
        let seen = seen.clone();
        controller
            .subscribe(move |_snapshot| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .expect("subscribe")
    };

    controller
        .set(fields.handle(), "a".to_string())
        .expect("set handle");
    assert!(controller.unsubscribe(id).expect("unsubscribe"));
    controller
        .set(fields.handle(), "ab".to_string())
        .expect("set handle");

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert!(!controller.unsubscribe(id).expect("unsubscribe twice"));
}

#[test]
fn scheduled_reset_restores_initial_model_after_delay() {
    let controller = signup_controller();
    fill_valid(&controller);
    let _ = controller
        .submit(|_model| Ok::<(), ()>(()))
        .expect("submit");

    let task = controller
        .schedule_reset(Duration::from_millis(20))
        .expect("schedule");
    assert_eq!(
        controller.phase().expect("phase"),
        SubmissionPhase::Succeeded
    );
    assert_eq!(block_on(task), ResetOutcome::Completed);

    let snapshot = controller.snapshot().expect("snapshot");
    assert_eq!(snapshot.phase, SubmissionPhase::Idle);
    assert_eq!(snapshot.model, SignupForm::default());
}

#[test]
fn rescheduling_aborts_the_previous_reset() {
    let controller = signup_controller();
    let first = controller
        .schedule_reset(Duration::from_millis(10))
        .expect("schedule first");
    let second = controller
        .schedule_reset(Duration::from_millis(10))
        .expect("schedule second");

    assert_eq!(block_on(first), ResetOutcome::Cancelled);
    assert_eq!(block_on(second), ResetOutcome::Completed);
}

#[test]
fn reset_to_initial_aborts_pending_reset() {
    let controller = signup_controller();
    fill_valid(&controller);
    let task = controller
        .schedule_reset(Duration::from_millis(10))
        .expect("schedule");

    controller.reset_to_initial().expect("reset");
    assert_eq!(
        controller.snapshot().expect("snapshot").model,
        SignupForm::default()
    );
    assert_eq!(block_on(task), ResetOutcome::Cancelled);
}

#[test]
fn dispose_cancels_reset_and_blocks_mutation() {
    let controller = signup_controller();
    fill_valid(&controller);
    let task = controller
        .schedule_reset(Duration::from_millis(10))
        .expect("schedule");

    controller.dispose().expect("dispose");

    assert_eq!(block_on(task), ResetOutcome::Cancelled);
    assert_eq!(
        controller.set(SignupForm::fields().handle(), String::new()),
        Err(FormError::Disposed)
    );
    assert_eq!(
        controller.submit(|_model| Ok::<(), ()>(())),
        Err(FormError::Disposed)
    );
    assert_eq!(
        controller.snapshot().expect("snapshot").model.handle,
        "ferris"
    );
}

#[test]
fn dropping_every_handle_cancels_reset() {
    let controller = signup_controller();
    let task = controller
        .schedule_reset(Duration::from_millis(10))
        .expect("schedule");
    drop(controller);

    assert_eq!(block_on(task), ResetOutcome::Cancelled);
}

#[test]
fn spawned_reset_keeps_running_after_its_watch_is_dropped() {
    let controller = signup_controller();
    fill_valid(&controller);
    let mut pool = futures::executor::LocalPool::new();

    let watch = controller
        .schedule_reset(Duration::from_millis(10))
        .expect("schedule")
        .spawn_on(&pool.spawner())
        .expect("spawn");
    drop(watch);
    pool.run();

    assert_eq!(
        controller.snapshot().expect("snapshot").model,
        SignupForm::default()
    );
}

#[test]
fn edits_are_refused_while_the_form_is_busy() {
    let controller = signup_controller();
    fill_valid(&controller);
    let fields = SignupForm::fields();

    let during_dispatch = {
        let inner = controller.clone();
        controller
            .submit(move |_model| inner.set(SignupForm::fields().handle(), "x".to_string()))
            .expect("submit")
    };
    assert_eq!(
        during_dispatch,
        Submission::Failed(FormError::Busy(SubmissionPhase::Submitting))
    );

    let _ = controller
        .submit(|_model| Ok::<(), ()>(()))
        .expect("submit");
    assert_eq!(
        controller.set(fields.handle(), "x".to_string()),
        Err(FormError::Busy(SubmissionPhase::Succeeded))
    );
    assert_eq!(controller.get(fields.handle()).expect("handle"), "ferris");
}

#[test]
fn error_helpers_clear_selectively() {
    let controller = signup_controller();
    let fields = SignupForm::fields();
    assert!(!controller.validate_form().expect("validate"));
    assert_eq!(
        controller.errors().expect("errors").first(),
        Some((fields.handle().key(), &TestError("required")))
    );

    controller
        .clear_field_error(fields.handle())
        .expect("clear handle error");
    let errors = controller.errors().expect("errors");
    assert_eq!(
        errors.first(),
        Some((fields.email().key(), &TestError("email")))
    );
    assert_eq!(controller.get(fields.handle()).expect("handle"), "");

    controller.clear_errors().expect("clear errors");
    assert!(controller.errors().expect("errors").first().is_none());
    assert!(controller.snapshot().expect("snapshot").is_valid);
}

#[test]
fn dispose_is_observable() {
    let controller = signup_controller();
    assert!(!controller.is_disposed().expect("disposed flag"));
    controller.dispose().expect("dispose");
    assert!(controller.is_disposed().expect("disposed flag"));
    assert_eq!(controller.clear_errors(), Err(FormError::Disposed));
}
