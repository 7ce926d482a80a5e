// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use staffbook_app::debounce::FILTER_DEBOUNCE;
use staffbook_app::lifecycle::{RecordLoader, RecordState};
use staffbook_app::{
    EmployeeForm, EmployeeId, ErrorCategory, FilterKey, MemoryStore, OverviewCommand,
    OverviewEvent, OverviewState, QualificationCatalog, QualificationChoice, QualificationId,
    QualificationManager, RepoError, SortKey, Tone,
};
use staffbook_testkit::{
    FakeRepository, Operation, RecordingNotifier, RepoCall, StaffFaker, employee,
};
use std::rc::Rc;
use std::time::Instant;

fn roster() -> Vec<staffbook_app::Employee> {
    let cities = [
        "Berlin", "Hamburg", "Köln", "Berlin", "München", "Hamburg", "Berlin", "Köln", "Leipzig",
        "Dresden", "Bremen", "Hamburg",
    ];
    let last_names = [
        "Weber", "Koch", "Wolf", "Adler", "Braun", "Klein", "Meyer", "Schulz", "Fischer", "Lang",
        "Roth", "Vogel",
    ];
    cities
        .iter()
        .zip(last_names)
        .enumerate()
        .map(|(index, (city, last))| employee(&(index + 1).to_string(), "Max", last, city))
        .collect()
}

#[test]
fn filtered_sorted_overview_pages_through_results() {
    let repo = FakeRepository::with_data(roster(), &[]);
    let mut state = OverviewState::restore(Rc::new(MemoryStore::new()));
    state.refresh(&repo);
    assert_eq!(state.total_pages(), 2);

    let start = Instant::now();
    state.dispatch(OverviewCommand::SetItemsPerPage(2), start);
    state.dispatch(OverviewCommand::Sort(SortKey::LastName), start);
    state.dispatch(
        OverviewCommand::SetFilter(FilterKey::City, "berlin".to_owned()),
        start,
    );
    assert_eq!(state.results().len(), 12, "filter still pending");

    let events = state.dispatch(OverviewCommand::Tick, start + FILTER_DEBOUNCE);
    assert!(events.contains(&OverviewEvent::FilterApplied(FilterKey::City)));

    let view = state.view();
    assert_eq!(view.total_employees, 3);
    assert_eq!(view.total_pages, 2);
    let names: Vec<_> = view.rows.iter().map(|e| e.last_name.as_str()).collect();
    assert_eq!(names, vec!["Adler", "Meyer"]);

    state.dispatch(OverviewCommand::NextPage, start + FILTER_DEBOUNCE);
    let view = state.view();
    assert_eq!(view.current_page, 2);
    let names: Vec<_> = view.rows.iter().map(|e| e.last_name.as_str()).collect();
    assert_eq!(names, vec!["Weber"]);
    assert!(!view.can_go_next);
}

#[test]
fn overview_state_is_restored_from_the_store() {
    let store = Rc::new(MemoryStore::new());
    let repo = FakeRepository::with_data(roster(), &[]);
    let start = Instant::now();
    {
        let mut state = OverviewState::restore(store.clone());
        state.refresh(&repo);
        state.dispatch(OverviewCommand::Sort(SortKey::City), start);
        state.dispatch(OverviewCommand::Sort(SortKey::City), start);
        state.dispatch(
            OverviewCommand::SetFilter(FilterKey::FirstName, "max".to_owned()),
            start,
        );
        state.teardown();
    }

    let restored = OverviewState::restore(store);
    assert_eq!(restored.sort_key(), Some(SortKey::City));
    assert_eq!(restored.filters().first_name, "max");
    assert_eq!(restored.applied_filters().first_name, "max");
}

#[test]
fn confirmed_delete_notifies_and_reloads() {
    let repo = FakeRepository::with_data(roster(), &[]);
    let notifier = RecordingNotifier::new();
    let mut state = OverviewState::restore(Rc::new(MemoryStore::new()));
    state.refresh(&repo);

    let target = EmployeeId::new("4");
    let prompted = state.request_delete(&target);
    assert_eq!(
        prompted,
        vec![OverviewEvent::DeletePrompted {
            id: target.clone(),
            name: "Max Adler".to_owned(),
        }]
    );

    repo.clear_calls();
    let events = state.confirm_delete(&repo, &notifier);
    assert!(events.contains(&OverviewEvent::EmployeeDeleted(target.clone())));
    assert_eq!(
        repo.calls(),
        vec![RepoCall::DeleteEmployee(target), RepoCall::ListEmployees]
    );
    assert_eq!(state.employees().len(), 11);
    assert!(state.pending_delete().is_none());
    assert_eq!(
        notifier.last().map(|n| (n.tone, n.title)),
        Some((Tone::Success, "employee deleted".to_owned()))
    );
}

#[test]
fn failed_delete_keeps_the_confirmation_open() {
    let repo = FakeRepository::with_data(roster(), &[]);
    let notifier = RecordingNotifier::new();
    let mut state = OverviewState::restore(Rc::new(MemoryStore::new()));
    state.refresh(&repo);
    repo.fail(
        Operation::DeleteEmployee,
        RepoError::Remote {
            category: ErrorCategory::ServerUnavailable,
            message: "server unavailable -- try again later".to_owned(),
        },
    );

    state.request_delete(&EmployeeId::new("1"));
    assert!(state.confirm_delete(&repo, &notifier).is_empty());
    assert!(state.pending_delete().is_some());
    assert!(!state.is_deleting());
    let sent = notifier.last().expect("failure notification");
    assert_eq!(sent.tone, Tone::Error);
    assert_eq!(
        sent.message.as_deref(),
        Some("server unavailable -- try again later")
    );
}

#[test]
fn ensure_creates_once_then_reuses() {
    let repo = FakeRepository::with_data(Vec::new(), &["SQL"]);
    let mut catalog = QualificationCatalog::load(&repo).expect("catalog loads");

    let first = catalog.ensure(&repo, "  Java ").expect("first ensure");
    assert!(first.created);
    assert_eq!(first.qualification.skill, "Java");

    let second = catalog.ensure(&repo, "java").expect("second ensure");
    assert!(!second.created);
    assert_eq!(second.qualification.id, first.qualification.id);

    assert_eq!(
        repo.count(|call| matches!(call, RepoCall::CreateQualification(_))),
        1
    );
}

#[test]
fn ensure_falls_back_to_created_record_when_listing_lags() {
    let repo = FakeRepository::new();
    repo.hide_created_qualifications(true);
    let mut catalog = QualificationCatalog::new();

    let ensured = catalog.ensure(&repo, "Kotlin").expect("ensure succeeds");
    assert!(ensured.created);
    assert!(catalog.find("kotlin").is_some());
}

#[test]
fn cascade_detaches_every_holder_before_deleting() {
    let mut anna = employee("1", "Anna", "Becker", "Berlin");
    anna.qualifications = vec!["Java".to_owned()];
    let mut ben = employee("2", "Ben", "Wolf", "Köln");
    ben.qualifications = vec!["java".to_owned(), "SQL".to_owned()];
    let carl = employee("3", "Carl", "Roth", "Bremen");
    let people = vec![anna, ben, carl];

    let repo = FakeRepository::with_data(people.clone(), &["Java", "SQL"]);
    repo.fail_detach_for(
        &EmployeeId::new("1"),
        RepoError::Transport("connection reset".to_owned()),
    );
    let mut catalog = QualificationCatalog::load(&repo).expect("catalog loads");
    repo.clear_calls();

    let report = catalog
        .delete_cascade(&repo, QualificationId::new(1), &people)
        .expect("delete goes ahead");
    assert_eq!(report.detached, vec![EmployeeId::new("2")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, EmployeeId::new("1"));

    let calls = repo.calls();
    assert_eq!(
        &calls[..3],
        &[
            RepoCall::DetachQualification(EmployeeId::new("1"), QualificationId::new(1)),
            RepoCall::DetachQualification(EmployeeId::new("2"), QualificationId::new(1)),
            RepoCall::DeleteQualification(QualificationId::new(1)),
        ]
    );
    assert!(catalog.find("Java").is_none());
    assert_eq!(repo.employees()[1].qualifications, vec!["SQL"]);
}

#[test]
fn manager_delete_dialog_runs_the_cascade() {
    let mut anna = employee("1", "Anna", "Becker", "Berlin");
    anna.qualifications = vec!["Docker".to_owned()];
    let people = vec![anna];
    let repo = FakeRepository::with_data(people.clone(), &["Docker"]);
    let mut manager =
        QualificationManager::new(QualificationCatalog::load(&repo).expect("catalog loads"));

    let docker = manager.catalog().items()[0].clone();
    manager.open_delete(docker);
    manager.save(&repo, &people).expect("delete succeeds");

    assert!(manager.dialog().is_none());
    assert!(manager.catalog().is_empty());
    assert!(repo.employees()[0].qualifications.is_empty());
}

#[test]
fn manager_add_and_edit_update_the_catalog() {
    let repo = FakeRepository::with_data(Vec::new(), &["Java"]);
    let mut manager =
        QualificationManager::new(QualificationCatalog::load(&repo).expect("catalog loads"));

    manager.open_add();
    manager.set_dialog_input("  Kotlin ");
    manager.save(&repo, &[]).expect("create succeeds");
    assert!(manager.dialog().is_none());
    assert!(repo.calls().contains(&RepoCall::CreateQualification("Kotlin".to_owned())));
    let kotlin = manager
        .catalog()
        .find("kotlin")
        .cloned()
        .expect("created label in catalog");

    manager.open_edit(kotlin.clone());
    manager.set_dialog_input("Kotlin/JVM");
    manager.save(&repo, &[]).expect("rename succeeds");
    assert!(manager.catalog().find("Kotlin").is_none());
    assert_eq!(
        manager.catalog().get(kotlin.id).map(|item| item.skill.as_str()),
        Some("Kotlin/JVM")
    );
    assert_eq!(manager.catalog().len(), 2);
}

#[test]
fn form_creates_missing_qualification_and_notifies() {
    let repo = FakeRepository::with_data(Vec::new(), &["Java"]);
    let notifier = RecordingNotifier::new();
    let mut catalog = QualificationCatalog::load(&repo).expect("catalog loads");
    let mut data = StaffFaker::new(5).form_data();
    data.qualifications.clear();
    let mut form = EmployeeForm::new(data);
    form.choose(QualificationChoice::CreateNew);

    form.set_new_qualification("Terraform");
    assert!(form.add_qualification(&mut catalog, &repo, &notifier));
    let sent = notifier.last().expect("success notification");
    assert_eq!(sent.title, "qualification created and added");
    assert_eq!(sent.message.as_deref(), Some("Terraform"));

    form.choose(QualificationChoice::CreateNew);
    form.set_new_qualification("JAVA");
    assert!(form.add_qualification(&mut catalog, &repo, &notifier));
    let sent = notifier.last().expect("success notification");
    assert_eq!(sent.title, "existing qualification added");
    assert_eq!(sent.message.as_deref(), Some("Java"));
    assert_eq!(form.data().qualifications, vec!["Terraform", "Java"]);
    assert_eq!(
        repo.count(|call| matches!(call, RepoCall::CreateQualification(_))),
        1
    );
    assert!(form.is_dirty());
}

#[test]
fn form_reports_a_failed_create() {
    let repo = FakeRepository::new();
    repo.fail(
        Operation::CreateQualification,
        RepoError::Remote {
            category: ErrorCategory::Conflict,
            message: "this qualification already exists".to_owned(),
        },
    );
    let notifier = RecordingNotifier::new();
    let mut catalog = QualificationCatalog::new();
    let mut form = EmployeeForm::default();
    form.choose(QualificationChoice::CreateNew);
    form.set_new_qualification("Go");

    assert!(!form.add_qualification(&mut catalog, &repo, &notifier));
    assert!(form.data().qualifications.is_empty());
    assert!(!form.is_busy());
    let sent = notifier.last().expect("error notification");
    assert_eq!(sent.tone, Tone::Error);
    assert_eq!(sent.title, "qualification could not be created");
    assert_eq!(
        form.qualification_error(),
        Some("this qualification already exists")
    );
}

#[test]
fn record_loader_fetches_and_reports_missing() {
    let repo = FakeRepository::with_data(roster(), &[]);

    let mut loader = RecordLoader::new(EmployeeId::new("3"));
    loader.load(&repo);
    assert_eq!(
        loader.employee().map(|e| e.last_name.as_str()),
        Some("Wolf")
    );

    let mut missing = RecordLoader::new(EmployeeId::new("99"));
    assert_eq!(missing.load(&repo), &RecordState::Missing);
}
