// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use staffbook_app::debounce::FILTER_DEBOUNCE;
use staffbook_app::lifecycle::{RecordLoader, RecordState};
use staffbook_app::{
    Employee, EmployeeForm, EmployeeId, FilterKey, KeyValueStore, LayoutMetrics, Notification,
    Notifier, OverviewCommand, OverviewState, QualificationCatalog, QualificationChoice,
    QualificationId, QualificationManager, Repository, SortKey, SubmitOutcome, Tone,
};
use std::fmt::Write as _;
use std::rc::Rc;
use std::time::Instant;

/// Page-size inputs from config, before any per-command override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiSettings {
    pub mobile: bool,
    pub rows: Option<usize>,
    pub window: Option<usize>,
}

/// Changes `list` applies on top of the restored overview state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListArgs {
    pub filters: Vec<(FilterKey, String)>,
    pub sort: Option<SortChoice>,
    pub descending: bool,
    pub page: Option<usize>,
    pub rows: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortChoice {
    Unsorted,
    By(SortKey),
}

/// Prints toasts to stdout.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        tracing::debug!(title = %notification.title, "notification");
        println!("{}", format_notification(&notification));
    }
}

pub fn format_notification(notification: &Notification) -> String {
    let mark = match notification.tone {
        Tone::Success => "ok",
        Tone::Error => "error",
    };
    match &notification.message {
        Some(message) => format!("[{mark}] {}: {message}", notification.title),
        None => format!("[{mark}] {}", notification.title),
    }
}

pub struct Runtime<'a> {
    repo: &'a dyn Repository,
    store: Rc<dyn KeyValueStore>,
    notifier: &'a dyn Notifier,
    ui: UiSettings,
}

impl<'a> Runtime<'a> {
    pub fn new(
        repo: &'a dyn Repository,
        store: Rc<dyn KeyValueStore>,
        notifier: &'a dyn Notifier,
        ui: UiSettings,
    ) -> Self {
        Self {
            repo,
            store,
            notifier,
            ui,
        }
    }

    fn overview(&self, rows: Option<usize>) -> Result<OverviewState> {
        let mut state = OverviewState::restore(self.store.clone());
        let now = Instant::now();
        state.dispatch(OverviewCommand::SetMobileLayout(self.ui.mobile), now);
        if let Some(lines) = self.ui.window {
            state.dispatch(OverviewCommand::Layout(terminal_layout(lines)), now);
        }
        if let Some(rows) = rows.or(self.ui.rows) {
            state.dispatch(OverviewCommand::SetItemsPerPage(rows), now);
        }

        state.refresh(self.repo);
        if let Some(error) = state.view().error {
            bail!("{error}");
        }
        Ok(state)
    }

    pub fn list(&self, args: &ListArgs) -> Result<String> {
        let mut state = self.overview(args.rows)?;
        let mut now = Instant::now();

        for (key, value) in &args.filters {
            state.dispatch(OverviewCommand::SetFilter(*key, value.clone()), now);
        }
        if !args.filters.is_empty() {
            now += FILTER_DEBOUNCE;
            state.dispatch(OverviewCommand::Tick, now);
        }

        match args.sort {
            Some(SortChoice::Unsorted) => {
                state.dispatch(OverviewCommand::SetSort(None), now);
            }
            Some(SortChoice::By(key)) => {
                state.dispatch(OverviewCommand::SetSort(Some(key)), now);
            }
            None => {}
        }
        if args.descending {
            let Some(key) = state.sort_key() else {
                bail!("--desc needs a sort column; add --sort vorname|nachname|standort");
            };
            if state.sort_direction() == staffbook_app::SortDirection::Asc {
                state.dispatch(OverviewCommand::Sort(key), now);
            }
        }

        if let Some(page) = args.page {
            state.dispatch(OverviewCommand::GoToPage(page), now);
        }

        let rendered = render_overview(&state);
        state.teardown();
        Ok(rendered)
    }

    pub fn show(&self, id: &EmployeeId) -> Result<String> {
        let mut loader = RecordLoader::new(id.clone());
        match loader.load(self.repo) {
            RecordState::Loaded(employee) => Ok(render_employee(employee)),
            RecordState::Missing => {
                bail!("employee {id} not found -- run `staffbook list` to see ids")
            }
            RecordState::Failed(message) => bail!("{message}"),
            RecordState::Idle | RecordState::Loading => {
                bail!("employee {id} did not finish loading")
            }
        }
    }

    pub fn delete(&self, id: &EmployeeId) -> Result<()> {
        let mut state = self.overview(None)?;
        if state.request_delete(id).is_empty() {
            bail!("employee {id} not found -- run `staffbook list` to see ids");
        }
        state.confirm_delete(self.repo, self.notifier);
        let failed = state.pending_delete().is_some();
        state.teardown();
        if failed {
            bail!("employee {id} was not deleted");
        }
        Ok(())
    }

    pub fn skills(&self, search: Option<&str>) -> Result<String> {
        let mut manager = QualificationManager::new(QualificationCatalog::load(self.repo)?);
        if let Some(query) = search {
            let now = Instant::now();
            manager.set_search(query, now);
            manager.tick(now + FILTER_DEBOUNCE);
        }

        let visible = manager.visible();
        if visible.is_empty() {
            return Ok("no qualifications found\n".to_owned());
        }
        let mut out = String::new();
        for qualification in visible {
            let _ = writeln!(out, "{:>5}  {}", qualification.id, qualification.skill);
        }
        Ok(out)
    }

    pub fn skill_add(&self, label: &str) -> Result<()> {
        let mut manager = QualificationManager::new(QualificationCatalog::load(self.repo)?);
        manager.open_add();
        manager.set_dialog_input(label);
        manager.save(self.repo, &[])?;
        self.notifier
            .notify(Notification::success("qualification saved").with_message(label.trim()));
        Ok(())
    }

    pub fn skill_rename(&self, id: QualificationId, label: &str) -> Result<()> {
        let mut manager = QualificationManager::new(QualificationCatalog::load(self.repo)?);
        let existing = manager
            .catalog()
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("qualification {id} not found -- run `staffbook skills`"))?;
        manager.open_edit(existing);
        manager.set_dialog_input(label);
        manager.save(self.repo, &[])?;
        self.notifier
            .notify(Notification::success("qualification saved").with_message(label.trim()));
        Ok(())
    }

    /// Returns the ids whose detach failed; the qualification is gone
    /// either way.
    pub fn skill_delete(&self, id: QualificationId) -> Result<Vec<EmployeeId>> {
        let mut catalog = QualificationCatalog::load(self.repo)?;
        if catalog.get(id).is_none() {
            bail!("qualification {id} not found -- run `staffbook skills`");
        }
        let employees = self.repo.list_employees()?;
        let report = catalog.delete_cascade(self.repo, id, &employees)?;
        if report.is_clean() {
            self.notifier.notify(Notification::success("qualification deleted"));
        } else {
            self.notifier.notify(Notification::error(
                "qualification deleted",
                format!("could not remove it from {} employee(s)", report.failed.len()),
            ));
        }
        Ok(report.failed.into_iter().map(|(id, _)| id).collect())
    }

    pub fn assign(&self, id: &EmployeeId, label: &str) -> Result<Employee> {
        let employee = self
            .repo
            .get_employee(id)?
            .ok_or_else(|| anyhow!("employee {id} not found -- run `staffbook list` to see ids"))?;
        let mut catalog = QualificationCatalog::load(self.repo)?;
        let mut form = EmployeeForm::for_employee(&employee);

        form.choose(QualificationChoice::CreateNew);
        form.set_new_qualification(label);
        if !form.add_qualification(&mut catalog, self.repo, self.notifier)
            && let Some(error) = form.qualification_error()
        {
            bail!("{error}");
        }
        if !form.is_dirty() {
            return Ok(employee);
        }

        match form.submit(|data| self.repo.update_employee(id, data)) {
            SubmitOutcome::Submitted(result) => Ok(result?),
            SubmitOutcome::Blocked => {
                let fields: Vec<String> = form
                    .errors()
                    .iter()
                    .map(|(field, message)| format!("{}: {message}", field.label()))
                    .collect();
                bail!(
                    "employee {id} has invalid fields ({}) -- fix the record before assigning",
                    fields.join("; ")
                )
            }
            SubmitOutcome::Busy => bail!("employee {id} is still being saved"),
        }
    }
}

fn terminal_layout(lines: usize) -> LayoutMetrics {
    LayoutMetrics {
        results_height: lines as f64,
        header_height: 1.0,
        first_row_height: Some(1.0),
    }
}

pub fn render_overview(state: &OverviewState) -> String {
    let view = state.view();
    let mut out = String::new();

    if !view.chips.is_empty() {
        let chips: Vec<String> = view
            .chips
            .iter()
            .map(|chip| format!("{}={}", chip.label, chip.value))
            .collect();
        let _ = writeln!(out, "filters: {}", chips.join(", "));
    }

    if let Some(message) = view.empty_message {
        let _ = writeln!(out, "{message}");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<6} {:<16} {:<18} {:<14} {}",
        "id",
        format!("{}{}", SortKey::FirstName.label(), state.sort_indicator(SortKey::FirstName)),
        format!("{}{}", SortKey::LastName.label(), state.sort_indicator(SortKey::LastName)),
        format!("{}{}", SortKey::City.label(), state.sort_indicator(SortKey::City)),
        "qualifications",
    );
    for employee in &view.rows {
        let _ = writeln!(
            out,
            "{:<6} {:<16} {:<18} {:<14} {}",
            employee.id,
            employee.first_name,
            employee.last_name,
            employee.city,
            employee.qualifications.join(", "),
        );
    }

    let pages: Vec<String> = view
        .visible_pages
        .iter()
        .map(|page| {
            if *page == view.current_page {
                format!("[{page}]")
            } else {
                page.to_string()
            }
        })
        .collect();
    let _ = writeln!(
        out,
        "page {}/{}  {}  ({} employees, {} per page)",
        view.current_page,
        view.total_pages,
        pages.join(" "),
        view.total_employees,
        view.items_per_page,
    );
    out
}

pub fn render_employee(employee: &Employee) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", employee.full_name(), employee.id);
    let _ = writeln!(out, "  phone:   {}", employee.phone);
    let _ = writeln!(
        out,
        "  address: {}, {} {}",
        employee.street, employee.postcode, employee.city
    );
    if employee.qualifications.is_empty() {
        let _ = writeln!(out, "  qualifications: none");
    } else {
        let _ = writeln!(
            out,
            "  qualifications: {}",
            employee.qualifications.join(", ")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{ListArgs, Runtime, SortChoice, UiSettings, format_notification};
    use anyhow::Result;
    use staffbook_app::{
        EmployeeId, FilterKey, KeyValueStore, MemoryStore, Notification, QualificationId,
        RepoError, SortKey, Tone,
    };
    use staffbook_testkit::{FakeRepository, RecordingNotifier, RepoCall, StaffFaker, employee};
    use std::rc::Rc;

    fn staff() -> Vec<staffbook_app::Employee> {
        let mut faker = StaffFaker::new(11);
        let mut people = Vec::new();
        for (index, (first, last, city)) in [
            ("Anna", "Becker", "Berlin"),
            ("Jonas", "Adler", "Hamburg"),
            ("Lena", "Wolf", "Berlin"),
            ("Paul", "Zimmermann", "Köln"),
        ]
        .into_iter()
        .enumerate()
        {
            let mut data = faker.form_data();
            data.first_name = first.to_owned();
            data.last_name = last.to_owned();
            data.city = city.to_owned();
            data.qualifications = vec!["SQL".to_owned()];
            people.push(staffbook_testkit::employee_from_form(
                EmployeeId::from(index as i64 + 1),
                data,
            ));
        }
        people
    }

    #[test]
    fn list_applies_filters_and_sort_then_persists() -> Result<()> {
        let repo = FakeRepository::with_data(staff(), &["SQL"]);
        let notifier = RecordingNotifier::new();
        let store: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
        let runtime = Runtime::new(&repo, store.clone(), &notifier, UiSettings::default());

        let out = runtime.list(&ListArgs {
            filters: vec![(FilterKey::City, "berlin".to_owned())],
            sort: Some(SortChoice::By(SortKey::LastName)),
            descending: true,
            ..ListArgs::default()
        })?;
        let becker = out.find("Becker").expect("Becker listed");
        let wolf = out.find("Wolf").expect("Wolf listed");
        assert!(wolf < becker, "descending by last name:\n{out}");
        assert!(!out.contains("Adler"));
        assert!(out.contains("filters: city=berlin"), "{out}");
        assert!(out.contains("page 1/1"));

        let again = runtime.list(&ListArgs::default())?;
        assert!(!again.contains("Adler"), "filter restored:\n{again}");
        Ok(())
    }

    #[test]
    fn list_honors_rows_and_page() -> Result<()> {
        let repo = FakeRepository::with_data(staff(), &[]);
        let notifier = RecordingNotifier::new();
        let runtime = Runtime::new(
            &repo,
            Rc::new(MemoryStore::new()),
            &notifier,
            UiSettings::default(),
        );

        let out = runtime.list(&ListArgs {
            sort: Some(SortChoice::By(SortKey::FirstName)),
            page: Some(9),
            rows: Some(3),
            ..ListArgs::default()
        })?;
        assert!(out.contains("page 2/2  1 [2]"), "{out}");
        assert!(out.contains("Zimmermann"));
        assert!(out.contains("3 per page"));
        Ok(())
    }

    #[test]
    fn window_setting_sizes_the_page() -> Result<()> {
        let repo = FakeRepository::with_data(staff(), &[]);
        let notifier = RecordingNotifier::new();
        let ui = UiSettings {
            window: Some(3),
            ..UiSettings::default()
        };
        let runtime = Runtime::new(&repo, Rc::new(MemoryStore::new()), &notifier, ui);
        let out = runtime.list(&ListArgs::default())?;
        assert!(out.contains("2 per page"), "{out}");
        Ok(())
    }

    #[test]
    fn desc_without_sort_column_is_rejected() {
        let repo = FakeRepository::with_data(staff(), &[]);
        let notifier = RecordingNotifier::new();
        let runtime = Runtime::new(
            &repo,
            Rc::new(MemoryStore::new()),
            &notifier,
            UiSettings::default(),
        );
        let error = runtime
            .list(&ListArgs {
                descending: true,
                ..ListArgs::default()
            })
            .expect_err("desc needs a column");
        assert!(error.to_string().contains("--sort"));
    }

    #[test]
    fn empty_roster_prints_the_empty_message() -> Result<()> {
        let repo = FakeRepository::new();
        let notifier = RecordingNotifier::new();
        let runtime = Runtime::new(
            &repo,
            Rc::new(MemoryStore::new()),
            &notifier,
            UiSettings::default(),
        );
        assert_eq!(runtime.list(&ListArgs::default())?, "no employees found\n");
        Ok(())
    }

    #[test]
    fn delete_reports_missing_employee() -> Result<()> {
        let repo = FakeRepository::with_data(staff(), &[]);
        let notifier = RecordingNotifier::new();
        let runtime = Runtime::new(
            &repo,
            Rc::new(MemoryStore::new()),
            &notifier,
            UiSettings::default(),
        );
        assert!(runtime.delete(&EmployeeId::new("99")).is_err());

        runtime.delete(&EmployeeId::new("2"))?;
        assert_eq!(repo.employees().len(), 3);
        assert_eq!(
            notifier.last().map(|n| n.title),
            Some("employee deleted".to_owned())
        );
        Ok(())
    }

    #[test]
    fn assign_creates_and_attaches_a_new_qualification() -> Result<()> {
        let repo = FakeRepository::with_data(staff(), &["SQL"]);
        let notifier = RecordingNotifier::new();
        let runtime = Runtime::new(
            &repo,
            Rc::new(MemoryStore::new()),
            &notifier,
            UiSettings::default(),
        );

        let updated = runtime.assign(&EmployeeId::new("1"), " Rust ")?;
        assert_eq!(updated.qualifications, vec!["SQL", "Rust"]);
        assert!(
            repo.calls()
                .contains(&RepoCall::UpdateEmployee(EmployeeId::new("1")))
        );

        let error = runtime
            .assign(&EmployeeId::new("1"), "sql")
            .expect_err("already assigned");
        assert!(error.to_string().contains("already assigned"));
        Ok(())
    }

    #[test]
    fn skill_delete_detaches_then_deletes() -> Result<()> {
        let repo = FakeRepository::with_data(staff(), &["SQL"]);
        let notifier = RecordingNotifier::new();
        let runtime = Runtime::new(
            &repo,
            Rc::new(MemoryStore::new()),
            &notifier,
            UiSettings::default(),
        );

        let failed = runtime.skill_delete(QualificationId::new(1))?;
        assert!(failed.is_empty());
        assert_eq!(
            repo.count(|call| matches!(call, RepoCall::DetachQualification(..))),
            4
        );
        assert!(repo.qualifications().is_empty());
        assert!(runtime.skill_delete(QualificationId::new(1)).is_err());
        Ok(())
    }

    #[test]
    fn skill_delete_reports_partial_detach_failure() -> Result<()> {
        let repo = FakeRepository::with_data(staff(), &["SQL"]);
        repo.fail_detach_for(
            &EmployeeId::new("2"),
            RepoError::Transport("connection reset".to_owned()),
        );
        let notifier = RecordingNotifier::new();
        let runtime = Runtime::new(
            &repo,
            Rc::new(MemoryStore::new()),
            &notifier,
            UiSettings::default(),
        );

        let failed = runtime.skill_delete(QualificationId::new(1))?;
        assert_eq!(failed, vec![EmployeeId::new("2")]);
        assert!(repo.qualifications().is_empty());

        let last = notifier.last().expect("notification sent");
        assert_eq!(last.tone, Tone::Error);
        assert_eq!(
            last.message.as_deref(),
            Some("could not remove it from 1 employee(s)")
        );
        Ok(())
    }

    #[test]
    fn skills_filters_by_search() -> Result<()> {
        let repo = FakeRepository::with_data(Vec::new(), &["Java", "JavaScript", "SQL"]);
        let notifier = RecordingNotifier::new();
        let runtime = Runtime::new(
            &repo,
            Rc::new(MemoryStore::new()),
            &notifier,
            UiSettings::default(),
        );

        let out = runtime.skills(Some("JAVA"))?;
        assert!(out.contains("JavaScript"));
        assert!(!out.contains("SQL"));

        runtime.skill_add("  Rust ")?;
        assert!(runtime.skills(None)?.contains("Rust"));
        runtime.skill_rename(QualificationId::new(3), "PostgreSQL")?;
        assert!(runtime.skills(Some("postgres"))?.contains("PostgreSQL"));
        Ok(())
    }

    #[test]
    fn show_renders_the_record() -> Result<()> {
        let repo = FakeRepository::with_data(vec![employee("7", "Mia", "Koch", "Bremen")], &[]);
        let notifier = RecordingNotifier::new();
        let runtime = Runtime::new(
            &repo,
            Rc::new(MemoryStore::new()),
            &notifier,
            UiSettings::default(),
        );
        let out = runtime.show(&EmployeeId::new("7"))?;
        assert!(out.starts_with("Mia Koch (7)"));
        assert!(out.contains("qualifications: none"));
        assert!(runtime.show(&EmployeeId::new("8")).is_err());
        Ok(())
    }

    #[test]
    fn notifications_format_with_tone() {
        assert_eq!(
            format_notification(&Notification::success("employee deleted")),
            "[ok] employee deleted"
        );
        assert_eq!(
            format_notification(&Notification::error("delete failed", "record not found")),
            "[error] delete failed: record not found"
        );
    }
}
