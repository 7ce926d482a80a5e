// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use runtime::{ConsoleNotifier, ListArgs, Runtime, SortChoice, UiSettings};
use staffbook_app::{EmployeeId, FilterKey, KeyValueStore, MemoryStore, QualificationId, SortKey};
use staffbook_db::Store;
use std::env;
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "STAFFBOOK_LOG";

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `staffbook --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    init_logging(config.log_level())?;

    let auth = config.auth_state();
    if !auth.is_authenticated {
        bail!(
            "no API token found; export {}=<bearer token> and retry",
            config.token_env()
        );
    }
    let client = staffbook_api::Client::new(config.api_base_url(), config.api_timeout()?, auth)
        .with_context(|| {
            format!(
                "invalid [api] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        })?;

    let store: Rc<dyn KeyValueStore> = if options.ephemeral {
        Rc::new(MemoryStore::new())
    } else {
        let db_path = config.db_path()?;
        let store = Store::open(&db_path).with_context(|| {
            format!(
                "open database {} -- if this path is wrong, set [storage].db_path or {}",
                db_path.display(),
                staffbook_db::DB_PATH_ENV
            )
        })?;
        store.bootstrap()?;
        Rc::new(store)
    };

    let ui = UiSettings {
        mobile: config.mobile(),
        rows: config.rows(),
        window: config.window(),
    };
    let notifier = ConsoleNotifier;
    let runtime = Runtime::new(&client, store, &notifier, ui);
    execute(&runtime, options.command)
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid [log] level {level:?}; use e.g. warn or debug"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

fn execute(runtime: &Runtime<'_>, command: Command) -> Result<()> {
    match command {
        Command::List(args) => print!("{}", runtime.list(&args)?),
        Command::Show(id) => print!("{}", runtime.show(&id)?),
        Command::Delete(id) => runtime.delete(&id)?,
        Command::Skills { search } => print!("{}", runtime.skills(search.as_deref())?),
        Command::SkillAdd(label) => runtime.skill_add(&label)?,
        Command::SkillRename(id, label) => runtime.skill_rename(id, &label)?,
        Command::SkillDelete(id) => {
            let failed = runtime.skill_delete(id)?;
            if !failed.is_empty() {
                let ids: Vec<String> = failed.iter().map(ToString::to_string).collect();
                eprintln!(
                    "could not detach from employees {}; check them with `staffbook show`",
                    ids.join(", ")
                );
            }
        }
        Command::Assign(id, label) => {
            let employee = runtime.assign(&id, &label)?;
            print!("{}", runtime::render_employee(&employee));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    List(ListArgs),
    Show(EmployeeId),
    Delete(EmployeeId),
    Skills { search: Option<String> },
    SkillAdd(String),
    SkillRename(QualificationId, String),
    SkillDelete(QualificationId),
    Assign(EmployeeId, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    ephemeral: bool,
    show_help: bool,
    command: Command,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        ephemeral: false,
        show_help: false,
        command: Command::List(ListArgs::default()),
    };

    let mut positional: Vec<String> = Vec::new();
    let mut list = ListArgs::default();
    let mut search = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let mut value_for = |flag: &str| -> Result<String> {
            iter.next()
                .map(|value| value.as_ref().to_owned())
                .ok_or_else(|| anyhow!("{flag} requires a value"))
        };
        match arg.as_ref() {
            "--config" => {
                let value = value_for("--config")
                    .map_err(|_| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value);
            }
            "--print-config-path" => options.print_config_path = true,
            "--print-example-config" => options.print_example = true,
            "--ephemeral" => options.ephemeral = true,
            "--help" | "-h" => options.show_help = true,
            "--first" => list
                .filters
                .push((FilterKey::FirstName, value_for("--first")?)),
            "--last" => list
                .filters
                .push((FilterKey::LastName, value_for("--last")?)),
            "--city" => list.filters.push((FilterKey::City, value_for("--city")?)),
            "--skill" => list
                .filters
                .push((FilterKey::Qualification, value_for("--skill")?)),
            "--sort" => list.sort = Some(parse_sort(&value_for("--sort")?)?),
            "--desc" => list.descending = true,
            "--page" => list.page = Some(parse_positive("--page", &value_for("--page")?)?),
            "--rows" => list.rows = Some(parse_positive("--rows", &value_for("--rows")?)?),
            "--search" => search = Some(value_for("--search")?),
            flag if flag.starts_with("--") => {
                bail!("unknown argument {flag:?}; run with --help to see supported options");
            }
            value => positional.push(value.to_owned()),
        }
    }

    let mut words = positional.into_iter();
    let name = words.next();
    let rest: Vec<String> = words.collect();
    options.command = match (name.as_deref(), rest.as_slice()) {
        (None, _) | (Some("list"), []) => Command::List(list),
        (Some("show"), [id]) => Command::Show(EmployeeId::new(id.as_str())),
        (Some("delete"), [id]) => Command::Delete(EmployeeId::new(id.as_str())),
        (Some("skills"), []) => Command::Skills { search },
        (Some("skill-add"), [label]) => Command::SkillAdd(label.clone()),
        (Some("skill-rename"), [id, label]) => {
            Command::SkillRename(parse_qualification_id(id)?, label.clone())
        }
        (Some("skill-delete"), [id]) => Command::SkillDelete(parse_qualification_id(id)?),
        (Some("assign"), [id, label]) => {
            Command::Assign(EmployeeId::new(id.as_str()), label.clone())
        }
        (Some(name), _) => {
            bail!("unknown command or wrong arguments for {name:?}; run with --help for usage")
        }
    };

    Ok(options)
}

fn parse_sort(raw: &str) -> Result<SortChoice> {
    if raw == "none" {
        return Ok(SortChoice::Unsorted);
    }
    SortKey::parse(raw).map(SortChoice::By).ok_or_else(|| {
        anyhow!("unknown sort column {raw:?}; use vorname, nachname, standort, or none")
    })
}

fn parse_positive(flag: &str, raw: &str) -> Result<usize> {
    match raw.parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => bail!("{flag} expects a positive number, got {raw:?}"),
    }
}

fn parse_qualification_id(raw: &str) -> Result<QualificationId> {
    raw.parse::<i64>()
        .map(QualificationId::new)
        .with_context(|| format!("qualification id {raw:?} is not a number"))
}

fn print_help() {
    println!("staffbook - personnel records from the command line");
    println!();
    println!("Commands:");
    println!("  list [--first X] [--last X] [--city X] [--skill X]");
    println!("       [--sort vorname|nachname|standort|none] [--desc] [--page N] [--rows N]");
    println!("  show <employee-id>");
    println!("  delete <employee-id>");
    println!("  skills [--search Q]");
    println!("  skill-add <label>");
    println!("  skill-rename <id> <label>");
    println!("  skill-delete <id>           Detaches from every employee first");
    println!("  assign <employee-id> <label> Creates the qualification if needed");
    println!();
    println!("Options:");
    println!("  --config <path>          Use a specific config path");
    println!("  --ephemeral              Keep view state in memory only");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --help                   Show this help");
}
