use clap::Parser;
use event_scout::adapters::export;
use event_scout::config::{CalendarAction, Cli, Command, SearchArgs};
use event_scout::utils::error::ErrorSeverity;
use event_scout::utils::{logger, validation::Validate};
use event_scout::{
    AnnotatedEvent, AppConfig, ClashStatus, EventSearchEngine, JsonCalendarStore, Result,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI arguments: {:?}", cli);

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ event-scout failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load_or_default(&cli.config)?;
    config.validate()?;

    match cli.command {
        Command::Search(args) => search(&config, &args).await,
        Command::Calendar { action } => calendar(&config, action).await,
    }
}

async fn search(config: &AppConfig, args: &SearchArgs) -> Result<()> {
    args.validate()?;
    let engine = EventSearchEngine::from_config(config)?;
    let request = args.to_request();

    let results = if args.check_calendar {
        let store = JsonCalendarStore::new(&config.calendar.path);
        engine.search_against_store(&request, &store).await?
    } else {
        engine
            .search(&request)
            .await?
            .into_iter()
            .map(|event| AnnotatedEvent {
                event,
                clash: ClashStatus::Clear,
            })
            .collect()
    };

    if results.is_empty() {
        println!("No events found");
    }
    for annotated in &results {
        print_event(annotated);
    }

    if let Some(path) = &args.csv {
        export::write_csv(path, &results)?;
        println!("📁 Results saved to: {}", path.display());
    }
    Ok(())
}

fn print_event(annotated: &AnnotatedEvent) {
    let event = &annotated.event;
    let genre = match (event.genre.is_empty(), event.subgenre.is_empty()) {
        (false, false) => format!("{}/{}", event.genre, event.subgenre),
        (false, true) => event.genre.clone(),
        (true, _) => event.subgenre.clone(),
    };
    println!(
        "{}  {}  ({})  [{}]  {}",
        event.date, event.name, event.city, genre, event.ticket_url
    );
    if let ClashStatus::Clashing { calendar_event } = &annotated.clash {
        println!("    ⚠️  clashes with '{}' in your calendar", calendar_event);
    }
}

async fn calendar(config: &AppConfig, action: CalendarAction) -> Result<()> {
    let store = JsonCalendarStore::new(&config.calendar.path);

    match action {
        CalendarAction::Add { events } => {
            let added = store.add_events(&events).await?;
            for event in &added {
                println!("✅ Added {} on {}", event.event_name, event.date);
            }
            if added.is_empty() {
                println!("Nothing added");
            }
        }
        CalendarAction::Delete { name } => {
            let removed = store.delete_event(&name).await?;
            println!("🗑️ Removed {} entries named '{}'", removed, name);
        }
        CalendarAction::Upcoming => {
            let today = chrono::Local::now().date_naive();
            let upcoming = store.upcoming(today).await?;
            if upcoming.is_empty() {
                println!("No upcoming events in your calendar");
            }
            for event in upcoming {
                println!("{}  {}", event.date, event.event_name);
            }
        }
    }
    Ok(())
}
