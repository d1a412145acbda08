use crate::output::{Output, OutputNotifier};
use crate::render;
use crate::session::Session;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use movielist_core::{notification_for_error, ListContext, ListView, LoadOutcome, Notifier, RecordStore, ViewState};
use movielist_models::{ListId, SortType, ViewMode};
use owo_colors::OwoColorize;
use serde_json::json;
use tracing::warn;

pub struct ListArgs {
    pub list: ListId,
    pub user: Option<String>,
    pub page: usize,
    pub sort: Option<SortType>,
    pub mode: Option<ViewMode>,
    pub query: Option<String>,
    pub to_rewatch: Option<bool>,
    pub hide_unreleased: Option<bool>,
    pub recent_releases: Option<bool>,
}

fn apply_preferences(view: &mut ListView, args: &ListArgs) -> anyhow::Result<()> {
    if let Some(sort) = args.sort {
        view.set_sort(sort)?;
    }
    if let Some(mode) = args.mode {
        view.set_mode(mode)?;
    }
    if let Some(query) = &args.query {
        view.set_query(query.trim())?;
    }

    let mut filters = view.state().preferences().filters;
    if let Some(v) = args.to_rewatch {
        filters.to_rewatch = v;
    }
    if let Some(v) = args.hide_unreleased {
        filters.hide_unreleased = v;
    }
    if let Some(v) = args.recent_releases {
        filters.recent_releases = v;
    }
    view.set_filters(filters)
}

pub async fn run_list(args: ListArgs, output: &Output) -> Result<()> {
    let mut session = Session::open().await?;

    let context = match &args.user {
        Some(username) => ListContext::Profile(username.clone()),
        None => {
            session.require_login().await?;
            ListContext::Own
        }
    };

    let store = RecordStore::new(session.client.clone());
    let loaded = store.load(context.clone()).await;
    session.save_tokens().await?;
    match loaded {
        Ok(LoadOutcome::Superseded) => warn!("Records for {} were superseded", context),
        Ok(_) => {}
        Err(e) => {
            OutputNotifier::new(*output).notify(notification_for_error(&e, &format!("load {}", context)));
            return Err(eyre!("Failed to load {}", context));
        }
    }

    let mut view = ListView::new(
        args.list,
        ViewState::load(session.preferences()),
        session.config.view.items_per_page,
    );
    apply_preferences(&mut view, &args).map_err(|e| eyre!("Failed to save view preferences: {}", e))?;
    view.set_page(args.page);

    let snapshot = store.snapshot().await;
    let page = view.render(&snapshot);
    let preferences = view.state().preferences();

    if output.is_human() {
        let mut header = format!(
            "{} - {} (page {}/{}, {} records, sorted by {})",
            args.list.to_string().bold(),
            context,
            page.validated_page,
            page.total_pages,
            page.total_records,
            preferences.sort
        );
        if !preferences.query.is_empty() {
            header.push_str(&format!(", matching \"{}\"", preferences.query));
        }
        output.info(header);
        if page.records.is_empty() {
            output.info("No records");
            return Ok(());
        }
    }

    let table = render::records_table(&page.records, args.list, preferences.mode);
    output.table(
        &table,
        &json!({
            "list": args.list.name(),
            "context": context.to_string(),
            "page": page.validated_page,
            "totalPages": page.total_pages,
            "totalRecords": page.total_records,
            "preferences": preferences,
            "records": page.records,
        }),
    );
    Ok(())
}
