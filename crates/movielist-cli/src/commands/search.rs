use crate::output::Output;
use crate::render;
use crate::session::Session;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use movielist_api::{SearchKind, SearchOptions};
use movielist_models::ListId;
use serde_json::json;

pub struct SearchArgs {
    pub query: String,
    pub kind: SearchKind,
    pub page: Option<u32>,
    pub year: Option<i32>,
    pub exact: bool,
    /// 1-based result index and target list
    pub add: Option<(usize, ListId)>,
}

pub async fn run_search(args: SearchArgs, output: &Output) -> Result<()> {
    let mut session = Session::open().await?;
    let options = SearchOptions {
        page: args.page,
        year: args.year,
        exact_match: args.exact,
    };

    let response = session.client.search(&args.query, args.kind, &options).await;
    session.save_tokens().await?;
    let response = response.wrap_err("Search failed")?;

    let Some((index, list)) = args.add else {
        if response.items.is_empty() {
            output.info(format!("No results for \"{}\"", args.query));
            return Ok(());
        }
        let table = render::search_table(&response.items);
        output.table(
            &table,
            &json!({
                "query": args.query,
                "totalPages": response.total_pages,
                "items": response.items,
            }),
        );
        return Ok(());
    };

    let result = index
        .checked_sub(1)
        .and_then(|i| response.items.get(i))
        .ok_or_else(|| eyre!("No result #{} (got {})", index, response.items.len()))?;

    let mutations = session.own_records(output).await?;
    let outcome = mutations.add_from_search(result, list).await;
    super::mutate::finish(&mut session, outcome).await
}
